//! Implementations the fuzzer can submit cases to.

use super::protocol::{extract_digest, format_request, TestCase};
use super::session::ReplSession;
use super::{ConformanceError, ConformanceResult};
use crate::config::FuzzConfig;
use std::time::Duration;

/// The seam between the fuzzer and an implementation-under-test.
pub trait ImplementationRunner {
    /// Hash one case and return the digest as hex text.
    fn submit_case(&mut self, case: &TestCase) -> ConformanceResult<String>;

    /// Get the runner name for reporting.
    fn name(&self) -> &str;
}

/// In-process runner backed by the reference sponge.
pub struct ReferenceRunner;

impl ReferenceRunner {
    /// Create a new reference runner.
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReferenceRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ImplementationRunner for ReferenceRunner {
    fn submit_case(&mut self, case: &TestCase) -> ConformanceResult<String> {
        Ok(hex::encode(case.reference_digest()?))
    }

    fn name(&self) -> &str {
        "reference"
    }
}

/// Runner that talks to a long-lived external process.
///
/// The process is started once and reused for every case of a run.
pub struct SubprocessRunner {
    session: ReplSession,
    response_timeout: Duration,
}

impl SubprocessRunner {
    /// Spawn `config.command` and wait for its readiness marker.
    pub fn start(config: &FuzzConfig) -> ConformanceResult<Self> {
        let mut session = ReplSession::spawn(&config.command)?;
        let banner = session.expect(&config.ready_marker, config.ready_timeout())?;
        if !banner.trim().is_empty() {
            log::debug!("{} banner: {}", session.program(), banner.trim());
        }
        Ok(Self::from_session(session, config.response_timeout()))
    }

    /// Wrap a session that has already passed its readiness marker.
    pub fn from_session(session: ReplSession, response_timeout: Duration) -> Self {
        Self {
            session,
            response_timeout,
        }
    }
}

impl ImplementationRunner for SubprocessRunner {
    fn submit_case(&mut self, case: &TestCase) -> ConformanceResult<String> {
        self.session.send_line(&format_request(case))?;
        let response = self.session.read_response(self.response_timeout)?;
        extract_digest(&response).ok_or_else(|| {
            ConformanceError::protocol("response has no x\"<hex>\" digest literal", response.trim())
        })
    }

    fn name(&self) -> &str {
        self.session.program()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Variant;

    #[test]
    fn test_reference_runner_digest() {
        let mut runner = ReferenceRunner::new();
        let case = TestCase::new(Variant::Keccak256, Vec::new());
        assert_eq!(
            runner.submit_case(&case).unwrap(),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(runner.name(), "reference");
    }

    #[test]
    fn test_reference_runner_reports_xof_without_length() {
        let mut runner = ReferenceRunner::new();
        let case = TestCase::new(Variant::Shake256, vec![1, 2, 3]);
        assert!(matches!(
            runner.submit_case(&case),
            Err(ConformanceError::Reference(_))
        ));
    }

    #[cfg(unix)]
    fn shell_config(script: &str) -> FuzzConfig {
        FuzzConfig {
            command: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            ready_timeout_ms: 5_000,
            response_timeout_ms: 5_000,
            ..FuzzConfig::default()
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_subprocess_runner_parses_digest() {
        let config = shell_config(
            r#"printf 'melorun> '; while read line; do printf 'x"C5D2"\r\n\r\nmelorun> '; done"#,
        );
        let mut runner = SubprocessRunner::start(&config).unwrap();
        let case = TestCase::new(Variant::Keccak256, vec![7]);
        assert_eq!(runner.submit_case(&case).unwrap(), "c5d2");
        // The same process answers the next request too.
        assert_eq!(runner.submit_case(&case).unwrap(), "c5d2");
        assert_eq!(runner.name(), "sh");
    }

    #[cfg(unix)]
    #[test]
    fn test_subprocess_runner_missing_literal() {
        let config = shell_config(
            r#"printf 'melorun> '; while read line; do printf 'error: bad input\n\n'; done"#,
        );
        let mut runner = SubprocessRunner::start(&config).unwrap();
        let err = runner
            .submit_case(&TestCase::new(Variant::Sha3_224, vec![]))
            .unwrap_err();
        assert_eq!(err.raw_response(), Some("error: bad input"));
    }
}
