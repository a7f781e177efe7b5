//! Fuzz run configuration.
//!
//! Every field has a default, so a JSON config file only needs the keys it
//! changes. Command-line flags are applied on top of the file.

use crate::conformance::protocol::DEFAULT_READY_MARKER;
use crate::conformance::{ConformanceError, ConformanceResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Upper bound on `max_input_len`, in bytes (1 MiB).
pub const MAX_INPUT_LEN: usize = 1 << 20;

/// Settings for one differential fuzzing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FuzzConfig {
    /// Number of random cases to try.
    pub iterations: usize,
    /// Largest generated input, in bytes (inclusive).
    pub max_input_len: usize,
    /// RNG seed; a random one is drawn and logged when absent.
    pub seed: Option<u64>,
    /// Text the implementation prints once it accepts requests.
    pub ready_marker: String,
    /// How long to wait for the readiness marker.
    pub ready_timeout_ms: u64,
    /// How long to wait for each response block.
    pub response_timeout_ms: u64,
    /// Program and arguments of the implementation-under-test.
    pub command: Vec<String>,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            iterations: 256,
            max_input_len: 2048,
            seed: None,
            ready_marker: DEFAULT_READY_MARKER.to_string(),
            ready_timeout_ms: 10_000,
            response_timeout_ms: 10_000,
            command: Vec::new(),
        }
    }
}

impl FuzzConfig {
    /// Load a config from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConformanceResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConformanceError::Io(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ConformanceError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Readiness timeout as a `Duration`.
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    /// Per-response timeout as a `Duration`.
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Check the settings a run depends on.
    ///
    /// `needs_command` is false when the implementation is provided in-process.
    pub fn validate(&self, needs_command: bool) -> ConformanceResult<()> {
        if self.iterations == 0 {
            return Err(ConformanceError::Config(
                "iterations must be at least 1".to_string(),
            ));
        }
        if self.ready_timeout_ms == 0 || self.response_timeout_ms == 0 {
            return Err(ConformanceError::Config(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.max_input_len > MAX_INPUT_LEN {
            return Err(ConformanceError::Config(format!(
                "max input length {} exceeds {} bytes",
                self.max_input_len, MAX_INPUT_LEN
            )));
        }
        if self.ready_marker.is_empty() {
            return Err(ConformanceError::Config(
                "ready marker must not be empty".to_string(),
            ));
        }
        if needs_command && self.command.is_empty() {
            return Err(ConformanceError::Config(
                "no command given for the implementation-under-test".to_string(),
            ));
        }
        Ok(())
    }
}
