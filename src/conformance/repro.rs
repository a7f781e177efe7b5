//! Reproduction bundle for a digest discrepancy.

use super::protocol::{format_request, TestCase};
use super::{ConformanceError, ConformanceResult};
use crate::variant::Variant;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything needed to reproduce one discrepancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReproBundle {
    /// Zero-based iteration at which the run halted.
    pub iteration: usize,
    /// RNG seed of the run.
    pub seed: u64,
    /// Algorithm under test.
    pub variant: Variant,
    /// Output length for extendable-output variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_len: Option<usize>,
    /// Exact request line sent to the implementation.
    pub request: String,
    /// Input length in bytes.
    pub input_len: usize,
    /// Input bytes as lowercase hex.
    pub input_hex: String,
    /// Reference digest (hex).
    pub expected: String,
    /// Implementation digest (hex).
    pub actual: String,
}

impl ReproBundle {
    /// Create a new repro bundle.
    pub fn new(iteration: usize, seed: u64, case: &TestCase, expected: String, actual: String) -> Self {
        Self {
            iteration,
            seed,
            variant: case.variant,
            output_len: case.output_len,
            request: format_request(case),
            input_len: case.input.len(),
            input_hex: hex::encode(&case.input),
            expected,
            actual,
        }
    }

    /// Rebuild the test case from the bundle.
    pub fn test_case(&self) -> ConformanceResult<TestCase> {
        let input = hex::decode(&self.input_hex)
            .map_err(|e| ConformanceError::Config(format!("invalid input_hex: {}", e)))?;
        Ok(TestCase {
            variant: self.variant,
            input,
            output_len: self.output_len,
        })
    }

    /// Recompute the reference digest for the bundled input.
    pub fn replay(&self) -> ConformanceResult<String> {
        let case = self.test_case()?;
        Ok(hex::encode(case.reference_digest()?))
    }

    /// Index of the first differing hex digit, if the digests differ.
    pub fn first_diff(&self) -> Option<usize> {
        let expected = self.expected.as_bytes();
        let actual = self.actual.as_bytes();
        expected
            .iter()
            .zip(actual)
            .position(|(e, a)| !e.eq_ignore_ascii_case(a))
            .or_else(|| (expected.len() != actual.len()).then(|| expected.len().min(actual.len())))
    }

    /// Format as a human-readable report.
    pub fn to_report(&self) -> String {
        let first_diff = match self.first_diff() {
            Some(idx) => format!("hex digit {}", idx),
            None => "none".to_string(),
        };
        format!(
            r#"=== Discrepancy Report ===
Iteration: {}
Seed: {}
Variant: {} ({})
Expected (reference): {}
Actual (implementation): {}
First difference: {}
Input bytes: {}
Input data: {}

To reproduce:
  1. Send: {}
  2. Or rerun: keccak-oracle fuzz --seed {} --iterations {} -- <command>
"#,
            self.iteration,
            self.seed,
            self.variant,
            self.variant.function_name(),
            self.expected,
            self.actual,
            first_diff,
            self.input_len,
            self.input_hex,
            self.request,
            self.seed,
            self.iteration + 1,
        )
    }

    /// Format as JSON for machine parsing.
    pub fn to_json(&self) -> ConformanceResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConformanceError::Io(format!("could not serialise bundle: {}", e)))
    }

    /// Save the bundle as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ConformanceResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)
            .map_err(|e| ConformanceError::Io(format!("{}: {}", path.display(), e)))
    }

    /// Load a bundle saved with [`ReproBundle::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> ConformanceResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConformanceError::Io(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ConformanceError::Config(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> ReproBundle {
        let case = TestCase::new(Variant::Sha3_256, vec![0x00, 0xff]);
        let expected = hex::encode(case.reference_digest().unwrap());
        let mut actual = expected.clone();
        actual.replace_range(4..5, if &expected[4..5] == "0" { "1" } else { "0" });
        ReproBundle::new(3, 42, &case, expected, actual)
    }

    #[test]
    fn test_repro_bundle_report() {
        let report = bundle().to_report();
        assert!(report.contains("Iteration: 3"));
        assert!(report.contains("Seed: 42"));
        assert!(report.contains("SHA3-256 (sha3_256)"));
        assert!(report.contains("Input bytes: 2"));
        assert!(report.contains("Input data: 00ff"));
        assert!(report.contains("sha3_256([0, 255])"));
        assert!(report.contains("First difference: hex digit 4"));
    }

    #[test]
    fn test_repro_bundle_json() {
        let json = bundle().to_json().unwrap();
        assert!(json.contains("\"variant\": \"SHA3-256\""));
        assert!(json.contains("\"input_hex\": \"00ff\""));
        assert!(!json.contains("output_len"));
        let back: ReproBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bundle());
    }

    #[test]
    fn test_replay_matches_expected() {
        let b = bundle();
        assert_eq!(b.replay().unwrap(), b.expected);
    }

    #[test]
    fn test_first_diff_case_insensitive() {
        let mut b = bundle();
        b.actual = b.expected.to_ascii_uppercase();
        assert_eq!(b.first_diff(), None);
        b.actual.truncate(10);
        assert_eq!(b.first_diff(), Some(10));
    }
}
