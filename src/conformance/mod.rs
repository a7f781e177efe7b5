//! Differential testing against an external Keccak implementation.
//!
//! The implementation-under-test is a black box reached through a
//! line-oriented text protocol. The harness feeds it random inputs, computes
//! the same digests with the reference sponge and stops at the first
//! discrepancy with everything needed to reproduce it.
//!
//! - [`protocol`] formats requests and extracts digests from responses
//! - [`session`] drives the interactive subprocess with bounded timeouts
//! - [`runner`] is the `submit_case` seam the fuzzer talks to
//! - [`harness`] is the fuzzing state machine
//! - [`repro`] captures a discrepancy for later replay
//! - [`corpus`] runs known-answer vectors against the reference

pub mod corpus;
mod harness;
pub mod protocol;
mod repro;
mod runner;
mod session;

pub use corpus::{Corpus, CorpusResults, CorpusRunner, TestVector, VectorOutcome};
pub use harness::{DiffFuzzer, DiffResult, FuzzOutcome, FuzzReport, FuzzState, HaltReason};
pub use protocol::TestCase;
pub use repro::ReproBundle;
pub use runner::{ImplementationRunner, ReferenceRunner, SubprocessRunner};
pub use session::ReplSession;

use crate::error::KeccakError;

/// Result type for conformance operations.
pub type ConformanceResult<T> = Result<T, ConformanceError>;

/// Errors that can occur while talking to the implementation-under-test.
#[derive(Debug)]
pub enum ConformanceError {
    /// The implementation could not be started.
    Spawn(String),
    /// The implementation's output broke the protocol: missing readiness
    /// marker, no digest literal, timeout, or early exit.
    Protocol {
        /// What went wrong.
        reason: String,
        /// Everything received since the last complete response.
        raw: String,
    },
    /// I/O error on the implementation's pipes or on a local file.
    Io(String),
    /// The reference computation rejected the case.
    Reference(KeccakError),
    /// The run configuration is unusable.
    Config(String),
}

impl ConformanceError {
    /// Build a protocol error carrying the raw response text.
    pub fn protocol(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// Raw response text for protocol errors.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Protocol { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConformanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(msg) => write!(f, "Failed to start implementation: {}", msg),
            Self::Protocol { reason, raw } => {
                write!(f, "Protocol error: {}", reason)?;
                if !raw.is_empty() {
                    write!(f, " (raw response: {:?})", raw)?;
                }
                Ok(())
            }
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
            Self::Reference(e) => write!(f, "Reference implementation error: {}", e),
            Self::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConformanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Reference(e) => Some(e),
            _ => None,
        }
    }
}

impl From<KeccakError> for ConformanceError {
    fn from(e: KeccakError) -> Self {
        Self::Reference(e)
    }
}

impl From<std::io::Error> for ConformanceError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
