//! Error handling for the reference Keccak path.
//!
//! Every error here is a caller or configuration bug: valid parameters and
//! valid inputs never fail. The differential harness has its own error type
//! in [`crate::conformance::ConformanceError`].

use thiserror::Error;

/// Errors raised by the sponge, the variant table and algorithm lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum KeccakError {
    /// `rate + capacity` is not 1600, or the rate is not a whole number of bytes.
    #[error(
        "invalid sponge parameters: rate {rate_bits} + capacity {capacity_bits} \
         must equal 1600 with a byte-aligned rate"
    )]
    InvalidParameters {
        /// Requested rate in bits.
        rate_bits: usize,
        /// Requested capacity in bits.
        capacity_bits: usize,
    },

    /// An extendable-output function was called without an output length.
    #[error("{0} is an extendable-output function and needs an output length")]
    OutputLengthRequired(&'static str),

    /// A fixed-output variant was asked for a different output length.
    #[error("{variant} produces {expected} bytes, {requested} were requested")]
    FixedOutputLength {
        /// Algorithm name.
        variant: &'static str,
        /// The variant's digest length in bytes.
        expected: usize,
        /// The length that was asked for.
        requested: usize,
    },

    /// The requested output is longer than a one-shot call will allocate.
    #[error("output length {requested} exceeds the maximum of {max} bytes")]
    OutputTooLong {
        /// The length that was asked for.
        requested: usize,
        /// The cap, [`crate::keccak::MAX_OUTPUT_BYTES`].
        max: usize,
    },

    /// No algorithm with this name exists in the variant table.
    #[error("unknown algorithm: {0}")]
    UnknownVariant(String),
}

impl KeccakError {
    /// Get the error name as a string.
    ///
    /// Stable across releases; corpus files match expected failures on it.
    pub fn name(&self) -> &'static str {
        match self {
            KeccakError::InvalidParameters { .. } => "InvalidParameters",
            KeccakError::OutputLengthRequired(_) => "OutputLengthRequired",
            KeccakError::FixedOutputLength { .. } => "FixedOutputLength",
            KeccakError::OutputTooLong { .. } => "OutputTooLong",
            KeccakError::UnknownVariant(_) => "UnknownVariant",
        }
    }
}

/// Result type for reference operations.
pub type KeccakResult<T> = Result<T, KeccakError>;
