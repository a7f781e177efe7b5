//! Keccak Oracle - reference Keccak-f[1600] sponge and a differential fuzzer.
//!
//! This crate computes SHA-3, original Keccak and SHAKE digests with a plain
//! reference implementation and compares them against an external
//! implementation reached through a line-oriented text protocol.
//!
//! # Architecture
//!
//! - [`keccak`] - lane codec, Keccak-f[1600] permutation and the sponge
//! - [`variant`] - the named algorithms and their sponge parameters
//! - [`conformance`] - protocol, subprocess session, fuzzer, repro bundles, KAT corpus
//! - [`config`] - fuzz run configuration
//! - [`repl`] - loopback implementation serving the protocol
//! - [`error`] - errors from the reference path
//!
//! # Example
//!
//! ```
//! use keccak_oracle::Variant;
//!
//! let digest = Variant::Sha3_256.digest(b"abc").unwrap();
//! assert_eq!(
//!     hex::encode(digest),
//!     "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
//! );
//! ```

// Reference code must surface every failure as an error value.
// Tests are checked separately with `cargo test`.
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod config;
pub mod conformance;
pub mod error;
pub mod keccak;
pub mod repl;
pub mod variant;

// Re-export commonly used types
pub use config::FuzzConfig;
pub use conformance::{DiffFuzzer, DiffResult, FuzzReport, ReproBundle, TestCase};
pub use error::{KeccakError, KeccakResult};
pub use keccak::{keccak_f1600, permute, sponge, Sponge, SpongeReader, MAX_OUTPUT_BYTES};
pub use variant::Variant;
