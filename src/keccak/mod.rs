//! Keccak-f[1600] permutation and sponge construction.
//!
//! The reference favours bit-exactness over speed: lanes are decoded from the
//! 200-byte state for every permutation call and encoded back afterwards.
//!
//! - [`lanes`] converts the flat state to and from a 5x5 grid of 64-bit lanes
//! - [`permute`] applies the 24 rounds of θ, ρ, π, χ and ι
//! - [`sponge`] drives absorb, padding and squeeze around the permutation

pub mod lanes;
pub mod permute;
pub mod sponge;

pub use lanes::{bytes_to_lanes, lanes_to_bytes, rotate_left, Lanes, State};
pub use permute::{keccak_f1600, permute, permute_with_trace, round_constants};
pub use sponge::{sponge, Sponge, SpongeReader};

/// Permutation width in bits.
pub const WIDTH_BITS: usize = 1600;

/// Number of bytes in the Keccak state.
pub const STATE_BYTES: usize = 200;

/// Bytes per lane.
pub const LANE_BYTES: usize = 8;

/// Number of rounds of Keccak-f[1600].
pub const ROUNDS: usize = 24;

/// Longest output a one-shot [`sponge()`] call produces, in bytes (1 MiB).
///
/// Requests above this fail with
/// [`KeccakError::OutputTooLong`](crate::error::KeccakError::OutputTooLong)
/// rather than attempting the allocation.
pub const MAX_OUTPUT_BYTES: usize = 1 << 20;
