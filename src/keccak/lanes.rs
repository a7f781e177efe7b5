//! Lane codec between the flat state and the 5x5 lane grid.
//!
//! Lane (x, y) occupies bytes `8*(x+5*y) .. 8*(x+5*y)+8`, least significant
//! byte first.

use super::{LANE_BYTES, STATE_BYTES};

/// The flat 1600-bit state.
pub type State = [u8; STATE_BYTES];

/// The lane grid, indexed `[x][y]`.
pub type Lanes = [[u64; 5]; 5];

#[inline]
fn lane_offset(x: usize, y: usize) -> usize {
    LANE_BYTES * (x + 5 * y)
}

/// Decode the state into a lane grid.
pub fn bytes_to_lanes(state: &State) -> Lanes {
    let mut lanes = [[0u64; 5]; 5];
    for (x, column) in lanes.iter_mut().enumerate() {
        for (y, lane) in column.iter_mut().enumerate() {
            let offset = lane_offset(x, y);
            let mut bytes = [0u8; LANE_BYTES];
            bytes.copy_from_slice(&state[offset..offset + LANE_BYTES]);
            *lane = u64::from_le_bytes(bytes);
        }
    }
    lanes
}

/// Encode a lane grid back into a state.
pub fn lanes_to_bytes(lanes: &Lanes) -> State {
    let mut state = [0u8; STATE_BYTES];
    for (x, column) in lanes.iter().enumerate() {
        for (y, lane) in column.iter().enumerate() {
            let offset = lane_offset(x, y);
            state[offset..offset + LANE_BYTES].copy_from_slice(&lane.to_le_bytes());
        }
    }
    state
}

/// Circular left rotation of a lane by `n mod 64` bits.
#[inline]
pub fn rotate_left(a: u64, n: u32) -> u64 {
    a.rotate_left(n % 64)
}
