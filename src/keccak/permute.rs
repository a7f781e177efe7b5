//! Keccak-f[1600] permutation.
//!
//! Each of the 24 rounds applies:
//! 1. θ: XOR every lane with the parities of two neighbouring columns
//! 2. ρ and π: rotate lanes while moving them along a fixed trajectory
//! 3. χ: the only non-linear step, row by row
//! 4. ι: XOR a round constant into lane (0, 0)
//!
//! Round constants come from an 8-bit LFSR that starts at 1 for every
//! permutation call and runs on across rounds.

use super::lanes::{bytes_to_lanes, lanes_to_bytes, rotate_left, Lanes, State};
use super::ROUNDS;

/// Advance the round-constant LFSR (x^8 + x^6 + x^5 + x^4 + 1) by one round
/// and return that round's constant.
fn next_round_constant(lfsr: &mut u8) -> u64 {
    let mut rc = 0u64;
    for j in 0..7 {
        *lfsr = (*lfsr << 1) ^ ((*lfsr >> 7) * 0x71);
        if *lfsr & 2 != 0 {
            rc ^= 1 << ((1u32 << j) - 1);
        }
    }
    rc
}

/// The 24 ι constants, in round order.
pub fn round_constants() -> [u64; ROUNDS] {
    let mut lfsr = 1u8;
    let mut constants = [0u64; ROUNDS];
    for rc in constants.iter_mut() {
        *rc = next_round_constant(&mut lfsr);
    }
    constants
}

fn theta(lanes: &mut Lanes) {
    let mut c = [0u64; 5];
    for (x, column) in lanes.iter().enumerate() {
        c[x] = column.iter().fold(0, |acc, lane| acc ^ lane);
    }
    for x in 0..5 {
        let d = c[(x + 4) % 5] ^ rotate_left(c[(x + 1) % 5], 1);
        for lane in lanes[x].iter_mut() {
            *lane ^= d;
        }
    }
}

/// ρ and π together: walk the 24-step trajectory from (1, 0), carrying the
/// lane that is displaced at each step.
fn rho_pi(lanes: &mut Lanes) {
    let (mut x, mut y) = (1usize, 0usize);
    let mut current = lanes[x][y];
    for t in 0..24u32 {
        (x, y) = (y, (2 * x + 3 * y) % 5);
        let displaced = lanes[x][y];
        lanes[x][y] = rotate_left(current, (t + 1) * (t + 2) / 2);
        current = displaced;
    }
}

fn chi(lanes: &mut Lanes) {
    for y in 0..5 {
        let row: [u64; 5] = std::array::from_fn(|x| lanes[x][y]);
        for x in 0..5 {
            lanes[x][y] = row[x] ^ (!row[(x + 1) % 5] & row[(x + 2) % 5]);
        }
    }
}

fn round(lanes: &mut Lanes, lfsr: &mut u8) {
    theta(lanes);
    rho_pi(lanes);
    chi(lanes);
    // ι
    lanes[0][0] ^= next_round_constant(lfsr);
}

/// Apply Keccak-f[1600] to a lane grid.
pub fn permute(lanes: &Lanes) -> Lanes {
    let mut st = *lanes;
    let mut lfsr = 1u8;
    for _ in 0..ROUNDS {
        round(&mut st, &mut lfsr);
    }
    st
}

/// Keccak-f[1600] with the grid recorded after every round.
///
/// The last trace entry equals the returned grid.
pub fn permute_with_trace(lanes: &Lanes) -> (Lanes, Vec<Lanes>) {
    let mut st = *lanes;
    let mut lfsr = 1u8;
    let mut traces = Vec::with_capacity(ROUNDS);
    for _ in 0..ROUNDS {
        round(&mut st, &mut lfsr);
        traces.push(st);
    }
    (st, traces)
}

/// Apply Keccak-f[1600] to a flat state through the lane codec.
pub fn keccak_f1600(state: &mut State) {
    let lanes = permute(&bytes_to_lanes(state));
    *state = lanes_to_bytes(&lanes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keccak::STATE_BYTES;

    #[test]
    fn test_first_round_constants() {
        let rc = round_constants();
        assert_eq!(rc[0], 0x0000_0000_0000_0001);
        assert_eq!(rc[1], 0x0000_0000_0000_8082);
        assert_eq!(rc[23], 0x8000_0000_8000_8008);
    }

    #[test]
    fn test_permute_zero_first_lane() {
        let out = permute(&[[0u64; 5]; 5]);
        assert_eq!(out[0][0], 0xF125_8F79_40E1_DDE7);
        assert_eq!(out[1][0], 0x84D5_CCF9_33C0_478A);
    }

    #[test]
    fn test_trace_length_and_tail() {
        let mut lanes = [[0u64; 5]; 5];
        lanes[2][3] = 0x0123_4567_89AB_CDEF;
        let (out, traces) = permute_with_trace(&lanes);
        assert_eq!(traces.len(), ROUNDS);
        assert_eq!(traces.last(), Some(&out));
        assert_eq!(out, permute(&lanes));
    }

    #[test]
    fn test_rho_pi_moves_single_lane() {
        // Lane (1, 0) moves to (0, 2) rotated by 1.
        let mut lanes = [[0u64; 5]; 5];
        lanes[1][0] = 1;
        rho_pi(&mut lanes);
        assert_eq!(lanes[0][2], 2);
        assert_eq!(lanes[1][0], 0);
        // Lane (0, 0) is a fixed point of π with offset 0.
        let mut lanes = [[0u64; 5]; 5];
        lanes[0][0] = 0xABCD;
        rho_pi(&mut lanes);
        assert_eq!(lanes[0][0], 0xABCD);
    }

    #[test]
    fn test_keccak_f1600_matches_lane_permute() {
        let mut state = [0u8; STATE_BYTES];
        state[0] = 0x06;
        state[135] = 0x80;
        let expected = lanes_to_bytes(&permute(&bytes_to_lanes(&state)));
        keccak_f1600(&mut state);
        assert_eq!(state, expected);
    }
}
