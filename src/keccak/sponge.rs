//! Sponge construction over Keccak-f[1600].
//!
//! Absorbing XORs input into the first `rate / 8` bytes of the state and
//! permutes after every full block. Finalising applies the delimited suffix
//! and the closing `0x80` bit, then squeezing reads the rate region and
//! permutes between output blocks.

use super::permute::keccak_f1600;
use super::{State, MAX_OUTPUT_BYTES, STATE_BYTES, WIDTH_BITS};
use crate::error::{KeccakError, KeccakResult};

fn rate_in_bytes(rate_bits: usize, capacity_bits: usize) -> KeccakResult<usize> {
    // A zero rate would leave no room for the padding bits.
    if rate_bits.checked_add(capacity_bits) != Some(WIDTH_BITS)
        || rate_bits % 8 != 0
        || rate_bits == 0
    {
        return Err(KeccakError::InvalidParameters {
            rate_bits,
            capacity_bits,
        });
    }
    Ok(rate_bits / 8)
}

/// A sponge in the absorbing phase.
#[derive(Debug, Clone)]
pub struct Sponge {
    state: State,
    rate: usize,
    suffix: u8,
    /// Bytes absorbed into the current block.
    block_size: usize,
}

impl Sponge {
    /// Create a zeroed sponge.
    ///
    /// Fails with [`KeccakError::InvalidParameters`] unless
    /// `rate_bits + capacity_bits == 1600` and the rate is byte-aligned.
    pub fn new(rate_bits: usize, capacity_bits: usize, delimited_suffix: u8) -> KeccakResult<Self> {
        let rate = rate_in_bytes(rate_bits, capacity_bits)?;
        Ok(Self {
            state: [0u8; STATE_BYTES],
            rate,
            suffix: delimited_suffix,
            block_size: 0,
        })
    }

    /// Rate in bytes.
    pub fn rate(&self) -> usize {
        self.rate
    }

    /// Absorb more input. May be called any number of times.
    pub fn absorb(&mut self, mut input: &[u8]) {
        while !input.is_empty() {
            let take = input.len().min(self.rate - self.block_size);
            let block = &mut self.state[self.block_size..self.block_size + take];
            for (s, b) in block.iter_mut().zip(&input[..take]) {
                *s ^= b;
            }
            self.block_size += take;
            input = &input[take..];

            if self.block_size == self.rate {
                keccak_f1600(&mut self.state);
                self.block_size = 0;
            }
        }
    }

    /// Pad and switch to squeezing.
    pub fn finalize(mut self) -> SpongeReader {
        self.state[self.block_size] ^= self.suffix;
        if self.suffix & 0x80 != 0 && self.block_size == self.rate - 1 {
            keccak_f1600(&mut self.state);
        }
        self.state[self.rate - 1] ^= 0x80;
        keccak_f1600(&mut self.state);

        SpongeReader {
            state: self.state,
            rate: self.rate,
            offset: 0,
        }
    }
}

/// A sponge in the squeezing phase.
#[derive(Debug, Clone)]
pub struct SpongeReader {
    state: State,
    rate: usize,
    /// Bytes already emitted from the current block.
    offset: usize,
}

impl SpongeReader {
    /// Fill `out` with the next output bytes.
    pub fn squeeze_into(&mut self, out: &mut [u8]) {
        let mut written = 0;
        while written < out.len() {
            if self.offset == self.rate {
                keccak_f1600(&mut self.state);
                self.offset = 0;
            }
            let take = (out.len() - written).min(self.rate - self.offset);
            out[written..written + take]
                .copy_from_slice(&self.state[self.offset..self.offset + take]);
            self.offset += take;
            written += take;
        }
    }

    /// Squeeze the next `len` output bytes.
    pub fn squeeze(&mut self, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        self.squeeze_into(&mut out);
        out
    }
}

/// One-shot sponge: absorb `input`, pad with `delimited_suffix`, squeeze
/// exactly `output_len` bytes.
///
/// Parameters are validated before any state is touched. `output_len` is
/// capped at [`MAX_OUTPUT_BYTES`]; stream longer outputs through
/// [`SpongeReader::squeeze_into`] instead.
pub fn sponge(
    rate_bits: usize,
    capacity_bits: usize,
    input: &[u8],
    delimited_suffix: u8,
    output_len: usize,
) -> KeccakResult<Vec<u8>> {
    let mut sponge = Sponge::new(rate_bits, capacity_bits, delimited_suffix)?;
    if output_len > MAX_OUTPUT_BYTES {
        return Err(KeccakError::OutputTooLong {
            requested: output_len,
            max: MAX_OUTPUT_BYTES,
        });
    }
    sponge.absorb(input);
    Ok(sponge.finalize().squeeze(output_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_capacity() {
        let result = sponge(1088, 500, b"", 0x06, 32);
        assert_eq!(
            result,
            Err(KeccakError::InvalidParameters {
                rate_bits: 1088,
                capacity_bits: 500
            })
        );
    }

    #[test]
    fn test_rejects_unaligned_rate() {
        assert!(Sponge::new(1087, 513, 0x06).is_err());
        assert!(Sponge::new(0, 1600, 0x06).is_err());
    }

    #[test]
    fn test_rejects_overflowing_parameters() {
        // Both sums overflow usize; the second wraps to exactly 1600.
        for (rate_bits, capacity_bits) in [(usize::MAX, 2), (usize::MAX - 7, 1608)] {
            assert_eq!(
                sponge(rate_bits, capacity_bits, b"", 0x06, 32),
                Err(KeccakError::InvalidParameters {
                    rate_bits,
                    capacity_bits
                })
            );
            assert!(Sponge::new(rate_bits, capacity_bits, 0x1F).is_err());
        }
    }

    #[test]
    fn test_output_length_capped() {
        let out = sponge(1344, 256, b"", 0x1F, MAX_OUTPUT_BYTES).unwrap();
        assert_eq!(out.len(), MAX_OUTPUT_BYTES);
        assert_eq!(
            sponge(1344, 256, b"", 0x1F, usize::MAX),
            Err(KeccakError::OutputTooLong {
                requested: usize::MAX,
                max: MAX_OUTPUT_BYTES
            })
        );
        // Bad parameters are reported before the length.
        assert!(matches!(
            sponge(1000, 600, b"", 0x1F, usize::MAX),
            Err(KeccakError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn test_output_length_exact() {
        for len in [0, 1, 31, 136, 137, 500] {
            let out = sponge(1088, 512, b"abc", 0x1F, len).unwrap();
            assert_eq!(out.len(), len);
        }
    }

    #[test]
    fn test_sha3_256_empty() {
        let out = sponge(1088, 512, b"", 0x06, 32).unwrap();
        assert_eq!(
            hex::encode(out),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn test_split_absorb_matches_one_shot() {
        let data: Vec<u8> = (0..300u32).map(|i| (i * 31 % 251) as u8).collect();
        let expected = sponge(1088, 512, &data, 0x06, 32).unwrap();

        for split in [0, 1, 135, 136, 137, 299, 300] {
            let mut s = Sponge::new(1088, 512, 0x06).unwrap();
            s.absorb(&data[..split]);
            s.absorb(&data[split..]);
            assert_eq!(s.finalize().squeeze(32), expected, "split at {}", split);
        }
    }

    #[test]
    fn test_split_squeeze_matches_one_shot() {
        let expected = sponge(1344, 256, b"xof", 0x1F, 400).unwrap();
        let mut s = Sponge::new(1344, 256, 0x1F).unwrap();
        s.absorb(b"xof");
        let mut reader = s.finalize();
        let mut out = reader.squeeze(7);
        out.extend(reader.squeeze(161));
        out.extend(reader.squeeze(232));
        assert_eq!(out, expected);
    }

    #[test]
    fn test_high_bit_suffix_permutes_at_rate_boundary() {
        // With the suffix's top bit set and a block one byte short of the
        // rate, the suffix and the closing bit land in separate blocks.
        let rate = 136;
        let input = vec![0x5Au8; rate - 1];
        let suffix = 0x81;

        let mut state = [0u8; STATE_BYTES];
        for (s, b) in state.iter_mut().zip(&input) {
            *s ^= b;
        }
        state[rate - 1] ^= suffix;
        keccak_f1600(&mut state);
        state[rate - 1] ^= 0x80;
        keccak_f1600(&mut state);

        let out = sponge(1088, 512, &input, suffix, 32).unwrap();
        assert_eq!(out, state[..32].to_vec());
    }

    #[test]
    fn test_low_suffix_at_rate_boundary_single_permute() {
        let rate = 136;
        let input = vec![0xA5u8; rate - 1];

        let mut state = [0u8; STATE_BYTES];
        for (s, b) in state.iter_mut().zip(&input) {
            *s ^= b;
        }
        state[rate - 1] ^= 0x06;
        state[rate - 1] ^= 0x80;
        keccak_f1600(&mut state);

        let out = sponge(1088, 512, &input, 0x06, 32).unwrap();
        assert_eq!(out, state[..32].to_vec());
    }
}
