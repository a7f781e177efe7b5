//! Named SHA-3, Keccak and SHAKE variants and their sponge parameters.

use crate::error::{KeccakError, KeccakResult};
use crate::keccak::sponge;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sponge parameters for one algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantParams {
    /// Rate in bits.
    pub rate_bits: usize,
    /// Capacity in bits.
    pub capacity_bits: usize,
    /// Domain-separation suffix XORed in during padding.
    pub suffix: u8,
    /// Digest length in bytes, `None` for extendable-output functions.
    pub output_len: Option<usize>,
}

/// A named Keccak-based algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// SHA3-224 (FIPS 202).
    #[serde(rename = "SHA3-224")]
    Sha3_224,
    /// SHA3-256 (FIPS 202).
    #[serde(rename = "SHA3-256")]
    Sha3_256,
    /// SHA3-384 (FIPS 202).
    #[serde(rename = "SHA3-384")]
    Sha3_384,
    /// SHA3-512 (FIPS 202).
    #[serde(rename = "SHA3-512")]
    Sha3_512,
    /// Original Keccak-224 padding.
    #[serde(rename = "Keccak-224")]
    Keccak224,
    /// Original Keccak-256 padding, as used by Ethereum.
    #[serde(rename = "Keccak-256")]
    Keccak256,
    /// Original Keccak-384 padding.
    #[serde(rename = "Keccak-384")]
    Keccak384,
    /// Original Keccak-512 padding.
    #[serde(rename = "Keccak-512")]
    Keccak512,
    /// SHAKE128 extendable-output function.
    #[serde(rename = "SHAKE128")]
    Shake128,
    /// SHAKE256 extendable-output function.
    #[serde(rename = "SHAKE256")]
    Shake256,
}

const SHA3_SUFFIX: u8 = 0x06;
const KECCAK_SUFFIX: u8 = 0x01;
const SHAKE_SUFFIX: u8 = 0x1F;

impl Variant {
    /// Every variant in the table.
    pub const ALL: [Variant; 10] = [
        Variant::Sha3_224,
        Variant::Sha3_256,
        Variant::Sha3_384,
        Variant::Sha3_512,
        Variant::Keccak224,
        Variant::Keccak256,
        Variant::Keccak384,
        Variant::Keccak512,
        Variant::Shake128,
        Variant::Shake256,
    ];

    /// The eight fixed-output variants, in fuzzer index order.
    pub const FIXED_OUTPUT: [Variant; 8] = [
        Variant::Sha3_224,
        Variant::Sha3_256,
        Variant::Sha3_384,
        Variant::Sha3_512,
        Variant::Keccak224,
        Variant::Keccak256,
        Variant::Keccak384,
        Variant::Keccak512,
    ];

    /// Look up a fixed-output variant by its fuzzer index.
    pub fn from_index(index: usize) -> Option<Variant> {
        Self::FIXED_OUTPUT.get(index).copied()
    }

    /// Sponge parameters for this variant.
    pub fn params(self) -> VariantParams {
        let (rate_bits, suffix, output_len) = match self {
            Variant::Sha3_224 => (1152, SHA3_SUFFIX, Some(28)),
            Variant::Sha3_256 => (1088, SHA3_SUFFIX, Some(32)),
            Variant::Sha3_384 => (832, SHA3_SUFFIX, Some(48)),
            Variant::Sha3_512 => (576, SHA3_SUFFIX, Some(64)),
            Variant::Keccak224 => (1152, KECCAK_SUFFIX, Some(28)),
            Variant::Keccak256 => (1088, KECCAK_SUFFIX, Some(32)),
            Variant::Keccak384 => (832, KECCAK_SUFFIX, Some(48)),
            Variant::Keccak512 => (576, KECCAK_SUFFIX, Some(64)),
            Variant::Shake128 => (1344, SHAKE_SUFFIX, None),
            Variant::Shake256 => (1088, SHAKE_SUFFIX, None),
        };
        VariantParams {
            rate_bits,
            capacity_bits: 1600 - rate_bits,
            suffix,
            output_len,
        }
    }

    /// Display name, e.g. `SHA3-256`.
    pub fn name(self) -> &'static str {
        match self {
            Variant::Sha3_224 => "SHA3-224",
            Variant::Sha3_256 => "SHA3-256",
            Variant::Sha3_384 => "SHA3-384",
            Variant::Sha3_512 => "SHA3-512",
            Variant::Keccak224 => "Keccak-224",
            Variant::Keccak256 => "Keccak-256",
            Variant::Keccak384 => "Keccak-384",
            Variant::Keccak512 => "Keccak-512",
            Variant::Shake128 => "SHAKE128",
            Variant::Shake256 => "SHAKE256",
        }
    }

    /// Function name used on the wire, e.g. `sha3_256` or `keccak256`.
    pub fn function_name(self) -> &'static str {
        match self {
            Variant::Sha3_224 => "sha3_224",
            Variant::Sha3_256 => "sha3_256",
            Variant::Sha3_384 => "sha3_384",
            Variant::Sha3_512 => "sha3_512",
            Variant::Keccak224 => "keccak224",
            Variant::Keccak256 => "keccak256",
            Variant::Keccak384 => "keccak384",
            Variant::Keccak512 => "keccak512",
            Variant::Shake128 => "shake128",
            Variant::Shake256 => "shake256",
        }
    }

    /// True for SHAKE128 and SHAKE256.
    pub fn is_xof(self) -> bool {
        self.params().output_len.is_none()
    }

    /// Hash `input` with a fixed-output variant.
    pub fn digest(self, input: &[u8]) -> KeccakResult<Vec<u8>> {
        self.output(input, None)
    }

    /// Hash `input`, taking the output length from the table or from
    /// `output_len` for extendable-output variants.
    ///
    /// A fixed-output variant accepts `output_len` only when it equals its
    /// digest length.
    pub fn output(self, input: &[u8], output_len: Option<usize>) -> KeccakResult<Vec<u8>> {
        let params = self.params();
        let len = match (params.output_len, output_len) {
            (Some(fixed), None) => fixed,
            (Some(fixed), Some(requested)) if fixed == requested => fixed,
            (Some(fixed), Some(requested)) => {
                return Err(KeccakError::FixedOutputLength {
                    variant: self.name(),
                    expected: fixed,
                    requested,
                })
            }
            (None, Some(requested)) => requested,
            (None, None) => return Err(KeccakError::OutputLengthRequired(self.name())),
        };
        sponge(
            params.rate_bits,
            params.capacity_bits,
            input,
            params.suffix,
            len,
        )
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = KeccakError;

    /// Accepts display names (`SHA3-256`, `Keccak-256`) and wire names
    /// (`sha3_256`, `keccak256`), ignoring case and `-`/`_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|v| v.function_name().replace('_', "") == wanted)
            .ok_or_else(|| KeccakError::UnknownVariant(s.to_string()))
    }
}
