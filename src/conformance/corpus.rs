//! Known-answer corpus runner.
//!
//! A corpus is a JSON file with a `manifest` and a list of `vectors`. Each
//! vector names an operation, its input and the expected result, either
//! `{"ok": {...}}` or `{"err": "<KeccakError name>"}`.
//!
//! Supported operations:
//!
//! - `digest`: fixed-output variant over a message
//! - `xof`: extendable-output variant with `output_len`
//! - `sponge`: raw rate/capacity/suffix parameters, may expect an error
//! - `permute`: Keccak-f[1600] applied `applications` times to 25 lanes

use crate::error::KeccakResult;
use crate::keccak::{permute, sponge, Lanes};
use crate::variant::Variant;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// Largest message a vector may expand to after `repeat`, in bytes (64 MiB).
pub const MAX_MESSAGE_BYTES: usize = 64 << 20;

/// Corpus manifest with metadata.
#[derive(Debug, Deserialize)]
pub struct CorpusManifest {
    /// Format version of the corpus file.
    pub format_version: String,
    /// Corpus name.
    pub name: String,
    /// Where the vectors come from.
    #[serde(default)]
    pub source: String,
}

/// A corpus containing test vectors.
#[derive(Debug, Deserialize)]
pub struct Corpus {
    /// Corpus metadata.
    pub manifest: CorpusManifest,
    /// List of test vectors.
    pub vectors: Vec<TestVector>,
}

/// A single test vector.
#[derive(Debug, Deserialize)]
pub struct TestVector {
    /// Unique identifier for the test.
    pub id: String,
    /// Operation to test (`digest`, `xof`, `sponge`, `permute`).
    pub op: String,
    /// Input parameters for the operation.
    pub input: serde_json::Value,
    /// Expected result (success or error).
    pub expected: serde_json::Value,
}

/// Message bytes given as hex or as text, optionally repeated.
#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    message_hex: Option<String>,
    #[serde(default)]
    message_text: Option<String>,
    #[serde(default = "one")]
    repeat: usize,
}

fn one() -> usize {
    1
}

impl Message {
    fn bytes(&self) -> Result<Vec<u8>, String> {
        let unit = match (&self.message_hex, &self.message_text) {
            (Some(h), None) => hex::decode(h).map_err(|e| format!("Invalid hex: {}", e))?,
            (None, Some(t)) => t.as_bytes().to_vec(),
            (None, None) => Vec::new(),
            (Some(_), Some(_)) => {
                return Err("Give either 'message_hex' or 'message_text', not both".to_string())
            }
        };
        match unit.len().checked_mul(self.repeat) {
            Some(total) if total <= MAX_MESSAGE_BYTES => Ok(unit.repeat(self.repeat)),
            _ => Err(format!(
                "Message of {} bytes repeated {} times exceeds {} bytes",
                unit.len(),
                self.repeat,
                MAX_MESSAGE_BYTES
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DigestInput {
    algorithm: String,
    #[serde(flatten)]
    message: Message,
    #[serde(default)]
    output_len: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SpongeInput {
    rate_bits: usize,
    capacity_bits: usize,
    suffix: u8,
    output_len: usize,
    #[serde(flatten)]
    message: Message,
}

#[derive(Debug, Deserialize)]
struct PermuteInput {
    lanes: Vec<String>,
    #[serde(default = "one")]
    applications: usize,
}

/// How a single vector fared against the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorOutcome {
    /// The reference produced the expected result.
    Pass,
    /// The reference disagrees with the vector.
    Mismatch {
        /// Expected result from the corpus.
        expected: String,
        /// What the reference produced.
        actual: String,
    },
    /// The vector could not be run: unknown operation, malformed input or
    /// malformed expectation.
    Invalid(String),
}

impl VectorOutcome {
    /// Returns true if the reference agreed with the vector.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Returns true if the reference disagreed with the vector.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}

impl fmt::Display for VectorOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("ok"),
            Self::Mismatch { expected, actual } => {
                write!(f, "expected {}, got {}", expected, actual)
            }
            Self::Invalid(reason) => f.write_str(reason),
        }
    }
}

/// Outcomes of a corpus run, in corpus order.
#[derive(Debug, Default)]
pub struct CorpusResults {
    outcomes: Vec<(String, VectorOutcome)>,
}

impl CorpusResults {
    /// Number of vectors run.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true if no vectors were run.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of vectors the reference agreed with.
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_pass()).count()
    }

    /// Number of vectors the reference disagreed with.
    pub fn mismatched(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_mismatch()).count()
    }

    /// Number of vectors that could not be run.
    pub fn invalid(&self) -> usize {
        self.len() - self.passed() - self.mismatched()
    }

    /// Returns true if every vector passed.
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|(_, o)| o.is_pass())
    }

    /// One-line tally for the `kat` command.
    pub fn summary(&self) -> String {
        format!(
            "{}/{} vectors passed, {} failed, {} invalid",
            self.passed(),
            self.len(),
            self.mismatched(),
            self.invalid()
        )
    }

    /// Every vector that did not pass, with its id.
    pub fn problems(&self) -> impl Iterator<Item = (&str, &VectorOutcome)> {
        self.outcomes
            .iter()
            .filter(|(_, o)| !o.is_pass())
            .map(|(id, o)| (id.as_str(), o))
    }
}

impl FromIterator<(String, VectorOutcome)> for CorpusResults {
    fn from_iter<I: IntoIterator<Item = (String, VectorOutcome)>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

/// Corpus runner that executes test vectors against the reference.
pub struct CorpusRunner {
    corpus: Corpus,
}

impl CorpusRunner {
    /// Load corpus from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read corpus file: {}", e))?;
        Self::from_json(&content)
    }

    /// Parse a corpus from JSON text.
    pub fn from_json(content: &str) -> Result<Self, String> {
        let corpus: Corpus = serde_json::from_str(content)
            .map_err(|e| format!("Failed to parse corpus JSON: {}", e))?;
        Ok(Self { corpus })
    }

    /// Get the corpus manifest.
    pub fn manifest(&self) -> &CorpusManifest {
        &self.corpus.manifest
    }

    /// Get the number of test vectors.
    pub fn vector_count(&self) -> usize {
        self.corpus.vectors.len()
    }

    /// Run all test vectors and return results.
    pub fn run_all(&self) -> CorpusResults {
        self.corpus
            .vectors
            .iter()
            .map(|vector| {
                let outcome = run_vector(vector);
                if !outcome.is_pass() {
                    log::debug!("{}: {}", vector.id, outcome);
                }
                (vector.id.clone(), outcome)
            })
            .collect()
    }
}

/// Run a single test vector.
pub fn run_vector(vector: &TestVector) -> VectorOutcome {
    let actual = match vector.op.as_str() {
        "digest" | "xof" => input::<DigestInput>(vector).and_then(|i| run_digest(&i)),
        "sponge" => input::<SpongeInput>(vector).and_then(|i| run_sponge(&i)),
        "permute" => input::<PermuteInput>(vector).and_then(|i| run_permute(&i)),
        other => Err(format!("Unknown operation: {}", other)),
    };
    match actual {
        Ok(result) => check(&vector.expected, result),
        Err(reason) => VectorOutcome::Invalid(reason),
    }
}

fn input<T: DeserializeOwned>(vector: &TestVector) -> Result<T, String> {
    serde_json::from_value(vector.input.clone())
        .map_err(|e| format!("Invalid input for '{}': {}", vector.op, e))
}

/// What the reference produced: a hex digest or 25 lanes.
enum Actual {
    Digest(String),
    Lanes(Vec<u64>),
}

fn run_digest(input: &DigestInput) -> Result<KeccakResult<Actual>, String> {
    let message = input.message.bytes()?;
    Ok(input
        .algorithm
        .parse::<Variant>()
        .and_then(|v| v.output(&message, input.output_len))
        .map(|d| Actual::Digest(hex::encode(d))))
}

fn run_sponge(input: &SpongeInput) -> Result<KeccakResult<Actual>, String> {
    let message = input.message.bytes()?;
    Ok(sponge(
        input.rate_bits,
        input.capacity_bits,
        &message,
        input.suffix,
        input.output_len,
    )
    .map(|d| Actual::Digest(hex::encode(d))))
}

/// Parse one lane: up to 16 hex digits with an optional single `0x` prefix.
fn parse_lane(text: &str) -> Result<u64, String> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    if digits.is_empty() || digits.len() > 16 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("Invalid lane '{}'", text));
    }
    u64::from_str_radix(digits, 16).map_err(|e| format!("Invalid lane '{}': {}", text, e))
}

fn run_permute(input: &PermuteInput) -> Result<KeccakResult<Actual>, String> {
    if input.lanes.len() != 25 {
        return Err(format!("Expected 25 lanes, got {}", input.lanes.len()));
    }
    let mut lanes: Lanes = [[0u64; 5]; 5];
    for (i, text) in input.lanes.iter().enumerate() {
        lanes[i % 5][i / 5] = parse_lane(text).map_err(|e| format!("lane {}: {}", i, e))?;
    }
    for _ in 0..input.applications {
        lanes = permute(&lanes);
    }
    let out = (0..25).map(|i| lanes[i % 5][i / 5]).collect();
    Ok(Ok(Actual::Lanes(out)))
}

fn check(expected: &serde_json::Value, actual: KeccakResult<Actual>) -> VectorOutcome {
    if let Some(ok) = expected.get("ok") {
        match actual {
            Ok(Actual::Digest(digest)) => {
                let want = ok
                    .get("digest")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_lowercase();
                compare(want, digest)
            }
            Ok(Actual::Lanes(lanes)) => match expected_lanes(ok) {
                Ok(want) => compare(format_lanes(&want), format_lanes(&lanes)),
                Err(reason) => VectorOutcome::Invalid(reason),
            },
            Err(e) => VectorOutcome::Mismatch {
                expected: format!("ok: {}", ok),
                actual: format!("err: {}", e.name()),
            },
        }
    } else if let Some(err) = expected.get("err").and_then(|v| v.as_str()) {
        match actual {
            Ok(_) => VectorOutcome::Mismatch {
                expected: format!("err: {}", err),
                actual: "ok".to_string(),
            },
            Err(e) => compare(err.to_string(), e.name().to_string()),
        }
    } else {
        VectorOutcome::Invalid("Invalid expected format".to_string())
    }
}

fn expected_lanes(ok: &serde_json::Value) -> Result<Vec<u64>, String> {
    let list = ok
        .get("lanes")
        .and_then(|v| v.as_array())
        .ok_or_else(|| "Expected 'lanes' list".to_string())?;
    list.iter()
        .map(|l| {
            l.as_str()
                .ok_or_else(|| format!("Expected lane {} is not a string", l))
                .and_then(parse_lane)
        })
        .collect()
}

fn format_lanes(lanes: &[u64]) -> String {
    lanes
        .iter()
        .map(|l| format!("{:016x}", l))
        .collect::<Vec<_>>()
        .join(" ")
}

fn compare(expected: String, actual: String) -> VectorOutcome {
    if expected == actual {
        VectorOutcome::Pass
    } else {
        VectorOutcome::Mismatch { expected, actual }
    }
}
