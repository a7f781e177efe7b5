//! Text protocol spoken with the implementation-under-test.
//!
//! Requests are single lines such as `sha3_256([10, 255, 0])`, with an extra
//! length argument for extendable-output variants: `shake128([1, 2], 32)`.
//! A response is any block of text ending in a blank line that contains a
//! hex literal `x"<digest>"`.

use crate::error::KeccakResult;
use crate::variant::Variant;
use std::fmt::Write as _;

/// Default readiness marker printed by the implementation before the first request.
pub const DEFAULT_READY_MARKER: &str = "melorun>";

/// Blank-line terminators accepted at the end of a response block.
///
/// Terminal-backed implementations emit `\r\n\r\n`; plain pipes usually `\n\n`.
pub const RESPONSE_TERMINATORS: [&str; 2] = ["\r\n\r\n", "\n\n"];

/// One hashing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Algorithm to run.
    pub variant: Variant,
    /// Message bytes, possibly empty.
    pub input: Vec<u8>,
    /// Output length for extendable-output variants.
    pub output_len: Option<usize>,
}

impl TestCase {
    /// A fixed-output request.
    pub fn new(variant: Variant, input: Vec<u8>) -> Self {
        Self {
            variant,
            input,
            output_len: None,
        }
    }

    /// A request with an explicit output length.
    pub fn with_output_len(variant: Variant, input: Vec<u8>, output_len: usize) -> Self {
        Self {
            variant,
            input,
            output_len: Some(output_len),
        }
    }

    /// Reference digest for this case.
    pub fn reference_digest(&self) -> KeccakResult<Vec<u8>> {
        self.variant.output(&self.input, self.output_len)
    }
}

/// Render a request line, without the trailing newline.
pub fn format_request(case: &TestCase) -> String {
    let name = case.variant.function_name();
    let mut line = String::with_capacity(name.len() + case.input.len() * 5 + 8);
    line.push_str(name);
    line.push_str("([");
    for (i, byte) in case.input.iter().enumerate() {
        if i > 0 {
            line.push_str(", ");
        }
        // Writing to a String cannot fail.
        let _ = write!(line, "{}", byte);
    }
    line.push(']');
    if let Some(len) = case.output_len {
        let _ = write!(line, ", {}", len);
    }
    line.push(')');
    line
}

/// Parse a request line back into a test case.
///
/// Tolerates whitespace and a trailing comma inside the byte array.
pub fn parse_request(line: &str) -> Result<TestCase, String> {
    let line = line.trim();
    let open = line
        .find('(')
        .ok_or_else(|| format!("expected `name([bytes])`, got {:?}", line))?;
    let name = line[..open].trim();
    let variant: Variant = name.parse().map_err(|e| format!("{}", e))?;

    let args = line[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| "missing closing `)`".to_string())?
        .trim();
    let args = args
        .strip_prefix('[')
        .ok_or_else(|| "expected a byte array literal".to_string())?;
    let close = args
        .find(']')
        .ok_or_else(|| "missing closing `]`".to_string())?;

    let mut input = Vec::new();
    for item in args[..close].split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let byte = item
            .parse::<u8>()
            .map_err(|_| format!("byte value out of range: {:?}", item))?;
        input.push(byte);
    }

    let rest = args[close + 1..].trim();
    let output_len = match rest.strip_prefix(',') {
        Some(len) => Some(
            len.trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid output length: {:?}", len.trim()))?,
        ),
        None if rest.is_empty() => None,
        None => return Err(format!("unexpected trailing text: {:?}", rest)),
    };

    Ok(TestCase {
        variant,
        input,
        output_len,
    })
}

/// Render a successful response block.
pub fn format_response(digest: &[u8]) -> String {
    format!("x\"{}\"\r\n\r\n", hex::encode(digest))
}

/// Position and length of the earliest response terminator in `buf`.
pub fn find_terminator(buf: &[u8]) -> Option<(usize, usize)> {
    RESPONSE_TERMINATORS
        .iter()
        .filter_map(|t| {
            buf.windows(t.len())
                .position(|w| w == t.as_bytes())
                .map(|pos| (pos, t.len()))
        })
        .min_by_key(|(pos, _)| *pos)
}

/// Extract the first well-formed `x"<hex>"` literal from a response,
/// lowercased.
pub fn extract_digest(response: &str) -> Option<String> {
    let mut rest = response;
    while let Some(start) = rest.find("x\"") {
        let body = &rest[start + 2..];
        if let Some(end) = body.find('"') {
            let candidate = &body[..end];
            if !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_hexdigit()) {
                return Some(candidate.to_ascii_lowercase());
            }
        }
        rest = body;
    }
    None
}
