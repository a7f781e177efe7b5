//! Loopback implementation of the request/response protocol.
//!
//! `serve` prints the readiness marker, answers each request line with the
//! reference digest and prints the marker again. It gives the fuzzer a
//! known-good peer and shows implementers what a conforming session looks
//! like:
//!
//! ```text
//! melorun> sha3_256([97, 98, 99])
//! x"3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
//!
//! melorun>
//! ```

use crate::conformance::protocol::{format_response, parse_request};
use std::io::{self, BufRead, Write};

/// Serve requests from `reader` until end of input or `exit`/`quit`.
///
/// Returns the number of requests answered, including those answered with
/// an error block.
pub fn serve<R: BufRead, W: Write>(reader: R, mut writer: W, prompt: &str) -> io::Result<usize> {
    let mut answered = 0;
    write!(writer, "{} ", prompt)?;
    writer.flush()?;

    for line in reader.lines() {
        let line = line?;
        let request = line.trim();
        if request.is_empty() {
            write!(writer, "{} ", prompt)?;
            writer.flush()?;
            continue;
        }
        if request == "exit" || request == "quit" {
            break;
        }

        let block = match parse_request(request) {
            Ok(case) => match case.reference_digest() {
                Ok(digest) => format_response(&digest),
                Err(e) => format!("error: {}\r\n\r\n", e),
            },
            Err(e) => format!("error: {}\r\n\r\n", e),
        };
        log::trace!("{} -> {:?}", request, block);
        write!(writer, "{}{} ", block, prompt)?;
        writer.flush()?;
        answered += 1;
    }

    Ok(answered)
}
