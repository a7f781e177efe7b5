//! Interactive subprocess session with the implementation-under-test.
//!
//! Output from stdout and stderr is pumped into a channel by two reader
//! threads, so every wait can be bounded with `recv_timeout`. Bytes that
//! arrive after a match stay buffered for the next read.

use super::protocol::find_terminator;
use super::{ConformanceError, ConformanceResult};
use std::io::{Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// A running implementation-under-test.
pub struct ReplSession {
    child: Child,
    stdin: ChildStdin,
    output: Receiver<Vec<u8>>,
    buffer: Vec<u8>,
    program: String,
}

fn pump<R: Read + Send + 'static>(mut reader: R, tx: Sender<Vec<u8>>) {
    thread::spawn(move || {
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(chunk[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

impl ReplSession {
    /// Start `command[0]` with the remaining elements as arguments.
    pub fn spawn(command: &[String]) -> ConformanceResult<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| ConformanceError::Config("empty command".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ConformanceError::Spawn(format!("{}: {}", program, e)))?;

        let missing = |stream: &str| ConformanceError::Spawn(format!("{} was not captured", stream));
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

        let (tx, rx) = mpsc::channel();
        pump(stdout, tx.clone());
        pump(stderr, tx);

        log::debug!("spawned {} (pid {})", command.join(" "), child.id());

        Ok(Self {
            child,
            stdin,
            output: rx,
            buffer: Vec::new(),
            program: program.clone(),
        })
    }

    /// Program name, for reporting.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Wait for `marker`; return the text before it and consume the marker.
    pub fn expect(&mut self, marker: &str, timeout: Duration) -> ConformanceResult<String> {
        let needle = marker.as_bytes();
        self.read_until(&format!("{:?}", marker), timeout, |buf| {
            find_bytes(buf, needle).map(|pos| (pos, needle.len()))
        })
    }

    /// Wait for the next blank-line terminated response block.
    pub fn read_response(&mut self, timeout: Duration) -> ConformanceResult<String> {
        self.read_until("the end of a response block", timeout, find_terminator)
    }

    /// Send one request line.
    pub fn send_line(&mut self, line: &str) -> ConformanceResult<()> {
        log::trace!(">> {}", line);
        let written = writeln!(self.stdin, "{}", line).and_then(|_| self.stdin.flush());
        if let Err(e) = written {
            return Err(ConformanceError::protocol(
                format!("could not write request: {}", e),
                self.take_pending(),
            ));
        }
        Ok(())
    }

    /// Drain whatever has been received but not yet matched.
    pub fn take_pending(&mut self) -> String {
        while let Ok(chunk) = self.output.try_recv() {
            self.buffer.extend_from_slice(&chunk);
        }
        let raw = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        raw
    }

    fn read_until<F>(&mut self, what: &str, timeout: Duration, find: F) -> ConformanceResult<String>
    where
        F: Fn(&[u8]) -> Option<(usize, usize)>,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some((pos, len)) = find(&self.buffer) {
                let before = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
                self.buffer.drain(..pos + len);
                log::trace!("<< {:?}", before);
                return Ok(before);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.output.recv_timeout(remaining) {
                Ok(chunk) => self.buffer.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(ConformanceError::protocol(
                        format!("timed out after {:?} waiting for {}", timeout, what),
                        self.take_pending(),
                    ));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    let status = match self.child.try_wait() {
                        Ok(Some(status)) => format!(" ({})", status),
                        _ => String::new(),
                    };
                    return Err(ConformanceError::protocol(
                        format!("{} exited while waiting for {}{}", self.program, what, status),
                        self.take_pending(),
                    ));
                }
            }
        }
    }
}

impl Drop for ReplSession {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
