//! Fire-and-capture code execution.
//!
//! The protocol has no "execution finished" signal, so a sentinel marker is
//! appended to the code and capture stops once the marker shows up in the
//! output stream. The marker is not guaranteed unique against the program's
//! own output — a genuine print of the same string truncates the capture
//! early. That weakness is inherent to the technique and deliberately kept.

use std::pin::pin;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{Instant, timeout};
use tracing::debug;
use wrepl_proto::FrameKind;

use crate::Result;
use crate::session::Session;

/// Marker appended to executed code; its appearance in the output stream
/// means the remote finished running the fragment.
pub const DONE_MARKER: &str = "<<<WEBREPL_DONE>>>";

/// Timing knobs for the capture loop.
#[derive(Debug, Clone, Copy)]
pub struct ExecOpts {
    /// Per-iteration wait for more output before giving up.
    pub idle: Duration,
    /// Hard bound on the whole capture regardless of idle resets.
    pub cap: Duration,
}

impl Default for ExecOpts {
    fn default() -> Self {
        Self {
            idle: Duration::from_millis(400),
            cap: Duration::from_secs(30),
        }
    }
}

/// How an execution capture ended.
#[derive(Debug, PartialEq, Eq)]
pub enum ExecOutcome {
    /// The code asked for a device reset. It was sent without waiting for
    /// any reply, since the remote is expected to drop the connection.
    Reset,
    /// The marker appeared; the output is everything strictly before its
    /// first occurrence.
    Completed(Vec<u8>),
    /// Idle timeout, hard cap, or interrupt ended the wait. The output is
    /// a best-effort capture, not a failure signal.
    TimedOut(Vec<u8>),
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Sends `code` for execution and captures output until the sentinel
    /// marker appears or time runs out.
    pub async fn exec(&mut self, code: &str, opts: ExecOpts) -> Result<ExecOutcome> {
        if code.contains("machine.reset") {
            let mut line = code.as_bytes().to_vec();
            line.push(b'\r');
            self.writer.write_frame(FrameKind::Text, &line).await?;
            return Ok(ExecOutcome::Reset);
        }

        let payload = format!("{code}\rprint({DONE_MARKER:?})\r");
        self.writer
            .write_frame(FrameKind::Text, payload.as_bytes())
            .await?;

        let marker = DONE_MARKER.as_bytes();
        let deadline = Instant::now() + opts.cap;
        let mut captured = Vec::new();
        let mut interrupt = pin!(tokio::signal::ctrl_c());

        loop {
            let byte = tokio::select! {
                _ = &mut interrupt => break,
                next = timeout(opts.idle, self.reader.read_byte(true)) => match next {
                    Ok(Ok(b)) => b,
                    // An idle timeout and a read failure both end the
                    // capture with whatever accumulated so far.
                    Ok(Err(_)) | Err(_) => break,
                },
            };
            captured.push(byte);
            if let Some(at) = find(&captured, marker) {
                captured.truncate(at);
                return Ok(ExecOutcome::Completed(captured));
            }
            if Instant::now() >= deadline {
                debug!(len = captured.len(), "capture cap reached");
                break;
            }
        }
        Ok(ExecOutcome::TimedOut(captured))
    }
}

/// First occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_reports_first_occurrence() {
        assert_eq!(find(b"aXbXc", b"X"), Some(1));
        assert_eq!(find(b"hello DONE tail DONE", b"DONE"), Some(6));
        assert_eq!(find(b"nothing here", b"DONE"), None);
        assert_eq!(find(b"DO", b"DONE"), None);
    }
}
