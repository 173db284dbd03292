//! Buffered frame reader/writer over async byte streams.
//!
//! The reader pairs a [`Decoder`] with a served-payload buffer: a read first
//! drains bytes left over from an earlier frame and only then decodes new
//! ones, consuming any frame of a kind the caller is not expecting. Every
//! await in here is a single raw stream read, so these futures are safe to
//! drop from `select!` or `timeout` without losing wire bytes.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;
use wrepl_proto::{Decoder, FrameKind, encode_header};

use crate::{Error, Result};

/// Stream read chunk size feeding the decoder.
const READ_CHUNK: usize = 4096;

/// Frame-reassembling read half.
#[derive(Debug)]
pub struct FrameReader<R> {
    /// Raw stream source.
    src: R,
    /// Incremental frame state machine.
    dec: Decoder,
    /// Payload bytes decoded but not yet handed to the caller.
    buf: Vec<u8>,
    /// Skip count already reported through `debug!`.
    skips_seen: u64,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wraps a raw reader half.
    pub fn new(src: R) -> Self {
        Self {
            src,
            dec: Decoder::new(),
            buf: Vec::new(),
            skips_seen: 0,
        }
    }

    /// Returns exactly `size` bytes of frame payload.
    ///
    /// Buffered bytes from an earlier frame are served first; otherwise the
    /// next accepted frame is decoded into the buffer and the remainder is
    /// retained for the following call. A frame that delivers fewer bytes
    /// than requested is a protocol error, as is a stream that ends inside
    /// a started frame.
    pub async fn read(&mut self, size: usize, text_ok: bool) -> Result<Vec<u8>> {
        self.refill(text_ok).await?;
        if self.buf.len() < size {
            return Err(Error::Protocol(format!(
                "requested {size} bytes, frame delivered {}",
                self.buf.len()
            )));
        }
        let rest = self.buf.split_off(size);
        Ok(std::mem::replace(&mut self.buf, rest))
    }

    /// Returns one frame-aware byte.
    pub async fn read_byte(&mut self, text_ok: bool) -> Result<u8> {
        Ok(self.read(1, text_ok).await?[0])
    }

    /// Waits for payload and drains everything currently buffered.
    ///
    /// The interactive session uses this to flush a whole burst of remote
    /// output per wakeup instead of one byte at a time.
    pub async fn read_some(&mut self, text_ok: bool) -> Result<Vec<u8>> {
        self.refill(text_ok).await?;
        Ok(std::mem::take(&mut self.buf))
    }

    /// Decodes frames until the served buffer is non-empty.
    async fn refill(&mut self, text_ok: bool) -> Result<()> {
        // Zero-length frames leave the buffer empty and the loop running.
        while self.buf.is_empty() {
            let decoded = self.dec.next_frame(text_ok);
            self.note_skips();
            match decoded {
                Some(payload) => self.buf = payload,
                None => self.fill().await?,
            }
        }
        Ok(())
    }

    /// One raw stream read into the decoder.
    async fn fill(&mut self) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = self.src.read(&mut chunk).await?;
        if n == 0 {
            return Err(if self.dec.pending() {
                Error::Protocol("stream closed inside a frame".into())
            } else {
                Error::Closed
            });
        }
        self.dec.feed(&chunk[..n]);
        Ok(())
    }

    /// Reports frames the decoder consumed without surfacing.
    fn note_skips(&mut self) {
        let total = self.dec.skipped();
        if total > self.skips_seen {
            debug!(count = total - self.skips_seen, "skipped unexpected frames");
            self.skips_seen = total;
        }
    }
}

/// Frame-encoding write half.
#[derive(Debug)]
pub struct FrameWriter<W> {
    /// Raw stream sink.
    dst: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Wraps a raw writer half.
    pub fn new(dst: W) -> Self {
        Self { dst }
    }

    /// Unwraps the underlying sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.dst
    }

    /// Sends one frame: header write, payload write, flush.
    pub async fn write_frame(&mut self, kind: FrameKind, payload: &[u8]) -> Result<()> {
        let header = encode_header(kind, payload.len())?;
        self.dst.write_all(&header).await?;
        self.dst.write_all(payload).await?;
        self.dst.flush().await?;
        Ok(())
    }
}
