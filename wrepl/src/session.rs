//! Protocol session: login and the request/response exchanges.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;
use wrepl_proto::{FrameKind, Op, RESPONSE_LEN, Request, Response};

use crate::frames::{FrameReader, FrameWriter};
use crate::{Error, Result};

/// One protocol session over a reader/writer pair.
///
/// Exactly one of the REPL, a file transfer, or an execution capture is
/// expected to run per session; the underlying connection closes when the
/// session is dropped.
#[derive(Debug)]
pub struct Session<R, W> {
    /// Frame-reassembling read half.
    pub(crate) reader: FrameReader<R>,
    /// Frame-encoding write half.
    pub(crate) writer: FrameWriter<W>,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Builds a session from raw stream halves.
    pub fn new(read: R, write: W) -> Self {
        Self {
            reader: FrameReader::new(read),
            writer: FrameWriter::new(write),
        }
    }

    /// Splits the session back into its framing halves.
    ///
    /// The interactive loop drives the two halves from different `select!`
    /// branches.
    #[must_use]
    pub fn into_parts(self) -> (FrameReader<R>, FrameWriter<W>) {
        (self.reader, self.writer)
    }

    /// Performs the password exchange.
    ///
    /// Scans text-tolerant bytes for the `:` of the prompt, requires the
    /// byte after it to be a space, then sends `password + CR` as one text
    /// frame. No acknowledgement is read here — a wrong password only shows
    /// up through later exchanges.
    pub async fn login(&mut self, password: &str) -> Result<()> {
        while self.reader.read_byte(true).await? != b':' {}
        let after = self.reader.read_byte(true).await?;
        if after != b' ' {
            return Err(Error::Protocol(format!(
                "expected space after password prompt, got {after:#04x}"
            )));
        }

        let mut reply = Vec::with_capacity(password.len() + 1);
        reply.extend_from_slice(password.as_bytes());
        reply.push(b'\r');
        self.writer.write_frame(FrameKind::Text, &reply).await?;
        debug!("password sent");
        Ok(())
    }

    /// Sends a file-operation request record as one binary frame.
    pub(crate) async fn send_request(&mut self, op: Op, size: u32, name: &str) -> Result<()> {
        let record = Request { op, size, name }.encode()?;
        debug!(%op, size, name, "request");
        self.writer.write_frame(FrameKind::Binary, &record).await
    }

    /// Reads and parses one status response record.
    pub(crate) async fn read_response(&mut self) -> Result<u16> {
        let raw = self.reader.read(RESPONSE_LEN, false).await?;
        Ok(Response::parse(&raw)?.status)
    }

    /// Queries the remote service version.
    ///
    /// The reply is three raw framed bytes, not a status record — the one
    /// special case among the exchanges.
    pub async fn get_version(&mut self) -> Result<(u8, u8, u8)> {
        self.send_request(Op::GetVersion, 0, "").await?;
        let raw = self.reader.read(3, false).await?;
        Ok((raw[0], raw[1], raw[2]))
    }
}
