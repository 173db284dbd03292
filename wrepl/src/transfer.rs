//! Chunked file upload and download over the frame layer.
//!
//! Neither direction exchanges a checksum: correctness rests entirely on
//! the two status records bracketing the data, and the byte counters exist
//! for progress display only.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;
use wrepl_proto::{FrameKind, Op};

use crate::session::Session;
use crate::{Error, Result};

/// Upload chunk size in bytes.
const CHUNK_SIZE: usize = 1024;

/// Wraps a local filesystem error with its path.
fn fs_err(path: &Path, source: std::io::Error) -> Error {
    Error::Local {
        path: path.to_owned(),
        source,
    }
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Uploads a local file to `remote`.
    ///
    /// `progress` observes `(bytes_sent, total)` around every chunk. Fails
    /// with [`Error::Rejected`] if the remote refuses the request and
    /// [`Error::Incomplete`] if it reports a nonzero status once the data
    /// has been sent. Returns the number of bytes moved.
    pub async fn put_file(
        &mut self,
        local: &Path,
        remote: &str,
        mut progress: impl FnMut(u64, u64),
    ) -> Result<u64> {
        let mut file = File::open(local).await.map_err(|e| fs_err(local, e))?;
        let total = file
            .metadata()
            .await
            .map_err(|e| fs_err(local, e))?
            .len();
        let size = u32::try_from(total).map_err(|_| {
            Error::Protocol(format!("{total} byte file exceeds the 32-bit size field"))
        })?;

        self.send_request(Op::Put, size, remote).await?;
        match self.read_response().await? {
            0 => {}
            status => return Err(Error::Rejected { op: Op::Put, status }),
        }

        let mut chunk = vec![0u8; CHUNK_SIZE];
        let mut sent = 0u64;
        loop {
            progress(sent, total);
            let n = file.read(&mut chunk).await.map_err(|e| fs_err(local, e))?;
            if n == 0 {
                break;
            }
            self.writer
                .write_frame(FrameKind::Binary, &chunk[..n])
                .await?;
            sent += n as u64;
        }

        match self.read_response().await? {
            0 => {}
            status => return Err(Error::Incomplete { op: Op::Put, status }),
        }
        debug!(sent, remote, "upload complete");
        Ok(sent)
    }

    /// Downloads `remote` into a local file.
    ///
    /// Each chunk is pulled with a single zero byte, announced by a 2-byte
    /// little-endian length, and read in full; a zero length ends the
    /// stream. On a mid-transfer failure the partial local file is left on
    /// disk. Returns the number of bytes moved.
    pub async fn get_file(
        &mut self,
        remote: &str,
        local: &Path,
        mut progress: impl FnMut(u64),
    ) -> Result<u64> {
        self.send_request(Op::Get, 0, remote).await?;
        match self.read_response().await? {
            0 => {}
            status => return Err(Error::Rejected { op: Op::Get, status }),
        }

        let mut file = File::create(local).await.map_err(|e| fs_err(local, e))?;
        let mut received = 0u64;
        loop {
            self.writer.write_frame(FrameKind::Binary, &[0]).await?;
            let header = self.reader.read(2, false).await?;
            let len = usize::from(u16::from_le_bytes([header[0], header[1]]));
            if len == 0 {
                break;
            }
            let data = self.reader.read(len, false).await?;
            file.write_all(&data).await.map_err(|e| fs_err(local, e))?;
            received += data.len() as u64;
            progress(received);
        }
        file.flush().await.map_err(|e| fs_err(local, e))?;

        match self.read_response().await? {
            0 => {}
            status => return Err(Error::Incomplete { op: Op::Get, status }),
        }
        debug!(received, remote, "download complete");
        Ok(received)
    }
}
