//! Error types for client operations.
//!
//! Two of the conditions the protocol distinguishes are deliberately not
//! errors: an elapsed idle timeout in the execution channel yields a
//! best-effort [`crate::ExecOutcome::TimedOut`], and the escape keystroke is
//! the interactive session's ordinary way out. Everything here is fatal to
//! the invocation; nothing retries internally.

use std::path::PathBuf;

use wrepl_proto::Op;

/// Alias for `Result<T, wrepl::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by a client session.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// TCP connection could not be established.
    #[error("connect {host}:{port}: {source}")]
    Connect {
        /// Target host name or address.
        host: String,
        /// Target TCP port.
        port: u16,
        /// Underlying socket error.
        source: std::io::Error,
    },

    /// The remote closed the connection between frames.
    #[error("remote closed the connection")]
    Closed,

    /// Malformed wire data: bad signature, oversize payload, overlong name.
    #[error(transparent)]
    Wire(#[from] wrepl_proto::Error),

    /// Stream-level protocol violation: truncated frame, short payload,
    /// broken login prompt.
    #[error("protocol: {0}")]
    Protocol(String),

    /// The remote refused a file-operation request up front.
    #[error("{op} request rejected by remote (status {status})")]
    Rejected {
        /// Operation that was refused.
        op: Op,
        /// Opaque nonzero status from the response record.
        status: u16,
    },

    /// The remote reported failure after the data had been moved.
    #[error("{op} failed after transfer (status {status})")]
    Incomplete {
        /// Operation that failed.
        op: Op,
        /// Opaque nonzero status from the response record.
        status: u16,
    },

    /// A local file could not be read or written.
    #[error("{}: {source}", .path.display())]
    Local {
        /// Path of the offending local file.
        path: PathBuf,
        /// Underlying filesystem error.
        source: std::io::Error,
    },

    /// An I/O error on the socket or the terminal.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
