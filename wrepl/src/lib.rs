//! Client for the MicroPython WebREPL remote-access protocol.
//!
//! One TCP connection per invocation: a throwaway HTTP-upgrade greeting and
//! a password login, then exactly one of the interactive REPL, a file
//! transfer, or a code-execution capture before the connection closes.
//!
//! Framing and record layouts live in [`wrepl_proto`]; this crate owns the
//! stream handling — the buffered frame reader/writer, the transfer loops,
//! and the terminal-facing session code.
//!
//! # Quick start — upload a file
//!
//! ```no_run
//! # async fn demo() -> wrepl::Result<()> {
//! let mut session = wrepl::connect("192.168.4.1", wrepl::DEFAULT_PORT).await?;
//! session.login("secret").await?;
//! session
//!     .put_file("app.py".as_ref(), "/app.py", |sent, total| {
//!         eprint!("\r{sent}/{total}");
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod conn;
mod error;
mod exec;
mod frames;
#[cfg(unix)]
pub mod repl;
mod session;
#[cfg(unix)]
pub mod term;
mod transfer;

pub use conn::{Connection, DEFAULT_PORT, connect};
pub use error::{Error, Result};
pub use exec::{DONE_MARKER, ExecOpts, ExecOutcome};
pub use frames::{FrameReader, FrameWriter};
pub use session::Session;
