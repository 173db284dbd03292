//! Interactive terminal session over the frame layer.

use std::io::Write;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::debug;
use wrepl_proto::FrameKind;

use crate::session::Session;
use crate::term::TermGuard;
use crate::Result;

/// Keystroke that ends the session (ctrl-]).
pub const EXIT_KEY: u8 = 0x1d;

/// Runs the interactive loop until the exit keystroke.
///
/// The terminal sits in raw mode for the duration and is restored on every
/// exit path. Keystrokes are forwarded unbuffered as one-byte text frames so
/// the remote can echo character by character; remote bytes outside the safe
/// set render as bracketed hex so stray control bytes cannot corrupt the
/// display. The exit keystroke and a connection failure are the only ways
/// out — there is no timeout.
pub async fn run<R, W>(session: Session<R, W>) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = session.into_parts();
    let _raw = TermGuard::raw()?;
    let mut stdin = tokio::io::stdin();
    let mut stdout = std::io::stdout();
    let mut key = [0u8; 1];

    loop {
        tokio::select! {
            pressed = stdin.read(&mut key) => {
                if pressed? == 0 || key[0] == EXIT_KEY {
                    break;
                }
                writer.write_frame(FrameKind::Text, &key).await?;
            }
            output = reader.read_some(true) => {
                stdout.write_all(&render(&output?))?;
                stdout.flush()?;
            }
        }
    }
    debug!("session closed by user");
    Ok(())
}

/// Bytes forwarded to the terminal untouched: backspace, tab, LF, CR, ESC,
/// and everything from space up.
const fn safe(byte: u8) -> bool {
    matches!(byte, 0x08 | b'\t' | b'\n' | b'\r' | 0x1b) || byte >= 0x20
}

/// Renders remote output, escaping unsafe control bytes as bracketed hex.
fn render(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        if safe(b) {
            out.push(b);
        } else {
            out.extend_from_slice(format!("[{b:02x}]").as_bytes());
        }
    }
    out
}
