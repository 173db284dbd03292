//! Connection establishment: TCP connect, upgrade greeting, stream split.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::debug;

use crate::session::Session;
use crate::{Error, Result};

/// Default TCP port of the device-side service.
pub const DEFAULT_PORT: u16 = 8266;

/// Fixed key sent in the upgrade greeting. The device never validates it;
/// real key negotiation belongs to the full WebSocket handshake, which this
/// protocol subset does not implement.
const UPGRADE_KEY: &str = "wrepl";

/// A protocol session over a live TCP connection.
///
/// The socket closes when the session is dropped, on every exit path.
pub type Connection = Session<OwnedReadHalf, OwnedWriteHalf>;

/// Opens a TCP connection and performs the upgrade greeting.
///
/// The caller is expected to run [`Session::login`] next.
pub async fn connect(host: &str, port: u16) -> Result<Connection> {
    let mut stream = TcpStream::connect((host, port))
        .await
        .map_err(|source| Error::Connect {
            host: host.to_owned(),
            port,
            source,
        })?;
    greet(&mut stream, host, port).await?;
    let (read, write) = stream.into_split();
    Ok(Session::new(read, write))
}

/// Sends the throwaway HTTP-upgrade greeting and discards the reply headers.
///
/// Reply lines are consumed with single-byte reads so no frame bytes get
/// swallowed, and none of them are validated — a malformed peer leads to
/// undefined reads downstream, which this protocol subset accepts as a
/// known risk.
async fn greet<S>(stream: &mut S, host: &str, port: u16) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let greeting = format!(
        "GET / HTTP/1.1\r\n\
         Host: {host}:{port}\r\n\
         Connection: Upgrade\r\n\
         Upgrade: websocket\r\n\
         Sec-WebSocket-Key: {UPGRADE_KEY}\r\n\
         \r\n"
    );
    stream.write_all(greeting.as_bytes()).await?;
    stream.flush().await?;

    let mut line = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        if stream.read(&mut byte).await? == 0 {
            return Err(Error::Closed);
        }
        line.push(byte[0]);
        if line.ends_with(b"\r\n") {
            if line.len() == 2 {
                return Ok(());
            }
            debug!(
                reply = %String::from_utf8_lossy(&line[..line.len() - 2]),
                "greeting header"
            );
            line.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn greeting_discards_headers_and_nothing_more() {
        let (mut client, mut peer) = duplex(4096);

        // Scripted reply: status line, one header, blank line, then a byte
        // that already belongs to the frame layer.
        peer.write_all(b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\n\r\n\x82")
            .await
            .unwrap();

        greet(&mut client, "10.0.0.9", 8266).await.unwrap();

        // The request reached the peer...
        let mut sent = vec![0u8; 1024];
        let n = peer.read(&mut sent).await.unwrap();
        let text = String::from_utf8(sent[..n].to_vec()).unwrap();
        assert!(text.starts_with("GET / HTTP/1.1\r\n"));
        assert!(text.contains("Host: 10.0.0.9:8266\r\n"));
        assert!(text.contains("Upgrade: websocket\r\n"));
        assert!(text.ends_with("\r\n\r\n"));

        // ...and the first frame byte is still unread.
        let mut leftover = [0u8; 1];
        client.read_exact(&mut leftover).await.unwrap();
        assert_eq!(leftover, [0x82]);
    }

    #[tokio::test]
    async fn peer_hangup_during_greeting_reports_closed() {
        let (mut client, mut peer) = duplex(4096);
        peer.write_all(b"HTTP/1.1 101\r\n").await.unwrap();
        // Close the reply direction; the peer stays alive so the client's
        // own request bytes still have somewhere to go.
        peer.shutdown().await.unwrap();

        assert!(matches!(
            greet(&mut client, "h", 8266).await,
            Err(Error::Closed)
        ));
    }
}
