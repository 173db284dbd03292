//! Sentinel-capture behavior of the code-execution channel.

use std::time::Duration;

use tokio::io::{self, AsyncReadExt, AsyncWriteExt, DuplexStream};
use wrepl::{DONE_MARKER, ExecOpts, ExecOutcome, Session};
use wrepl_proto::{FrameKind, encode_header};

fn frame(kind: FrameKind, payload: &[u8]) -> Vec<u8> {
    let mut f = encode_header(kind, payload.len()).unwrap();
    f.extend_from_slice(payload);
    f
}

fn pipe() -> (
    Session<io::ReadHalf<DuplexStream>, io::WriteHalf<DuplexStream>>,
    DuplexStream,
) {
    let (client, device) = io::duplex(1 << 16);
    let (read, write) = io::split(client);
    (Session::new(read, write), device)
}

#[tokio::test(start_paused = true)]
async fn capture_stops_before_first_marker_occurrence() {
    let (mut session, mut device) = pipe();

    let reply = format!("hello\r\n{DONE_MARKER}late tail{DONE_MARKER}");
    device
        .write_all(&frame(FrameKind::Text, reply.as_bytes()))
        .await
        .unwrap();

    let outcome = session
        .exec("print('hello')", ExecOpts::default())
        .await
        .unwrap();
    assert_eq!(outcome, ExecOutcome::Completed(b"hello\r\n".to_vec()));
}

#[tokio::test(start_paused = true)]
async fn sent_payload_appends_marker_print() {
    let (mut session, mut device) = pipe();

    device
        .write_all(&frame(FrameKind::Text, DONE_MARKER.as_bytes()))
        .await
        .unwrap();
    session.exec("x = 1", ExecOpts::default()).await.unwrap();

    let expected = frame(
        FrameKind::Text,
        format!("x = 1\rprint({DONE_MARKER:?})\r").as_bytes(),
    );
    let mut sent = vec![0u8; expected.len()];
    device.read_exact(&mut sent).await.unwrap();
    assert_eq!(sent, expected);
}

#[tokio::test(start_paused = true)]
async fn idle_timeout_flushes_partial_output() {
    let (mut session, mut device) = pipe();

    device
        .write_all(&frame(FrameKind::Text, b"no marker here"))
        .await
        .unwrap();

    let outcome = session.exec("x = 1", ExecOpts::default()).await.unwrap();
    assert_eq!(outcome, ExecOutcome::TimedOut(b"no marker here".to_vec()));
}

#[tokio::test(start_paused = true)]
async fn silent_remote_still_returns() {
    let (mut session, _device) = pipe();

    let outcome = session.exec("x = 1", ExecOpts::default()).await.unwrap();
    assert_eq!(outcome, ExecOutcome::TimedOut(Vec::new()));
}

#[tokio::test(start_paused = true)]
async fn hard_cap_bounds_a_chatty_remote() {
    let (mut session, mut device) = pipe();

    device
        .write_all(&frame(FrameKind::Text, b"chatter without end"))
        .await
        .unwrap();

    // A zero cap stops the capture after the first byte even though the
    // peer keeps the data coming with no idle gaps.
    let opts = ExecOpts {
        idle: Duration::from_millis(400),
        cap: Duration::ZERO,
    };
    let outcome = session.exec("while True: pass", opts).await.unwrap();
    assert_eq!(outcome, ExecOutcome::TimedOut(b"c".to_vec()));
}

#[tokio::test(start_paused = true)]
async fn reset_code_is_sent_without_waiting() {
    let (mut session, mut device) = pipe();

    let outcome = session
        .exec("import machine; machine.reset()", ExecOpts::default())
        .await
        .unwrap();
    assert_eq!(outcome, ExecOutcome::Reset);

    let expected = frame(FrameKind::Text, b"import machine; machine.reset()\r");
    let mut sent = vec![0u8; expected.len()];
    device.read_exact(&mut sent).await.unwrap();
    assert_eq!(sent, expected);
}
