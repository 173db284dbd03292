//! Minimal two-type length-prefixed frame codec.
//!
//! A frame is `[kind, len]` for payloads under 126 bytes, or
//! `[kind, 126, len_hi, len_lo]` (big-endian 16-bit length) up to 65535
//! bytes. The only kinds on the wire are text (`0x81`) and binary (`0x82`).

use crate::Error;

/// Largest payload the extended header form can carry.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Length-field value announcing the extended header form.
const EXTENDED: u8 = 126;

/// Frame type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    /// UTF-8 text frame (REPL traffic, password exchange).
    Text = 0x81,
    /// Binary frame (records, file data).
    Binary = 0x82,
}

impl FrameKind {
    /// Wire tag byte for this kind.
    #[must_use]
    pub const fn byte(self) -> u8 {
        self as u8
    }
}

/// Encodes a frame header for a payload of `len` bytes.
///
/// The short two-byte form is used for `len < 126`, the four-byte extended
/// form otherwise. Payloads past [`MAX_PAYLOAD`] are unsupported by this
/// protocol subset.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_header(kind: FrameKind, len: usize) -> Result<Vec<u8>, Error> {
    if len > MAX_PAYLOAD {
        return Err(Error::PayloadTooLarge(len));
    }
    if len < usize::from(EXTENDED) {
        Ok(vec![kind.byte(), len as u8])
    } else {
        let ext = (len as u16).to_be_bytes();
        Ok(vec![kind.byte(), EXTENDED, ext[0], ext[1]])
    }
}

/// Decode progress for the frame reassembly state machine.
#[derive(Debug)]
enum State {
    /// Waiting for the two-byte header.
    AwaitingHeader,
    /// Short length was 126; waiting for the big-endian extended length.
    AwaitingExtended {
        /// Kind byte already taken from the header.
        kind: u8,
    },
    /// Collecting an accepted frame's payload.
    Payload {
        /// Declared payload length.
        want: usize,
        /// Bytes collected so far.
        have: Vec<u8>,
    },
    /// Consuming a frame of a kind the caller is not expecting.
    Skipping {
        /// Payload bytes still to discard.
        left: usize,
    },
}

/// Incremental frame decoder.
///
/// Raw stream bytes go in through [`Decoder::feed`]; complete payloads of
/// accepted kinds come out of [`Decoder::next_frame`]. Frames of unexpected
/// kinds are consumed in full and dropped without surfacing. Partial
/// progress is kept between calls, so input may arrive in arbitrary slices.
#[derive(Debug)]
pub struct Decoder {
    /// Raw bytes not yet consumed by the state machine.
    rx: Vec<u8>,
    /// Consumed prefix of `rx`.
    pos: usize,
    /// Current decode state.
    state: State,
    /// Frames consumed without surfacing since construction.
    skipped: u64,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Creates an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rx: Vec::new(),
            pos: 0,
            state: State::AwaitingHeader,
            skipped: 0,
        }
    }

    /// Appends raw stream bytes for decoding.
    pub fn feed(&mut self, bytes: &[u8]) {
        if self.pos == self.rx.len() {
            self.rx.clear();
            self.pos = 0;
        }
        self.rx.extend_from_slice(bytes);
    }

    /// True when a frame is partially decoded or undecoded bytes remain.
    ///
    /// Lets the stream layer tell a truncated frame apart from a clean
    /// close when it hits end of stream.
    #[must_use]
    pub fn pending(&self) -> bool {
        self.pos < self.rx.len() || !matches!(self.state, State::AwaitingHeader)
    }

    /// Frames consumed without surfacing since construction.
    #[must_use]
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Advances the state machine and returns the next accepted payload.
    ///
    /// `text_ok` widens acceptance to text frames; binary frames are always
    /// accepted. Returns `None` when more input is needed.
    pub fn next_frame(&mut self, text_ok: bool) -> Option<Vec<u8>> {
        loop {
            match self.state {
                State::AwaitingHeader => {
                    if self.rx.len() - self.pos < 2 {
                        return None;
                    }
                    let kind = self.rx[self.pos];
                    let short = self.rx[self.pos + 1];
                    self.pos += 2;
                    if short == EXTENDED {
                        self.state = State::AwaitingExtended { kind };
                    } else {
                        self.accept(kind, usize::from(short), text_ok);
                    }
                }
                State::AwaitingExtended { kind } => {
                    if self.rx.len() - self.pos < 2 {
                        return None;
                    }
                    let len = u16::from_be_bytes([self.rx[self.pos], self.rx[self.pos + 1]]);
                    self.pos += 2;
                    self.accept(kind, usize::from(len), text_ok);
                }
                State::Payload { want, ref mut have } => {
                    let take = (want - have.len()).min(self.rx.len() - self.pos);
                    have.extend_from_slice(&self.rx[self.pos..self.pos + take]);
                    self.pos += take;
                    if have.len() < want {
                        return None;
                    }
                    let payload = std::mem::take(have);
                    self.state = State::AwaitingHeader;
                    return Some(payload);
                }
                State::Skipping { left } => {
                    let take = left.min(self.rx.len() - self.pos);
                    self.pos += take;
                    if take < left {
                        self.state = State::Skipping { left: left - take };
                        return None;
                    }
                    self.skipped += 1;
                    self.state = State::AwaitingHeader;
                }
            }
        }
    }

    /// Decides whether the frame whose header just completed is surfaced
    /// or consumed.
    fn accept(&mut self, kind: u8, len: usize, text_ok: bool) {
        let wanted =
            kind == FrameKind::Binary.byte() || (text_ok && kind == FrameKind::Text.byte());
        self.state = if wanted {
            State::Payload {
                want: len,
                have: Vec::with_capacity(len),
            }
        } else {
            State::Skipping { left: len }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(kind: FrameKind, payload: &[u8]) -> Vec<u8> {
        let mut f = encode_header(kind, payload.len()).unwrap();
        f.extend_from_slice(payload);
        f
    }

    #[test]
    fn short_header_up_to_125_bytes() {
        let hdr = encode_header(FrameKind::Binary, 125).unwrap();
        assert_eq!(hdr, vec![0x82, 125]);
    }

    #[test]
    fn extended_header_from_126_bytes() {
        let hdr = encode_header(FrameKind::Binary, 126).unwrap();
        assert_eq!(hdr, vec![0x82, 126, 0, 126]);

        let max = encode_header(FrameKind::Text, MAX_PAYLOAD).unwrap();
        assert_eq!(max, vec![0x81, 126, 0xff, 0xff]);
    }

    #[test]
    fn oversize_payload_is_rejected() {
        assert!(matches!(
            encode_header(FrameKind::Binary, MAX_PAYLOAD + 1),
            Err(Error::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn decodes_both_header_forms() {
        for len in [125usize, 126] {
            let payload: Vec<u8> = (0..len).map(|i| (i % 256) as u8).collect();
            let mut dec = Decoder::new();
            dec.feed(&frame(FrameKind::Binary, &payload));
            assert_eq!(dec.next_frame(false), Some(payload));
            assert!(!dec.pending());
        }
    }

    #[test]
    fn decodes_input_split_at_every_point() {
        let payload: Vec<u8> = (0..200).map(|i| (i % 256) as u8).collect();
        let wire = frame(FrameKind::Binary, &payload);

        let mut dec = Decoder::new();
        let mut got = None;
        for byte in &wire {
            assert!(got.is_none());
            dec.feed(std::slice::from_ref(byte));
            got = dec.next_frame(false);
        }
        assert_eq!(got, Some(payload));
    }

    #[test]
    fn skips_unexpected_kind_and_returns_next_match() {
        let mut wire = frame(FrameKind::Text, b"not for you");
        wire.extend_from_slice(&frame(FrameKind::Binary, b"payload"));

        let mut dec = Decoder::new();
        dec.feed(&wire);
        assert_eq!(dec.next_frame(false), Some(b"payload".to_vec()));
        assert_eq!(dec.skipped(), 1);
        assert!(!dec.pending());
    }

    #[test]
    fn text_frames_accepted_when_tolerated() {
        let mut dec = Decoder::new();
        dec.feed(&frame(FrameKind::Text, b"Password: "));
        assert_eq!(dec.next_frame(true), Some(b"Password: ".to_vec()));
        assert_eq!(dec.skipped(), 0);
    }

    #[test]
    fn unknown_kind_is_always_skipped() {
        let mut wire = vec![0x89, 3, 1, 2, 3];
        wire.extend_from_slice(&frame(FrameKind::Binary, b"ok"));

        let mut dec = Decoder::new();
        dec.feed(&wire);
        assert_eq!(dec.next_frame(true), Some(b"ok".to_vec()));
        assert_eq!(dec.skipped(), 1);
    }

    #[test]
    fn pending_reflects_partial_frames() {
        let mut dec = Decoder::new();
        assert!(!dec.pending());

        dec.feed(&[0x82]);
        assert!(dec.pending());
        assert_eq!(dec.next_frame(false), None);

        dec.feed(&[2, b'h']);
        assert_eq!(dec.next_frame(false), None);
        assert!(dec.pending());

        dec.feed(&[b'i']);
        assert_eq!(dec.next_frame(false), Some(b"hi".to_vec()));
        assert!(!dec.pending());
    }

    #[test]
    fn empty_frames_carry_no_payload() {
        let mut dec = Decoder::new();
        dec.feed(&frame(FrameKind::Binary, b""));
        assert_eq!(dec.next_frame(false), Some(Vec::new()));
        assert!(!dec.pending());
    }
}
