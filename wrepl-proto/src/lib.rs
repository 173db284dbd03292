//! Wire protocol for the MicroPython WebREPL remote-access service.
//!
//! Payloads travel in minimal two-type (text/binary) length-prefixed frames;
//! file operations are driven by fixed-layout request/response records
//! carried inside those frames. Only the subset the device-side service
//! actually speaks is implemented — masking, ping/pong, close handshakes,
//! fragmentation, and 64-bit lengths are out of scope.
//!
//! This crate is pure data handling: no sockets, no async. The stream
//! plumbing lives in the `wrepl` client crate.

mod error;
mod frame;
mod record;

pub use error::Error;
pub use frame::{Decoder, FrameKind, MAX_PAYLOAD, encode_header};
pub use record::{NAME_CAP, Op, REQUEST_LEN, RESPONSE_LEN, Request, Response};
