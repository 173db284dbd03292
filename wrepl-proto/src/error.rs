//! Error type for wire-level encoding and parsing.

/// Errors produced while encoding or parsing protocol structures.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Frame payload too large for the 16-bit extended header form.
    #[error("frame payload of {0} bytes exceeds the protocol maximum")]
    PayloadTooLarge(usize),

    /// Encoded file name longer than the record's fixed name field.
    #[error("file name of {0} bytes exceeds the 64 byte record field")]
    NameTooLong(usize),

    /// Response bytes did not start with the expected signature.
    #[error("unexpected response signature {0:02x?}")]
    BadSignature([u8; 2]),

    /// Response shorter than the fixed record layout.
    #[error("response record truncated: {0} of 4 bytes")]
    ShortResponse(usize),
}
