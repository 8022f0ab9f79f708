//! Error types for wire decoding.
//!
//! Frame errors describe STOMP framing problems (the text could not be split
//! into command, headers and body). Payload errors describe JSON bodies that
//! do not match the expected shape. Both are recoverable: callers drop the
//! offending input and keep going.

use thiserror::Error;

/// Convenience alias for frame decoding results.
pub type Result<T> = std::result::Result<T, FrameError>;

/// STOMP framing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Input ended before the header block was terminated.
    #[error("truncated frame")]
    Truncated,

    /// First line is not a STOMP command.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// Header line without a `:` separator.
    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),

    /// Header contains an escape sequence STOMP 1.2 does not define.
    #[error("invalid escape sequence in header: {0:?}")]
    InvalidEscape(String),

    /// `content-length` is not a byte count that fits the frame.
    #[error("invalid content-length: {0:?}")]
    InvalidContentLength(String),

    /// Body is not followed by the NUL terminator.
    #[error("frame body is not NUL-terminated")]
    MissingTerminator,
}

/// JSON payload errors.
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Body is not valid JSON or does not match the payload shape.
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
}
