//! Client errors.

use parley_proto::{FrameError, PayloadError};
use thiserror::Error;

/// Channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// WebSocket connect, read or write failed.
    #[error("websocket error: {0}")]
    Transport(String),

    /// The broker answered with an ERROR frame.
    #[error("broker error: {0}")]
    Broker(String),

    /// The broker sent something that is not STOMP.
    #[error("protocol error: {0}")]
    Protocol(#[from] FrameError),

    /// The channel task has stopped.
    #[error("channel closed")]
    Closed,
}

impl From<tokio_tungstenite::tungstenite::Error> for ChannelError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

/// Directory errors.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The directory answered with an unexpected status.
    #[error("unexpected status {status} from {path}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request path.
        path: String,
    },

    /// The response body was not the expected JSON.
    #[error("malformed response: {0}")]
    Payload(#[from] PayloadError),
}
