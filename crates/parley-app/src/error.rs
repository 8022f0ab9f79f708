//! Session error types.

use thiserror::Error;

/// Why bootstrap did not produce a connected channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// The directory has no user with these credentials.
    #[error("no user named {name} {surname}")]
    IdentityNotFound {
        /// Given name that was looked up.
        name: String,
        /// Family name that was looked up.
        surname: String,
    },

    /// The directory could not be reached or answered garbage.
    #[error("directory lookup failed: {0}")]
    Directory(String),

    /// The real-time channel could not be established.
    #[error("could not connect to the chat server: {0}")]
    Channel(String),
}

impl ConnectError {
    /// Whether the user should re-enter credentials.
    pub fn is_identity_not_found(&self) -> bool {
        matches!(self, Self::IdentityNotFound { .. })
    }
}

/// Which directory fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Full user list.
    Roster,
    /// Conversation history.
    History,
}

/// A directory fetch failed after bootstrap.
///
/// Never fatal: a failed roster fetch yields an empty roster and a failed
/// history fetch yields an empty transcript.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind:?} fetch failed: {reason}")]
pub struct FetchError {
    /// Which fetch.
    pub kind: FetchKind,
    /// Underlying cause, already rendered.
    pub reason: String,
}

impl FetchError {
    /// Roster fetch failure.
    pub fn roster(reason: impl Into<String>) -> Self {
        Self { kind: FetchKind::Roster, reason: reason.into() }
    }

    /// History fetch failure.
    pub fn history(reason: impl Into<String>) -> Self {
        Self { kind: FetchKind::History, reason: reason.into() }
    }
}
