//! Channel destinations.
//!
//! The backend routes by destination path. A session uses exactly three:
//!
//! - `/user/{id}/queue/messages`: private inbound queue for one user
//! - `/user/public`: broadcast inbound topic shared by every session
//! - `/app/chat`: application send endpoint for outbound messages

use std::fmt;

use crate::UserId;

/// Broadcast destination every session subscribes to.
pub const BROADCAST: &str = "/user/public";

/// Application destination outbound chat messages are published to.
pub const SEND: &str = "/app/chat";

/// A channel destination path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(String);

impl Topic {
    /// Wrap an arbitrary destination path.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Private inbound queue scoped to `user_id`.
    pub fn private_queue(user_id: UserId) -> Self {
        Self(format!("/user/{user_id}/queue/messages"))
    }

    /// Shared broadcast topic.
    pub fn broadcast() -> Self {
        Self(BROADCAST.to_string())
    }

    /// Outbound send destination.
    pub fn send() -> Self {
        Self(SEND.to_string())
    }

    /// Destination path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the private queue of `user_id`.
    pub fn is_private_queue_of(&self, user_id: UserId) -> bool {
        *self == Self::private_queue(user_id)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}
