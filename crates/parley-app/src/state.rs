//! Session state types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use parley_proto::{ChatPayload, UserId};

/// The logged-in user's identity.
///
/// Set once when the directory resolves the bootstrap credentials, never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
    surname: String,
    assigned_id: UserId,
}

impl Identity {
    /// Create an identity.
    pub fn new(name: impl Into<String>, surname: impl Into<String>, assigned_id: UserId) -> Self {
        Self { name: name.into(), surname: surname.into(), assigned_id }
    }

    /// Given name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Family name.
    pub fn surname(&self) -> &str {
        &self.surname
    }

    /// Id assigned by the directory.
    pub fn assigned_id(&self) -> UserId {
        self.assigned_id
    }

    /// `name surname`, trimmed.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_string()
    }
}

/// Lifecycle of the real-time channel.
///
/// Transitions only move forward: `Disconnected -> Connecting`, then
/// `Connecting -> Connected` or `Connecting -> Failed`. A channel lost after
/// connecting is reported through the status line; the status itself stays
/// `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelStatus {
    /// No connection attempted yet.
    #[default]
    Disconnected,
    /// Handshake or subscriptions in flight.
    Connecting,
    /// Channel established and both subscriptions confirmed.
    Connected,
    /// Connection attempt failed. Terminal.
    Failed,
}

impl ChannelStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Disconnected, Self::Connecting)
                | (Self::Connecting, Self::Connected | Self::Failed)
        )
    }
}

/// Explicit session state. Lives for the whole client session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub(crate) identity: Option<Identity>,
    pub(crate) channel: ChannelStatus,
    pub(crate) selected_peer: Option<UserId>,
    pub(crate) unread: BTreeSet<UserId>,
}

impl SessionState {
    /// Resolved identity, once bootstrap found the user.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Current channel status.
    pub fn channel(&self) -> ChannelStatus {
        self.channel
    }

    /// Peer whose conversation is displayed. At most one.
    pub fn selected_peer(&self) -> Option<UserId> {
        self.selected_peer
    }

    /// Peers with messages that arrived while they were not selected.
    ///
    /// Survives roster refreshes; flags are reapplied to the fresh list.
    pub fn unread(&self) -> &BTreeSet<UserId> {
        &self.unread
    }
}

/// A chat message between two users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    sender_id: UserId,
    recipient_id: UserId,
    content: String,
    timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Create a message.
    pub fn new(
        sender_id: UserId,
        recipient_id: UserId,
        content: impl Into<String>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Self {
        Self { sender_id, recipient_id, content: content.into(), timestamp }
    }

    /// Author.
    pub fn sender_id(&self) -> UserId {
        self.sender_id
    }

    /// Recipient.
    pub fn recipient_id(&self) -> UserId {
        self.recipient_id
    }

    /// Text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Send time, if known.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Wire representation.
    pub fn to_payload(&self) -> ChatPayload {
        ChatPayload {
            sender_id: self.sender_id,
            recipient_id: self.recipient_id,
            content: self.content.clone(),
            timestamp: self.timestamp,
        }
    }
}

impl From<ChatPayload> for ChatMessage {
    fn from(payload: ChatPayload) -> Self {
        Self {
            sender_id: payload.sender_id,
            recipient_id: payload.recipient_id,
            content: payload.content,
            timestamp: payload.timestamp,
        }
    }
}

/// Severity of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Progress or confirmation.
    Info,
    /// Something the user should act on.
    Error,
}

/// Status text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Text to display.
    pub text: String,
    /// Severity.
    pub level: StatusLevel,
}

impl StatusLine {
    /// Informational status.
    pub fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), level: StatusLevel::Info }
    }

    /// Error status.
    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), level: StatusLevel::Error }
    }
}
