//! Session input events.
//!
//! Events originate from three sources:
//! - User interactions (peer selection, composer submission, exit).
//! - Directory responses, echoing the request token they answer.
//! - Channel notifications translated from the transport.

use chrono::{DateTime, Utc};
use parley_proto::{Topic, UserId, UserRecord};

use crate::{ChatMessage, DirectoryRequest, FetchError};

/// Events processed by the Session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user picked a roster entry.
    PeerSelected {
        /// Peer to select.
        peer_id: UserId,
    },

    /// The user submitted the composer.
    ComposerSubmitted {
        /// Raw composer text.
        content: String,
        /// Submission time.
        at: DateTime<Utc>,
    },

    /// The user asked to leave.
    TeardownRequested,

    /// Bootstrap credentials matched a directory user.
    IdentityResolved {
        /// Matching user.
        user: UserRecord,
    },

    /// Bootstrap credentials matched nobody.
    IdentityNotFound,

    /// Bootstrap lookup could not be completed.
    IdentityLookupFailed {
        /// Rendered cause.
        reason: String,
    },

    /// The channel handshake completed.
    ChannelConnected,

    /// The transport accepted a subscription requested by the session.
    Subscribed {
        /// Subscribed destination.
        topic: Topic,
    },

    /// The channel reported an error.
    ChannelError {
        /// Rendered cause.
        reason: String,
    },

    /// The channel closed.
    ChannelClosed,

    /// A message arrived on a subscribed topic.
    Inbound {
        /// Topic the message arrived on.
        destination: String,
        /// Raw JSON body.
        body: String,
    },

    /// A roster refresh completed.
    RosterLoaded {
        /// Refresh number from [`DirectoryRequest::ListUsers`].
        request: u64,
        /// Users in directory order.
        users: Vec<UserRecord>,
    },

    /// A roster refresh failed.
    RosterFailed {
        /// Refresh number from [`DirectoryRequest::ListUsers`].
        request: u64,
        /// Cause.
        error: FetchError,
    },

    /// A history load completed.
    HistoryLoaded {
        /// Generation from [`DirectoryRequest::Conversation`].
        generation: u64,
        /// Peer whose history this is.
        peer_id: UserId,
        /// Messages in backend order.
        messages: Vec<ChatMessage>,
    },

    /// A history load failed.
    HistoryFailed {
        /// Generation from [`DirectoryRequest::Conversation`].
        generation: u64,
        /// Cause.
        error: FetchError,
    },
}

impl SessionEvent {
    /// Failure event answering `request`.
    ///
    /// Used by drivers and the runtime when a request could not be
    /// completed, so every request gets exactly one response event.
    pub fn lookup_failed(request: &DirectoryRequest, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match request {
            DirectoryRequest::FindUser { .. } => Self::IdentityLookupFailed { reason },
            DirectoryRequest::ListUsers { request } => {
                Self::RosterFailed { request: *request, error: FetchError::roster(reason) }
            },
            DirectoryRequest::Conversation { generation, .. } => {
                Self::HistoryFailed { generation: *generation, error: FetchError::history(reason) }
            },
        }
    }
}
