//! Session side-effects and render instructions.
//!
//! This module defines the [`SessionAction`] enum, produced by the
//! [`crate::Session`] state machine for the runtime to execute, and the
//! [`RenderCommand`] set a render surface has to understand.

use parley_proto::{Topic, UserId};

use crate::{StatusLine, TranscriptEntry};

/// Actions produced by the Session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Issue a directory request. The result comes back as an event.
    Lookup(DirectoryRequest),

    /// Open the real-time channel.
    Connect {
        /// WebSocket endpoint.
        endpoint: String,
    },

    /// Subscribe to a channel topic.
    Subscribe {
        /// Topic to subscribe to.
        topic: Topic,
    },

    /// Publish a message body on a topic.
    Publish {
        /// Destination topic.
        topic: Topic,
        /// JSON message body.
        body: String,
    },

    /// Update the render surface.
    Render(RenderCommand),

    /// Tell the backend this user is leaving. Best effort.
    NotifyDisconnect,

    /// Stop the session.
    Quit,
}

/// Directory requests issued by the session.
///
/// Each request that can race with a newer one carries a token that the
/// matching response event echoes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryRequest {
    /// Resolve bootstrap credentials to a user.
    FindUser {
        /// Given name.
        name: String,
        /// Family name.
        surname: String,
    },

    /// Fetch the full user list.
    ListUsers {
        /// Monotonic refresh number.
        request: u64,
    },

    /// Fetch the conversation between two users.
    Conversation {
        /// Logged-in user.
        own_id: UserId,
        /// Selected peer.
        peer_id: UserId,
        /// Load generation. Responses for older generations are dropped.
        generation: u64,
    },
}

/// Instructions for a render surface.
///
/// The session never reads surface state back, so every command carries
/// what the surface needs to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCommand {
    /// Show a status line.
    ShowStatus(StatusLine),

    /// Make the message composer available.
    ShowComposer,

    /// Hide the message composer.
    HideComposer,

    /// Remove every roster entry.
    ClearRoster,

    /// Append a roster entry, unflagged.
    AppendRosterEntry {
        /// Peer id.
        peer_id: UserId,
        /// Name to display.
        display_name: String,
    },

    /// Toggle the unread indicator of a roster entry.
    SetUnread {
        /// Peer id.
        peer_id: UserId,
        /// Indicator state.
        unread: bool,
    },

    /// Toggle the selected state of a roster entry.
    SetSelected {
        /// Peer id.
        peer_id: UserId,
        /// Selected state.
        selected: bool,
    },

    /// Remove every transcript entry.
    ClearTranscript,

    /// Append a transcript entry.
    AppendTranscriptEntry(TranscriptEntry),

    /// Scroll the transcript to its newest entry.
    ScrollToNewest,
}
