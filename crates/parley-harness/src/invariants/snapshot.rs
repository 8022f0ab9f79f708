//! Observable state snapshots for invariant checking.

use parley_app::{Session, UserId};

use crate::SimSurface;

/// Snapshot of the session and, optionally, what the surface displays.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Session's selected peer.
    pub selected_peer: Option<UserId>,
    /// Session roster in order.
    pub peers: Vec<PeerSnapshot>,
    /// Surface roster in order. `None` when no surface is attached.
    pub displayed: Option<Vec<PeerSnapshot>>,
}

impl SessionSnapshot {
    /// Capture a session.
    pub fn from_session(session: &Session) -> Self {
        let peers = session
            .roster()
            .peers()
            .iter()
            .map(|peer| PeerSnapshot { id: peer.id, unread: peer.unread, selected: peer.selected })
            .collect();
        Self { selected_peer: session.selected_peer(), peers, displayed: None }
    }

    /// Add what `surface` displays.
    #[must_use]
    pub fn with_surface(mut self, surface: &SimSurface) -> Self {
        self.displayed = Some(
            surface
                .roster
                .iter()
                .map(|entry| PeerSnapshot {
                    id: entry.peer_id,
                    unread: entry.unread,
                    selected: entry.selected,
                })
                .collect(),
        );
        self
    }

    /// Every roster view with its name: the session's and, if captured, the
    /// surface's.
    pub fn views(&self) -> impl Iterator<Item = (&'static str, &[PeerSnapshot])> {
        std::iter::once(("session", self.peers.as_slice()))
            .chain(self.displayed.as_deref().map(|displayed| ("surface", displayed)))
    }
}

/// Flags of one roster entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerSnapshot {
    /// Peer id.
    pub id: UserId,
    /// Unread flag.
    pub unread: bool,
    /// Selected flag.
    pub selected: bool,
}

impl PeerSnapshot {
    /// Unflagged entry.
    pub fn new(id: UserId) -> Self {
        Self { id, unread: false, selected: false }
    }

    /// Set the unread flag.
    #[must_use]
    pub fn unread(mut self) -> Self {
        self.unread = true;
        self
    }

    /// Set the selected flag.
    #[must_use]
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }
}
