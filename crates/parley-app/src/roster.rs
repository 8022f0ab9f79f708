//! Roster of known peers.
//!
//! The roster is replaced wholesale on every refresh. Flags on the previous
//! list do not survive; the session reapplies selection and unread state from
//! its own state after each replacement.

use std::collections::{BTreeSet, HashSet};

use parley_proto::{UserId, UserRecord};

use crate::{DirectoryRequest, RenderCommand};

/// A roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Directory id. Unique within the roster.
    pub id: UserId,
    /// `name surname` as shown in the roster.
    pub display_name: String,
    /// Messages arrived while this peer was not selected.
    pub unread: bool,
    /// This peer's conversation is displayed.
    pub selected: bool,
}

impl Peer {
    /// Unflagged entry for a directory record.
    pub fn from_record(record: &UserRecord) -> Self {
        Self { id: record.id, display_name: record.display_name(), unread: false, selected: false }
    }
}

/// Ordered peer list in backend order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    peers: Vec<Peer>,
    /// Number of the most recently issued refresh.
    last_request: u64,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a refresh. The response must echo the returned request number.
    pub fn request_refresh(&mut self) -> (u64, DirectoryRequest) {
        self.last_request += 1;
        (self.last_request, DirectoryRequest::ListUsers { request: self.last_request })
    }

    /// Number of the most recently issued refresh. `0` before the first.
    pub fn last_request(&self) -> u64 {
        self.last_request
    }

    /// Replace the roster with `users`, minus the entry named `own_name`.
    ///
    /// Backend order is kept. If the backend lists an id twice the first
    /// occurrence wins. Every entry starts unflagged.
    pub fn refresh(&mut self, own_name: &str, users: &[UserRecord]) {
        let mut seen = HashSet::with_capacity(users.len());
        self.peers = users
            .iter()
            .filter(|user| user.name != own_name)
            .filter(|user| {
                let fresh = seen.insert(user.id);
                if !fresh {
                    tracing::warn!(peer_id = user.id, "directory listed a peer twice, keeping the first");
                }
                fresh
            })
            .map(Peer::from_record)
            .collect();
    }

    /// Apply selection and unread flags from session state.
    pub fn reapply(&mut self, selected: Option<UserId>, unread: &BTreeSet<UserId>) {
        for peer in &mut self.peers {
            peer.selected = selected == Some(peer.id);
            peer.unread = unread.contains(&peer.id);
        }
    }

    /// Mark exactly `peer_id` as selected, clearing every other entry.
    pub fn select(&mut self, peer_id: Option<UserId>) {
        for peer in &mut self.peers {
            peer.selected = peer_id == Some(peer.id);
        }
    }

    /// Set the unread flag of `peer_id`. Returns `false` if no such peer.
    pub fn set_unread(&mut self, peer_id: UserId, unread: bool) -> bool {
        match self.peers.iter_mut().find(|peer| peer.id == peer_id) {
            Some(peer) => {
                peer.unread = unread;
                true
            },
            None => false,
        }
    }

    /// Entries in display order.
    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    /// Entry for `peer_id`.
    pub fn get(&self, peer_id: UserId) -> Option<&Peer> {
        self.peers.iter().find(|peer| peer.id == peer_id)
    }

    /// Whether `peer_id` is listed.
    pub fn contains(&self, peer_id: UserId) -> bool {
        self.get(peer_id).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Commands that redraw the whole roster with its current flags.
    pub fn render_commands(&self) -> Vec<RenderCommand> {
        let mut commands = Vec::with_capacity(self.peers.len() + 1);
        commands.push(RenderCommand::ClearRoster);
        for peer in &self.peers {
            commands.push(RenderCommand::AppendRosterEntry {
                peer_id: peer.id,
                display_name: peer.display_name.clone(),
            });
            if peer.unread {
                commands.push(RenderCommand::SetUnread { peer_id: peer.id, unread: true });
            }
            if peer.selected {
                commands.push(RenderCommand::SetSelected { peer_id: peer.id, selected: true });
            }
        }
        commands
    }
}
