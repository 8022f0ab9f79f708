//! Standard invariant checks.
//!
//! Each check runs against every roster view in the snapshot, so a surface
//! that drifted from the session is caught as well as a broken session.

use std::collections::HashSet;

use super::{Invariant, InvariantResult, SessionSnapshot, Violation};

/// At most one peer is drawn as selected.
pub struct SingleSelection;

impl Invariant for SingleSelection {
    fn name(&self) -> &'static str {
        "SingleSelection"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for (view, peers) in state.views() {
            let selected: Vec<_> = peers.iter().filter(|p| p.selected).map(|p| p.id).collect();
            if selected.len() > 1 {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{view}: {} peers selected: {selected:?}", selected.len()),
                });
            }
        }
        Ok(())
    }
}

/// The drawn selection is the session's selected peer.
///
/// Every entry for the selected peer is flagged and no other entry is. The
/// selected peer may be missing from the roster entirely (an empty refresh
/// does not deselect).
pub struct SelectionMatchesSession;

impl Invariant for SelectionMatchesSession {
    fn name(&self) -> &'static str {
        "SelectionMatchesSession"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for (view, peers) in state.views() {
            if let Some(peer) = peers.iter().find(|p| p.selected != (state.selected_peer == Some(p.id))) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{view}: peer {} selected={} but session selected {:?}",
                        peer.id, peer.selected, state.selected_peer
                    ),
                });
            }
        }
        Ok(())
    }
}

/// No peer id is listed twice.
pub struct UniquePeerIds;

impl Invariant for UniquePeerIds {
    fn name(&self) -> &'static str {
        "UniquePeerIds"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for (view, peers) in state.views() {
            let mut seen = HashSet::with_capacity(peers.len());
            if let Some(peer) = peers.iter().find(|p| !seen.insert(p.id)) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{view}: peer {} listed twice", peer.id),
                });
            }
        }
        Ok(())
    }
}

/// The selected peer never shows an unread indicator.
pub struct UnreadExcludesSelected;

impl Invariant for UnreadExcludesSelected {
    fn name(&self) -> &'static str {
        "UnreadExcludesSelected"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let Some(selected) = state.selected_peer else {
            return Ok(());
        };
        for (view, peers) in state.views() {
            if peers.iter().any(|p| p.id == selected && p.unread) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{view}: selected peer {selected} flagged unread"),
                });
            }
        }
        Ok(())
    }
}
