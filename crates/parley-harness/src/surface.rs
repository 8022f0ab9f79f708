//! In-memory render surface.
//!
//! Applies [`RenderCommand`]s the way a real surface would, so tests can
//! assert on what the user sees instead of on the command stream.

use parley_app::{RenderCommand, StatusLine, TranscriptEntry, UserId};

/// A roster entry as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceEntry {
    /// Peer id.
    pub peer_id: UserId,
    /// Displayed name.
    pub display_name: String,
    /// Unread indicator shown.
    pub unread: bool,
    /// Drawn as selected.
    pub selected: bool,
}

/// Recorded render surface state.
#[derive(Debug, Clone, Default)]
pub struct SimSurface {
    /// Roster entries in display order.
    pub roster: Vec<SurfaceEntry>,
    /// Transcript entries in display order.
    pub transcript: Vec<TranscriptEntry>,
    /// Composer available.
    pub composer_visible: bool,
    /// Last status line.
    pub status: Option<StatusLine>,
    /// Transcript scrolled to its newest entry since the last mutation.
    pub pinned_to_newest: bool,
    /// Number of commands applied.
    pub commands_applied: usize,
}

impl SimSurface {
    /// Apply one command.
    ///
    /// Toggling an entry that is not displayed does nothing.
    pub fn apply(&mut self, command: &RenderCommand) {
        self.commands_applied += 1;
        match command {
            RenderCommand::ShowStatus(status) => self.status = Some(status.clone()),
            RenderCommand::ShowComposer => self.composer_visible = true,
            RenderCommand::HideComposer => self.composer_visible = false,
            RenderCommand::ClearRoster => self.roster.clear(),
            RenderCommand::AppendRosterEntry { peer_id, display_name } => {
                self.roster.push(SurfaceEntry {
                    peer_id: *peer_id,
                    display_name: display_name.clone(),
                    unread: false,
                    selected: false,
                });
            },
            RenderCommand::SetUnread { peer_id, unread } => {
                if let Some(entry) = self.entry_mut(*peer_id) {
                    entry.unread = *unread;
                }
            },
            RenderCommand::SetSelected { peer_id, selected } => {
                if let Some(entry) = self.entry_mut(*peer_id) {
                    entry.selected = *selected;
                }
            },
            RenderCommand::ClearTranscript => {
                self.transcript.clear();
                self.pinned_to_newest = false;
            },
            RenderCommand::AppendTranscriptEntry(entry) => {
                self.transcript.push(entry.clone());
                self.pinned_to_newest = false;
            },
            RenderCommand::ScrollToNewest => self.pinned_to_newest = true,
        }
    }

    /// Displayed entry for `peer_id`.
    pub fn entry(&self, peer_id: UserId) -> Option<&SurfaceEntry> {
        self.roster.iter().find(|entry| entry.peer_id == peer_id)
    }

    /// Transcript texts in display order.
    pub fn transcript_texts(&self) -> Vec<&str> {
        self.transcript.iter().map(|entry| entry.content.as_str()).collect()
    }

    /// One-line description of the roster, e.g. `Bob [selected], Carol [unread]`.
    pub fn describe_roster(&self) -> String {
        self.roster
            .iter()
            .map(|entry| {
                let mut text = entry.display_name.clone();
                if entry.selected {
                    text.push_str(" [selected]");
                }
                if entry.unread {
                    text.push_str(" [unread]");
                }
                text
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn entry_mut(&mut self, peer_id: UserId) -> Option<&mut SurfaceEntry> {
        self.roster.iter_mut().find(|entry| entry.peer_id == peer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_apply_to_displayed_entries_only() {
        let mut surface = SimSurface::default();
        surface.apply(&RenderCommand::AppendRosterEntry { peer_id: 3, display_name: "Bob".into() });
        surface.apply(&RenderCommand::SetUnread { peer_id: 3, unread: true });
        surface.apply(&RenderCommand::SetSelected { peer_id: 9, selected: true });

        assert_eq!(surface.describe_roster(), "Bob [unread]");
        assert_eq!(surface.commands_applied, 3);
    }

    #[test]
    fn clear_roster_drops_entries() {
        let mut surface = SimSurface::default();
        surface.apply(&RenderCommand::AppendRosterEntry { peer_id: 3, display_name: "Bob".into() });
        surface.apply(&RenderCommand::ClearRoster);

        assert!(surface.roster.is_empty());
    }
}
