//! Displayed state.
//!
//! The session never reads this back. It is rebuilt purely from the
//! [`RenderCommand`]s the session emits, plus local navigation (roster
//! highlight, transcript scrollback) that the session does not care about.

use parley_app::{RenderCommand, StatusLine, TranscriptEntry, UserId};

/// One roster line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    /// Peer id.
    pub peer_id: UserId,
    /// Name shown.
    pub display_name: String,
    /// Unread marker shown.
    pub unread: bool,
    /// Drawn as the open conversation.
    pub selected: bool,
}

/// Everything the terminal draws.
#[derive(Debug, Default)]
pub struct View {
    roster: Vec<RosterRow>,
    transcript: Vec<TranscriptEntry>,
    composer_visible: bool,
    status: Option<StatusLine>,
    highlighted: usize,
    /// Lines scrolled back from the newest transcript entry.
    scrollback: usize,
}

impl View {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one render command.
    pub fn apply(&mut self, command: &RenderCommand) {
        match command {
            RenderCommand::ShowStatus(status) => self.status = Some(status.clone()),
            RenderCommand::ShowComposer => self.composer_visible = true,
            RenderCommand::HideComposer => self.composer_visible = false,
            RenderCommand::ClearRoster => self.roster.clear(),
            RenderCommand::AppendRosterEntry { peer_id, display_name } => {
                self.roster.push(RosterRow {
                    peer_id: *peer_id,
                    display_name: display_name.clone(),
                    unread: false,
                    selected: false,
                });
            },
            RenderCommand::SetUnread { peer_id, unread } => {
                if let Some(row) = self.row_mut(*peer_id) {
                    row.unread = *unread;
                }
            },
            RenderCommand::SetSelected { peer_id, selected } => {
                if let Some(row) = self.row_mut(*peer_id) {
                    row.selected = *selected;
                }
            },
            RenderCommand::ClearTranscript => {
                self.transcript.clear();
                self.scrollback = 0;
            },
            RenderCommand::AppendTranscriptEntry(entry) => self.transcript.push(entry.clone()),
            RenderCommand::ScrollToNewest => self.scrollback = 0,
        }
        self.highlighted = self.highlighted.min(self.roster.len().saturating_sub(1));
    }

    /// Roster rows in display order.
    pub fn roster(&self) -> &[RosterRow] {
        &self.roster
    }

    /// Transcript entries, oldest first.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Whether the composer accepts input.
    pub fn composer_visible(&self) -> bool {
        self.composer_visible
    }

    /// Last status line.
    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    /// Index of the highlighted roster row.
    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    /// Peer under the roster highlight.
    pub fn highlighted_peer(&self) -> Option<UserId> {
        self.roster.get(self.highlighted).map(|row| row.peer_id)
    }

    /// Row of the open conversation.
    pub fn selected_row(&self) -> Option<&RosterRow> {
        self.roster.iter().find(|row| row.selected)
    }

    /// Move the highlight one row up.
    pub fn highlight_previous(&mut self) {
        self.highlighted = self.highlighted.saturating_sub(1);
    }

    /// Move the highlight one row down.
    pub fn highlight_next(&mut self) {
        if self.highlighted + 1 < self.roster.len() {
            self.highlighted += 1;
        }
    }

    /// Lines scrolled back from the newest entry.
    pub fn scrollback(&self) -> usize {
        self.scrollback
    }

    /// Scroll towards older entries.
    pub fn scroll_back(&mut self, lines: usize) {
        self.scrollback = (self.scrollback + lines).min(self.transcript.len().saturating_sub(1));
    }

    /// Scroll towards newer entries.
    pub fn scroll_forward(&mut self, lines: usize) {
        self.scrollback = self.scrollback.saturating_sub(lines);
    }

    fn row_mut(&mut self, peer_id: UserId) -> Option<&mut RosterRow> {
        self.roster.iter_mut().find(|row| row.peer_id == peer_id)
    }
}
