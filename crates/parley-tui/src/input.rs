//! Input state and key handling for the TUI.
//!
//! This module owns the composer buffer and keyboard focus and turns key
//! presses into [`SessionEvent`]s. Keys that only move local state (cursor,
//! roster highlight, scrollback) produce no event.

use chrono::{DateTime, Utc};
use parley_app::SessionEvent;

use crate::View;

/// Transcript lines moved per page key.
const PAGE_LINES: usize = 10;

/// Key input events from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Character input.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key.
    Backspace,
    /// Delete key.
    Delete,
    /// Tab key.
    Tab,
    /// Escape key.
    Esc,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
}

/// Which pane receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// Arrow keys move the roster highlight, Enter opens the conversation.
    #[default]
    Roster,
    /// Keys edit the message, Enter sends it.
    Composer,
}

/// Composer buffer, cursor and focus.
#[derive(Debug, Default)]
pub struct InputState {
    buffer: String,
    /// Cursor position in characters.
    cursor: usize,
    focus: Focus,
}

impl InputState {
    /// Create a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text in the composer.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Pane receiving keys. The composer only has focus while it is shown.
    pub fn focus(&self, view: &View) -> Focus {
        if view.composer_visible() { self.focus } else { Focus::Roster }
    }

    /// Handle a key press. `now` stamps submitted messages.
    pub fn handle_key(&mut self, key: KeyInput, view: &mut View, now: DateTime<Utc>) -> Option<SessionEvent> {
        match key {
            KeyInput::Esc => return Some(SessionEvent::TeardownRequested),
            KeyInput::Tab => {
                self.focus = match self.focus(view) {
                    Focus::Roster if view.composer_visible() => Focus::Composer,
                    _ => Focus::Roster,
                };
                return None;
            },
            KeyInput::PageUp => {
                view.scroll_back(PAGE_LINES);
                return None;
            },
            KeyInput::PageDown => {
                view.scroll_forward(PAGE_LINES);
                return None;
            },
            _ => {},
        }

        match self.focus(view) {
            Focus::Roster => self.roster_key(key, view),
            Focus::Composer => self.composer_key(key, now),
        }
    }

    fn roster_key(&mut self, key: KeyInput, view: &mut View) -> Option<SessionEvent> {
        match key {
            KeyInput::Up => view.highlight_previous(),
            KeyInput::Down => view.highlight_next(),
            KeyInput::Enter => {
                let peer_id = view.highlighted_peer()?;
                self.focus = Focus::Composer;
                return Some(SessionEvent::PeerSelected { peer_id });
            },
            _ => {},
        }
        None
    }

    fn composer_key(&mut self, key: KeyInput, now: DateTime<Utc>) -> Option<SessionEvent> {
        let len = self.buffer.chars().count();
        match key {
            KeyInput::Char(c) => {
                let at = self.byte_index(self.cursor);
                self.buffer.insert(at, c);
                self.cursor += 1;
            },
            KeyInput::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.buffer.remove(at);
                }
            },
            KeyInput::Delete => {
                if self.cursor < len {
                    let at = self.byte_index(self.cursor);
                    self.buffer.remove(at);
                }
            },
            KeyInput::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyInput::Right => self.cursor = (self.cursor + 1).min(len),
            KeyInput::Home => self.cursor = 0,
            KeyInput::End => self.cursor = len,
            KeyInput::Enter => {
                let content = std::mem::take(&mut self.buffer);
                self.cursor = 0;
                return Some(SessionEvent::ComposerSubmitted { content, at: now });
            },
            KeyInput::Up | KeyInput::Down | KeyInput::Tab | KeyInput::Esc | KeyInput::PageUp | KeyInput::PageDown => {},
        }
        None
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.buffer.char_indices().nth(chars).map_or(self.buffer.len(), |(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use parley_app::RenderCommand;

    use super::*;

    fn view_with_peers() -> View {
        let mut view = View::new();
        view.apply(&RenderCommand::AppendRosterEntry { peer_id: 3, display_name: "Bob Jones".into() });
        view.apply(&RenderCommand::AppendRosterEntry { peer_id: 9, display_name: "Carol White".into() });
        view
    }

    fn type_text(input: &mut InputState, view: &mut View, text: &str) {
        for c in text.chars() {
            input.handle_key(KeyInput::Char(c), view, Utc::now());
        }
    }

    #[test]
    fn enter_on_roster_selects_highlighted_peer() {
        let mut input = InputState::new();
        let mut view = view_with_peers();

        input.handle_key(KeyInput::Down, &mut view, Utc::now());
        let event = input.handle_key(KeyInput::Enter, &mut view, Utc::now());

        insta::assert_snapshot!(format!("{event:?}"), @"Some(PeerSelected { peer_id: 9 })");
    }

    #[test]
    fn typing_needs_a_visible_composer() {
        let mut input = InputState::new();
        let mut view = view_with_peers();

        type_text(&mut input, &mut view, "hi");
        assert!(input.buffer().is_empty());

        view.apply(&RenderCommand::ShowComposer);
        input.handle_key(KeyInput::Tab, &mut view, Utc::now());
        type_text(&mut input, &mut view, "hi");
        assert_eq!(input.buffer(), "hi");
    }

    #[test]
    fn enter_in_composer_submits_and_clears() {
        let mut input = InputState::new();
        let mut view = view_with_peers();
        view.apply(&RenderCommand::ShowComposer);
        input.handle_key(KeyInput::Tab, &mut view, Utc::now());
        type_text(&mut input, &mut view, "hello");

        let now = Utc::now();
        let event = input.handle_key(KeyInput::Enter, &mut view, now);

        assert_eq!(event, Some(SessionEvent::ComposerSubmitted { content: "hello".into(), at: now }));
        assert!(input.buffer().is_empty());
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn editing_handles_multibyte_characters() {
        let mut input = InputState::new();
        let mut view = View::new();
        view.apply(&RenderCommand::ShowComposer);
        input.handle_key(KeyInput::Tab, &mut view, Utc::now());

        type_text(&mut input, &mut view, "héllo");
        input.handle_key(KeyInput::Home, &mut view, Utc::now());
        input.handle_key(KeyInput::Right, &mut view, Utc::now());
        input.handle_key(KeyInput::Delete, &mut view, Utc::now());
        assert_eq!(input.buffer(), "hllo");

        input.handle_key(KeyInput::End, &mut view, Utc::now());
        input.handle_key(KeyInput::Backspace, &mut view, Utc::now());
        assert_eq!(input.buffer(), "hll");
        assert_eq!(input.cursor(), 3);
    }

    #[test]
    fn esc_requests_teardown_from_any_pane() {
        let mut input = InputState::new();
        let mut view = View::new();

        assert_eq!(input.handle_key(KeyInput::Esc, &mut view, Utc::now()), Some(SessionEvent::TeardownRequested));
    }

    #[test]
    fn hidden_composer_returns_focus_to_roster() {
        let mut input = InputState::new();
        let mut view = view_with_peers();
        view.apply(&RenderCommand::ShowComposer);
        input.handle_key(KeyInput::Tab, &mut view, Utc::now());
        assert_eq!(input.focus(&view), Focus::Composer);

        view.apply(&RenderCommand::HideComposer);

        assert_eq!(input.focus(&view), Focus::Roster);
    }
}
