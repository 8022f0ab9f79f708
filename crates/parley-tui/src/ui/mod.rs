//! UI rendering
//!
//! Rendering functions that convert the [`View`] into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! returning widget trees.

mod chat;
mod composer;
mod roster;
mod status;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};

use crate::{InputState, View};

/// Render the entire UI.
pub fn render(frame: &mut Frame, view: &View, input: &InputState) {
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const COMPOSER_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(COMPOSER_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, composer_area, status_area] = chunks.as_ref() else {
        return;
    };

    render_main_area(frame, view, input, *main_area);
    composer::render(frame, view, input, *composer_area);
    status::render(frame, view, *status_area);
}

/// Render the main area (roster sidebar + transcript).
fn render_main_area(frame: &mut Frame, view: &View, input: &InputState, area: Rect) {
    const ROSTER_WIDTH: u16 = 24;
    const CHAT_AREA_MIN_WIDTH: u16 = 20;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(ROSTER_WIDTH), Constraint::Min(CHAT_AREA_MIN_WIDTH)])
        .split(area);

    let [roster_area, chat_area] = chunks.as_ref() else {
        return;
    };

    roster::render(frame, view, input, *roster_area);
    chat::render(frame, view, *chat_area);
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use parley_app::{Placement, RenderCommand, StatusLine, TranscriptEntry};
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;

    fn draw(view: &View, input: &InputState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|frame| render(frame, view, input)).unwrap();

        let buffer = terminal.backend().buffer();
        let width = usize::from(buffer.area.width);
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn connected_view() -> View {
        let mut view = View::new();
        view.apply(&RenderCommand::ShowStatus(StatusLine::info("Connected as Alice Smith")));
        view.apply(&RenderCommand::AppendRosterEntry { peer_id: 3, display_name: "Bob Jones".into() });
        view.apply(&RenderCommand::AppendRosterEntry { peer_id: 9, display_name: "Carol White".into() });
        view.apply(&RenderCommand::SetUnread { peer_id: 9, unread: true });
        view
    }

    #[test]
    fn roster_and_status_are_drawn() {
        let screen = draw(&connected_view(), &InputState::new());

        assert!(screen.contains("Bob Jones"), "{screen}");
        assert!(screen.contains("Carol White*"), "{screen}");
        assert!(screen.contains("Connected as Alice Smith"), "{screen}");
        assert!(screen.contains("Select a peer"), "{screen}");
    }

    #[test]
    fn selected_conversation_shows_transcript() {
        let mut view = connected_view();
        view.apply(&RenderCommand::SetSelected { peer_id: 3, selected: true });
        view.apply(&RenderCommand::ShowComposer);
        view.apply(&RenderCommand::AppendTranscriptEntry(TranscriptEntry {
            sender_id: 3,
            content: "hi there".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).single(),
            placement: Placement::Outgoing,
        }));

        let screen = draw(&view, &InputState::new());

        assert!(screen.contains(" Bob Jones "), "{screen}");
        assert!(screen.contains("10:30 hi there"), "{screen}");
        assert!(screen.contains("> "), "{screen}");
        assert!(!screen.contains("Select a peer"), "{screen}");
    }

    #[test]
    fn scrollback_hides_newest_entries() {
        let mut view = connected_view();
        view.apply(&RenderCommand::SetSelected { peer_id: 3, selected: true });
        for n in 0..20 {
            view.apply(&RenderCommand::AppendTranscriptEntry(TranscriptEntry {
                sender_id: 3,
                content: format!("line {n:02}"),
                timestamp: None,
                placement: Placement::Outgoing,
            }));
        }

        assert!(draw(&view, &InputState::new()).contains("line 19"));

        view.scroll_back(5);
        let screen = draw(&view, &InputState::new());
        assert!(screen.contains("line 14"), "{screen}");
        assert!(!screen.contains("line 19"), "{screen}");
    }
}
