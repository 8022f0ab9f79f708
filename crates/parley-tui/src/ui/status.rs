//! Status bar
//!
//! Displays the latest status line and key hints.

use parley_app::StatusLevel;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::View;

const KEY_HINTS: &str = " | Tab focus  Enter open/send  PgUp/PgDn scroll  Esc quit";

/// Render the status bar.
pub fn render(frame: &mut Frame, view: &View, area: Rect) {
    let status = view.status().map_or_else(
        || Span::raw("Starting..."),
        |status| match status.level {
            StatusLevel::Info => Span::raw(status.text.clone()),
            StatusLevel::Error => Span::styled(
                status.text.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
        },
    );

    let line = Line::from(vec![Span::raw(" "), status, Span::styled(KEY_HINTS, Style::default().fg(Color::Gray))]);
    let paragraph = Paragraph::new(line).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
