//! Roster sidebar
//!
//! Lists peers with selection and unread indicators.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use crate::{Focus, InputState, View};

const HIGHLIGHT_PREFIX: &str = ">";
const PLAIN_PREFIX: &str = " ";
const UNREAD_MARKER: &str = "*";
const EMPTY_MARKER: &str = "";

/// Render the roster sidebar.
pub fn render(frame: &mut Frame, view: &View, input: &InputState, area: Rect) {
    let focused = input.focus(view) == Focus::Roster;

    let items: Vec<ListItem> = view
        .roster()
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let prefix =
                if focused && index == view.highlighted() { HIGHLIGHT_PREFIX } else { PLAIN_PREFIX };
            let style = if row.selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if row.unread {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            let marker = if row.unread { UNREAD_MARKER } else { EMPTY_MARKER };

            ListItem::new(Line::from(vec![
                Span::raw(prefix),
                Span::styled(row.display_name.clone(), style),
                Span::styled(marker, Style::default().fg(Color::Red)),
            ]))
        })
        .collect();

    let border_style = if focused { Style::default().fg(Color::Yellow) } else { Style::default() };
    let block = Block::default().borders(Borders::ALL).border_style(border_style).title(" Peers ");

    frame.render_widget(List::new(items).block(block), area);
}
