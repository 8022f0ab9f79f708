//! Transcript pane
//!
//! Displays the conversation with the selected peer. Messages from the peer
//! sit on the left, everything else on the right.

use parley_app::{Placement, TranscriptEntry};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use crate::View;

const BORDER_SIZE: u16 = 2;

/// Render the transcript pane.
pub fn render(frame: &mut Frame, view: &View, area: Rect) {
    let title = view
        .selected_row()
        .map_or_else(|| " No conversation ".to_string(), |row| format!(" {} ", row.display_name));
    let block = Block::default().borders(Borders::ALL).title(title);

    let transcript = view.transcript();
    let visible_height = usize::from(area.height.saturating_sub(BORDER_SIZE));
    let end = transcript.len().saturating_sub(view.scrollback());
    let start = end.saturating_sub(visible_height);

    let items: Vec<ListItem> = transcript[start..end].iter().map(entry_item).collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn entry_item(entry: &TranscriptEntry) -> ListItem<'static> {
    let time = entry.timestamp.map(|at| format!("{} ", at.format("%H:%M"))).unwrap_or_default();
    let (alignment, color) = match entry.placement {
        Placement::Outgoing => (Alignment::Left, Color::Green),
        Placement::Incoming => (Alignment::Right, Color::Cyan),
    };

    let line = Line::from(vec![
        Span::styled(time, Style::default().fg(Color::DarkGray)),
        Span::styled(entry.content.clone(), Style::default().fg(color)),
    ])
    .alignment(alignment);

    ListItem::new(line)
}
