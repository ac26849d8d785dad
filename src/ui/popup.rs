use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};
use ratatui::Frame;

use crate::types::Region;

/// Centered list of supported regions with the highlighted entry marked.
pub fn render_region_select(frame: &mut Frame, selected: usize) {
    let height = (Region::ALL.len() + 2).min(16) as u16; // +2 for borders
    let area = centered_rect(36, height, frame.area());
    frame.render_widget(Clear, area);

    let items: Vec<ListItem> = Region::ALL
        .iter()
        .enumerate()
        .map(|(i, region)| {
            let style = if i == selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let prefix = if i == selected { "> " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}{:<16}", prefix, region.label()), style),
                Span::styled(region.code(), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default().borders(Borders::ALL).title(Span::styled(
            " Region ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
    );

    let mut state = ListState::default();
    state.select(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Rect of at most `width` x `height` centered in `outer`.
pub fn centered_rect(width: u16, height: u16, outer: Rect) -> Rect {
    let popup_width = width.min(outer.width);
    let popup_height = height.min(outer.height);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((outer.height.saturating_sub(popup_height)) / 2),
            Constraint::Length(popup_height),
            Constraint::Min(0),
        ])
        .split(outer);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((outer.width.saturating_sub(popup_width)) / 2),
            Constraint::Length(popup_width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_fits_inside_outer() {
        let outer = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(40, 10, outer);
        assert_eq!(rect, Rect::new(30, 15, 40, 10));
    }

    #[test]
    fn centered_rect_shrinks_to_outer() {
        let outer = Rect::new(0, 0, 20, 5);
        let rect = centered_rect(40, 10, outer);
        assert_eq!((rect.width, rect.height), (20, 5));
    }
}
