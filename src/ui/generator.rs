use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use crate::action::Control;
use crate::app::{App, Generator};
use crate::types::MAX_ERROR_AMOUNT;

use super::popup;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(generator) = &app.generator else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_controls(frame, generator, chunks[0]);
    render_table(frame, app, generator, chunks[1]);

    if let Some(selected) = generator.region_popup {
        popup::render_region_select(frame, selected);
    }
}

fn control_block(title: &str, focused: bool) -> Block<'_> {
    let (border, title_style) = if focused {
        (
            Style::default().fg(Color::Yellow),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::Gray),
        )
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(format!(" {} ", title), title_style))
}

fn render_controls(frame: &mut Frame, generator: &Generator, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(24),
            Constraint::Min(30),
            Constraint::Length(18),
        ])
        .split(area);

    let params = generator.params();

    let region = Paragraph::new(Line::from(vec![
        Span::raw(params.region.label()),
        Span::styled(
            format!(" ({})", params.region.code()),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(control_block("Region", generator.focus == Control::Region));
    frame.render_widget(region, chunks[0]);

    // Slider: bar width tracks the error amount against its maximum.
    let inner_width = chunks[1].width.saturating_sub(2) as usize;
    let label = format!(" {:>4}", generator.errors_input);
    let bar_width = inner_width.saturating_sub(label.len() + 2);
    let filled = if bar_width == 0 {
        0
    } else {
        (params.error_amount as usize * bar_width) / MAX_ERROR_AMOUNT as usize
    };
    let errors = Paragraph::new(Line::from(vec![
        Span::raw("["),
        Span::styled("=".repeat(filled), Style::default().fg(Color::Cyan)),
        Span::raw(" ".repeat(bar_width - filled)),
        Span::raw("]"),
        Span::styled(label, Style::default().add_modifier(Modifier::BOLD)),
    ]))
    .block(control_block("Error Amount", generator.focus == Control::Errors));
    frame.render_widget(errors, chunks[1]);

    let seed = Paragraph::new(generator.seed_input.as_str())
        .block(control_block("Seed", generator.focus == Control::Seed));
    frame.render_widget(seed, chunks[2]);
}

fn render_table(frame: &mut Frame, app: &App, generator: &Generator, area: Rect) {
    let feed = &generator.feed;
    let focused = generator.focus == Control::Table;

    let mut title = format!(" Users ({}) - page {} ", feed.rows().len(), feed.page());
    if feed.is_exhausted() {
        title.push_str("- end ");
    }
    let block = control_block(&title, focused);

    if feed.rows().is_empty() {
        let (message, color) = match feed.error() {
            _ if app.is_loading() => ("Generating...", Color::Gray),
            Some(error) => (error, Color::Red),
            None => ("No rows", Color::Gray),
        };
        let empty = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(color));
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(["Index", "Identifier", "Name", "Address", "Phone"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = feed
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Row::new(vec![
                (i + 1).to_string(),
                row.identifier.clone(),
                row.name.clone(),
                row.address.clone(),
                row.phone.clone(),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Length(24),
        Constraint::Percentage(22),
        Constraint::Min(20),
        Constraint::Length(18),
    ];

    let highlight = if focused {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(Color::DarkGray)
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(highlight);

    let mut state = TableState::default();
    state.select(Some(generator.selected));
    frame.render_stateful_widget(table, area, &mut state);
}
