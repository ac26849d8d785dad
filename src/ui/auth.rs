use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{App, Screen};
use crate::form::Form;

use super::popup::centered_rect;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (title, form, footer) = match app.screen {
        Screen::Register => (
            " Register ",
            &app.register_form,
            "Already registered? Ctrl+r to log in",
        ),
        _ => (" Login ", &app.login_form, "Not registered yet? Ctrl+r to register"),
    };

    // Three rows per field plus the footer and borders.
    let height = (form.fields.len() * 3 + 4) as u16;
    let area = centered_rect(44, height, area);

    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        title,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut constraints: Vec<Constraint> = form.fields.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    render_fields(frame, form, app.busy, &chunks);

    let footer = Paragraph::new(Line::from(Span::styled(
        footer,
        Style::default().fg(Color::Gray),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(footer, chunks[form.fields.len()]);
}

fn render_fields(frame: &mut Frame, form: &Form, busy: bool, chunks: &[Rect]) {
    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus && !busy;
        let border = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let mut text = field.display();
        if focused {
            text.push('▏');
        }

        let input = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(format!(" {} ", field.label)),
        );
        frame.render_widget(input, chunks[i]);
    }
}
