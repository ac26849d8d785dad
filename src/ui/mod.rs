mod auth;
mod generator;
mod popup;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::action::Control;
use crate::app::{App, Screen};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match app.screen {
        Screen::Login | Screen::Register => auth::render(frame, app, chunks[1]),
        Screen::Generator => generator::render(frame, app, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.screen {
        Screen::Login => "Random User Generator - Login",
        Screen::Register => "Random User Generator - Register",
        Screen::Generator => "Random User Generator",
    };

    let mut spans = vec![Span::styled(
        title,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];

    if let Some(identity) = &app.identity {
        let user = format!("@{}", identity.display_name());
        let pad = (area.width as usize).saturating_sub(title.len() + user.len());
        spans.push(Span::raw(" ".repeat(pad)));
        spans.push(Span::styled(user, Style::default().fg(Color::Gray)));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(error) = &app.error {
        Line::from(vec![Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )])
    } else if let Some(notice) = &app.notice {
        Line::from(vec![Span::styled(
            notice.as_str(),
            Style::default().fg(Color::Green),
        )])
    } else if app.is_loading() {
        Line::from(vec![Span::styled(
            "Loading...",
            Style::default().fg(Color::Yellow),
        )])
    } else {
        Line::from(vec![Span::styled(help_text(app), Style::default().fg(Color::Gray))])
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

fn help_text(app: &App) -> &'static str {
    match app.screen {
        Screen::Login => "Tab: next field | Enter: log in | Ctrl+r: register | Esc: quit",
        Screen::Register => "Tab: next field | Enter: register | Ctrl+r/Esc: back to login",
        Screen::Generator => match app.generator.as_ref().map(|g| g.focus) {
            Some(Control::Region) => "Enter: choose | ←/→: cycle | Tab: next | e: export | L: logout",
            Some(Control::Errors) => "0-9: type | ←/→: ±1 | PgUp/PgDn: ±50 | Tab: next | e: export",
            Some(Control::Seed) => "0-9: type | R: random | Tab: next | e: export | L: logout",
            _ => "j/k/g/G: nav | Ctrl+d/u: page | Tab: controls | r: reload | e: export | L: logout | q: quit",
        },
    }
}
