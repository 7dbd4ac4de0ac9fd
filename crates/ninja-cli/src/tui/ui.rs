//! UI rendering

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use ninja_core::total_bucks;

use super::app::{App, InputMode, SaveIndicator};
use crate::output::format_total;

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App) {
    if app.engine.is_loading() {
        draw_loading(frame);
        return;
    }

    // Create vertical layout for status bar at the bottom
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    draw_roster(frame, app, chunks[0]);
    draw_save_indicator(frame, app);

    match app.input_mode {
        InputMode::Normal => draw_status_bar(frame, app, chunks[1]),
        InputMode::NewName => draw_form_input(frame, "Name: ", &app.new_name, chunks[1]),
        InputMode::NewBucks => draw_form_input(
            frame,
            &format!("Ninja bucks for {}: ", app.new_name.trim().to_uppercase()),
            &app.new_bucks,
            chunks[1],
        ),
    }

    if app.show_help {
        draw_help_overlay(frame);
    }
}

/// Shown until the first load finishes
fn draw_loading(frame: &mut Frame) {
    let popup_area = centered_rect(50, 30, frame.area());
    frame.render_widget(Clear, popup_area);

    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "↻ Loading...",
            Style::default().fg(Color::Yellow),
        )]),
        Line::from(""),
        Line::from("Fetching ninjas from the bin."),
        Line::from(vec![Span::styled(
            "q to quit",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Ninja Bucks ")
            .border_style(Style::default().fg(Color::Yellow)),
    )
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    frame.render_widget(content, popup_area);
}

/// One row per ninja: position, name, balance, pending amount
fn draw_roster(frame: &mut Frame, app: &App, area: Rect) {
    let ninjas = app.ninjas();
    let total = format_total(total_bucks(ninjas));

    let block = Block::default()
        .title(format!(" Ninjas ({}) · {} bucks ", ninjas.len(), total))
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    if ninjas.is_empty() {
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "No ninjas yet. Press n to add one.",
                Style::default().add_modifier(Modifier::DIM),
            )]),
        ])
        .block(block)
        .alignment(Alignment::Center);
        frame.render_widget(hint, area);
        return;
    }

    let rows: Vec<Row> = ninjas
        .iter()
        .enumerate()
        .map(|(index, ninja)| {
            let amount = app.amounts.get(index).map(|a| a.value).unwrap_or_default();
            let bucks_style = if ninja.bucks < 0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            Row::new(vec![
                Cell::from(index.to_string())
                    .style(Style::default().add_modifier(Modifier::DIM)),
                Cell::from(ninja.name.as_str()),
                Cell::from(Line::from(ninja.bucks.to_string()).alignment(Alignment::Right))
                    .style(bucks_style),
                Cell::from(Line::from(format!("± {}", amount)).alignment(Alignment::Right))
                    .style(Style::default().fg(Color::Cyan)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Min(10),
        Constraint::Length(12),
        Constraint::Length(12),
    ];

    let header = Row::new(vec!["#", "Name", "Bucks", "Amount"])
        .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::REVERSED),
        );

    let mut state = TableState::default();
    state.select(Some(app.selected));

    frame.render_stateful_widget(table, area, &mut state);
}

/// Draw the status bar at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (content, style) = if app.is_loading {
        (
            "Reloading...".to_string(),
            Style::default().fg(Color::Yellow),
        )
    } else if let Some(msg) = &app.status_message {
        (msg.clone(), Style::default())
    } else if let Some(error) = app.load_error() {
        (
            format!("Load failed: {}  (r to retry)", error),
            Style::default().fg(Color::Red),
        )
    } else if app.save_indicator() == SaveIndicator::Unsaved {
        let reason = app.last_save_error.as_deref().unwrap_or("waiting to save");
        (
            format!("Unsaved changes: {}", reason),
            Style::default().fg(Color::Red),
        )
    } else {
        let saved = app
            .last_saved_at
            .map(|at| format!("  saved {}", at.format("%H:%M:%S")))
            .unwrap_or_default();
        (
            format!("0-9:amount  +/a:add  -/s:spend  n:new  r:reload  ?:help  q:quit{}", saved),
            Style::default().add_modifier(Modifier::DIM),
        )
    };

    frame.render_widget(Paragraph::new(content).style(style), area);
}

/// Draw a new-ninja form field at the bottom
fn draw_form_input(frame: &mut Frame, prompt: &str, input: &str, area: Rect) {
    let line = Line::from(vec![
        Span::styled(prompt, Style::default().fg(Color::Yellow)),
        Span::raw(input),
        Span::styled(
            "  (Enter to confirm, Esc to cancel)",
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);

    let cursor_x = area.x + (prompt.chars().count() + input.chars().count()) as u16;
    frame.set_cursor_position((cursor_x, area.y));
}

/// Draw save indicator in top-right corner
fn draw_save_indicator(frame: &mut Frame, app: &App) {
    let area = frame.area();
    if area.width < 5 {
        return;
    }

    let (icon, style) = match app.save_indicator() {
        SaveIndicator::Saved => ("✓", Style::default().fg(Color::Green)),
        SaveIndicator::Saving => ("↻", Style::default().fg(Color::Yellow)),
        SaveIndicator::Unsaved => ("✗", Style::default().fg(Color::Red)),
        SaveIndicator::Idle => ("○", Style::default().add_modifier(Modifier::DIM)),
    };

    let indicator = Paragraph::new(Span::styled(icon, style));
    let indicator_area = Rect::new(area.width - 2, 0, 1, 1);
    frame.render_widget(indicator, indicator_area);
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    let popup_width = 46.min(area.width.saturating_sub(4));
    let popup_height = 19.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  j/k, ↑/↓    Move up/down"),
        Line::from(""),
        Line::from("Ninja bucks:"),
        Line::from("  0-9         Type amount for this row"),
        Line::from("  Backspace   Erase last digit"),
        Line::from("  + or a      Add amount"),
        Line::from("  - or s      Spend amount"),
        Line::from(""),
        Line::from("  n           New ninja"),
        Line::from("  r           Reload from bin"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, popup_area);
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
