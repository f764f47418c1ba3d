// UI module for rendering the TUI.
// Contains the day range bar, breadcrumb, list and detail views.

mod breadcrumb;
mod detail;
mod list;
mod tabs;

use chrono::Utc;
use ratatui::{prelude::*, widgets::*};

pub use list::format_date;

use crate::app::{App, View};
use crate::state::NotificationLevel;

/// Main draw function that renders the entire UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Day range bar
            Constraint::Length(2), // Breadcrumb
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    tabs::draw_day_ranges(frame, app, chunks[0]);
    breadcrumb::draw_breadcrumb(frame, app, chunks[1]);

    match app.view {
        View::List => list::render_pull_requests(frame, &mut app.pull_requests, chunks[2]),
        View::Detail => {
            let selected = app.pull_requests.selected();
            let viewed = selected.is_some_and(|pr| app.pull_requests.is_viewed(pr));
            detail::draw_detail(frame, selected, viewed, chunks[2]);
        }
    }

    draw_status_bar(frame, app, chunks[3]);

    // Help overlay (rendered last, on top of everything)
    if app.show_help {
        draw_help_overlay(frame);
    }
}

/// Draw the status bar with the latest notification or keybinding hints.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(notification) = app.notifications.current(Utc::now()) {
        let (icon, color) = match notification.level {
            NotificationLevel::Error => ("❌", Color::Red),
            NotificationLevel::Success => ("✅", Color::Green),
            NotificationLevel::Info => ("ℹ️", Color::Cyan),
        };
        let line = Line::from(vec![
            Span::raw(format!(" {} ", icon)),
            Span::styled(notification.text(), Style::default().fg(color)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let hints = match app.view {
        View::Detail => vec![
            Span::raw(" m "),
            Span::styled("Viewed", Style::default().fg(Color::DarkGray)),
            Span::raw("  o "),
            Span::styled("Open", Style::default().fg(Color::DarkGray)),
            Span::raw("  y/Y "),
            Span::styled("Copy", Style::default().fg(Color::DarkGray)),
            Span::raw("  Esc "),
            Span::styled("Back", Style::default().fg(Color::DarkGray)),
            Span::raw("  ? "),
            Span::styled("Help", Style::default().fg(Color::DarkGray)),
            Span::raw("  q "),
            Span::styled("Quit", Style::default().fg(Color::DarkGray)),
        ],
        View::List => vec![
            Span::raw(" ↑↓ "),
            Span::styled("Navigate", Style::default().fg(Color::DarkGray)),
            Span::raw("  ↵ "),
            Span::styled("Details", Style::default().fg(Color::DarkGray)),
            Span::raw("  Tab "),
            Span::styled("Range", Style::default().fg(Color::DarkGray)),
            Span::raw("  m "),
            Span::styled("Viewed", Style::default().fg(Color::DarkGray)),
            Span::raw("  v "),
            Span::styled("Hide viewed", Style::default().fg(Color::DarkGray)),
            Span::raw("  r/R "),
            Span::styled("Refresh", Style::default().fg(Color::DarkGray)),
            Span::raw("  ? "),
            Span::styled("Help", Style::default().fg(Color::DarkGray)),
            Span::raw("  q "),
            Span::styled("Quit", Style::default().fg(Color::DarkGray)),
        ],
    };

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

/// Draw the help overlay.
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    // Create a centered popup
    let popup_width = 55;
    let popup_height = 21;
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(
        popup_x,
        popup_y,
        popup_width.min(area.width),
        popup_height.min(area.height),
    );

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let shortcut = |keys: &'static str, action: &'static str| {
        Line::from(vec![
            Span::styled(keys, Style::default().fg(Color::Cyan)),
            Span::raw(action),
        ])
    };

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        shortcut("  ↑/↓ or j/k    ", "Navigate list"),
        shortcut("  Tab/Shift-Tab ", "Next/previous day range"),
        shortcut("  Enter         ", "Show details"),
        shortcut("  Esc           ", "Go back / close help"),
        shortcut("  m             ", "Mark as viewed / unread"),
        shortcut("  v             ", "Hide/show viewed"),
        shortcut("  r             ", "Refresh (uses cache)"),
        shortcut("  R             ", "Force refresh (bypass cache)"),
        shortcut("  o             ", "Open in browser"),
        shortcut("  y             ", "Copy URL"),
        shortcut("  Y             ", "Copy title"),
        shortcut("  ?             ", "Show/hide this help"),
        shortcut("  q             ", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::styled(" or ", Style::default().fg(Color::DarkGray)),
            Span::styled("?", Style::default().fg(Color::Yellow)),
            Span::styled(" to close", Style::default().fg(Color::DarkGray)),
        ]),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help ")
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .alignment(Alignment::Left);

    frame.render_widget(help_paragraph, popup_area);
}
