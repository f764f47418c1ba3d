// Pull request list rendering.
// Styled list view with loading, error and empty states.

use chrono::{DateTime, Local, Utc};
use ratatui::{prelude::*, widgets::*};

use crate::azure::PrStatus;
use crate::state::{LoadingState, PullRequestsState};

/// Format a timestamp as relative time (e.g., "2h ago").
pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(*dt);

    if duration.num_days() > 0 {
        format!("{}d ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}

/// Format a timestamp as local date and time.
pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn status_color(status: PrStatus) -> Color {
    match status {
        PrStatus::Active => Color::Yellow,
        PrStatus::Completed => Color::Green,
        PrStatus::Abandoned => Color::Red,
        PrStatus::Other => Color::Gray,
    }
}

/// Render a loading indicator.
pub fn render_loading(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(format!("⏳ {}...", message))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(text, area);
}

/// Render an error message.
pub fn render_error(frame: &mut Frame, area: Rect, error: &str) {
    let text = Paragraph::new(format!("❌ {}", error))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Red));
    frame.render_widget(text, area);
}

/// Render an empty state message.
pub fn render_empty(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(text, area);
}

/// Render the pull request list.
pub fn render_pull_requests(frame: &mut Frame, state: &mut PullRequestsState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Pull Requests ");

    match &state.data {
        LoadingState::Idle => {
            render_empty(frame, block.inner(area), "Press r to load");
            frame.render_widget(block, area);
        }
        LoadingState::Loading => {
            render_loading(frame, block.inner(area), "Loading pull requests");
            frame.render_widget(block, area);
        }
        LoadingState::Error(e) => {
            render_error(frame, block.inner(area), e);
            frame.render_widget(block, area);
        }
        LoadingState::Loaded(_) => {
            let items: Vec<ListItem> = state
                .visible()
                .into_iter()
                .map(|pr| {
                    let viewed = state.is_viewed(pr);
                    let (marker, marker_color) = if viewed {
                        ("✔", Color::Green)
                    } else {
                        ("○", Color::DarkGray)
                    };
                    let title_style = if viewed {
                        Style::default().fg(Color::Gray)
                    } else {
                        Style::default().fg(Color::White)
                    };

                    ListItem::new(Line::from(vec![
                        Span::styled(format!("{} ", marker), Style::default().fg(marker_color)),
                        Span::raw(format!("{} ", pr.status.glyph())),
                        Span::styled(
                            format!("#{:<6}", pr.pull_request_id),
                            Style::default().fg(status_color(pr.status)),
                        ),
                        Span::styled(pr.title.clone(), title_style),
                        Span::styled(
                            format!("  {}", pr.created_by.display_name),
                            Style::default().fg(Color::Cyan),
                        ),
                        Span::styled(
                            format!("  {}", format_date(&pr.creation_date)),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                })
                .collect();

            if items.is_empty() {
                let message = if state.hide_viewed && state.viewed_count() > 0 {
                    "All pull requests are viewed (press v to show them)".to_string()
                } else {
                    format!(
                        "No pull requests found in the last {} days",
                        state.day_range.days()
                    )
                };
                render_empty(frame, block.inner(area), &message);
                frame.render_widget(block, area);
                return;
            }

            let list_widget = List::new(items)
                .block(block)
                .highlight_style(
                    Style::default()
                        .bg(Color::DarkGray)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("> ");

            frame.render_stateful_widget(list_widget, area, &mut state.list_state);
        }
    }
}
