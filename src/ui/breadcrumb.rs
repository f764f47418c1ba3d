// Repository breadcrumb rendering.
// Shows organization > project > repository with list counters on the right.

use ratatui::{prelude::*, widgets::*};

use crate::app::App;

/// Render the scope trail and counters.
pub fn draw_breadcrumb(frame: &mut Frame, app: &App, area: Rect) {
    let config = &app.config;
    let segments = [&config.organization, &config.project, &config.repository];

    let mut spans = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
        }

        let style = if i == segments.len() - 1 {
            // Repository is highlighted
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(segment.as_str(), style));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));
    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Left);
    frame.render_widget(paragraph, area);

    // Counters on the right
    let state = &app.pull_requests;
    if let Some(items) = state.data.data() {
        let mut counter = format!("{} viewed / {} total", state.viewed_count(), items.len());
        if state.hide_viewed {
            counter.push_str("  [viewed hidden]");
        }
        if state.refreshing {
            counter.push_str("  ⏳ refreshing");
        }
        let counter_para = Paragraph::new(Line::from(Span::styled(
            counter,
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Right);
        frame.render_widget(
            counter_para,
            Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: 1,
            },
        );
    }
}
