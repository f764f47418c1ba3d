// Day range selector rendering.
// Shows the look-back windows as tabs with the active one highlighted.

use ratatui::{prelude::*, widgets::*};

use crate::app::App;
use crate::config::DayRange;

/// Draw the day range bar at the top of the screen.
pub fn draw_day_ranges(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.pull_requests.day_range;

    let titles: Vec<Line> = DayRange::ALL
        .iter()
        .map(|range| {
            let style = if *range == active {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(range.label(), style))
        })
        .collect();

    let selected_index = DayRange::ALL
        .iter()
        .position(|range| *range == active)
        .unwrap_or(0);

    let tabs_widget = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" adopr ")
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .select(selected_index)
        .highlight_style(Style::default().fg(Color::Yellow))
        .divider(Span::raw(" │ "));

    frame.render_widget(tabs_widget, area);
}
