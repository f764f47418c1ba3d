// Pull request detail rendering.
// Description, branches and reviewer votes for the selected pull request.

use ratatui::{prelude::*, widgets::*};

use super::list::{format_date, format_relative_time, render_empty};
use crate::azure::PullRequest;

/// Lines of the detail view for `pr`.
pub fn detail_lines(pr: &PullRequest, viewed: bool) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::DarkGray);

    let mut lines = vec![
        Line::from(vec![Span::styled(
            format!("{} {}", pr.status.glyph(), pr.title),
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Pull Request ", label),
            Span::styled(
                format!("#{}", pr.pull_request_id),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(if viewed { "  (viewed)" } else { "" }, label),
        ]),
        Line::from(vec![
            Span::styled("Status:     ", label),
            Span::raw(pr.status.label()),
        ]),
        Line::from(vec![
            Span::styled("Created by: ", label),
            Span::styled(
                pr.created_by.display_name.clone(),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(format!(" <{}>", pr.created_by.unique_name), label),
        ]),
        Line::from(vec![
            Span::styled("Created:    ", label),
            Span::raw(format!(
                "{} ({})",
                format_date(&pr.creation_date),
                format_relative_time(&pr.creation_date)
            )),
        ]),
        Line::from(vec![
            Span::styled("Source:     ", label),
            Span::styled(pr.source_ref_name.clone(), Style::default().fg(Color::Magenta)),
            Span::raw(" → "),
            Span::styled(pr.target_ref_name.clone(), Style::default().fg(Color::Magenta)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Description",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];

    match pr.description.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(description) => {
            lines.extend(description.lines().map(|line| Line::from(line.to_string())));
        }
        None => lines.push(Line::from(Span::styled("No description provided", label))),
    }

    if !pr.reviewers.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Reviewers",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for reviewer in &pr.reviewers {
            lines.push(Line::from(format!(
                "{} {}",
                reviewer.vote_state().glyph(),
                reviewer.display_name
            )));
        }
    }

    lines
}

/// Draw the detail view for the selected pull request.
pub fn draw_detail(frame: &mut Frame, pr: Option<&PullRequest>, viewed: bool, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Details ");

    let Some(pr) = pr else {
        render_empty(frame, block.inner(area), "Nothing selected");
        frame.render_widget(block, area);
        return;
    };

    let paragraph = Paragraph::new(detail_lines(pr, viewed))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
