mod articles;
mod detail;
mod gallery;
mod help;
mod lightbox;
mod overlay;

use crate::app::{App, View};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Top-level render dispatch.
pub fn render<S, H>(app: &App<S, H>, frame: &mut Frame) {
    match app.view {
        View::Works => {
            gallery::render(app, frame);
            if app.gallery.lightbox_item().is_some() {
                lightbox::render(&app.gallery, frame);
            }
        }
        View::Articles => articles::render(app, frame),
        View::ArticleDetail => detail::render(app, frame),
    }

    if let Some(draft) = &app.edit {
        overlay::render_edit(draft, frame);
    } else if let Some(ids) = &app.pending_delete {
        overlay::render_confirm_delete(ids.len(), frame);
    }

    // Render help overlay on top if active
    if app.show_help {
        help::render(frame);
    }
}

/// Status bar: key hints followed by the current message.
fn key_hints<'a>(hints: &[(&'a str, &'a str)], status: &'a str) -> Line<'a> {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(hints.len() * 2 + 1);
    for (key, action) in hints {
        spans.push(Span::styled(format!(" {key}"), key_style));
        spans.push(Span::raw(format!(" {action} ")));
    }
    spans.push(Span::styled(format!(" {status}"), Style::default().fg(Color::DarkGray)));
    Line::from(spans)
}

/// Filter chip strip: `[ All ]  Label  Label`, the selected one highlighted.
fn chips<'a>(labels: impl IntoIterator<Item = (String, bool)>) -> Line<'a> {
    let mut spans = vec![Span::raw(" ")];
    for (label, selected) in labels {
        let style = if selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {label} "), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

/// Create a centered rectangle using percentage of parent area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

/// Truncate a string to `max_width` terminal columns, adding "…" if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut used = 0;
    let mut result = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        result.push(c);
    }
    result.push('…');
    result
}
