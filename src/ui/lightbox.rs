use super::centered_rect;
use crate::gallery::Gallery;
use crate::upload::{ImageOptions, optimize_image_url};
use ratatui::{
    Frame,
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

const FULL_WIDTH: u32 = 1600;

pub fn render(gallery: &Gallery, frame: &mut Frame) {
    let Some(work) = gallery.lightbox_item() else {
        return;
    };
    let area = centered_rect(80, 60, frame.area());
    frame.render_widget(Clear, area);

    let category = work.category.metadata();
    let view = work.view_category.metadata();
    let url = optimize_image_url(&work.image_ref, FULL_WIDTH, None, &ImageOptions::default());
    let label = Style::default().fg(Color::DarkGray);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(" {}", category.label),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(format!(" {}", category.description), label)),
        Line::from(""),
        Line::from(vec![
            Span::styled(" View: ", label),
            Span::styled(view.label, Style::default().fg(Color::Cyan)),
            Span::styled(format!("  ({})", view.description), label),
        ]),
        Line::from(vec![
            Span::styled(" Added: ", label),
            Span::styled(
                work.created_at.format("%Y-%m-%d %H:%M").to_string(),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled("   ID: ", label),
            Span::raw(work.id.to_string()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Image: ", label),
            Span::styled(
                url,
                Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            ),
        ]),
    ];

    let position = gallery
        .lightbox_position()
        .map(|(n, total)| format!(" {n} / {total} "))
        .unwrap_or_default();

    let popup = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", category.icon))
            .title(Line::from(position).alignment(Alignment::Right))
            .title_bottom(
                Line::from(" ←/→ Previous/Next   e Edit   d Delete   Esc Close ")
                    .style(Style::default().fg(Color::DarkGray)),
            ),
    );
    frame.render_widget(popup, area);
}
