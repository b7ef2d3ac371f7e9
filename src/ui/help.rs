use super::centered_rect;
use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub fn render(frame: &mut Frame) {
    let area = centered_rect(70, 80, frame.area());

    // Clear the area behind the popup
    frame.render_widget(Clear, area);

    let help_text = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Global", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("    ?         ", Style::default().fg(Color::Yellow)),
            Span::raw("Toggle this help"),
        ]),
        Line::from(vec![
            Span::styled("    q         ", Style::default().fg(Color::Yellow)),
            Span::raw("Quit application"),
        ]),
        Line::from(vec![
            Span::styled("    Tab       ", Style::default().fg(Color::Yellow)),
            Span::raw("Switch between works and articles"),
        ]),
        Line::from(vec![
            Span::styled("    Esc       ", Style::default().fg(Color::Yellow)),
            Span::raw("Back / cancel / dismiss error"),
        ]),
        Line::from(vec![
            Span::styled("    r         ", Style::default().fg(Color::Yellow)),
            Span::raw("Reload from the database"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Works", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("    ↑/k ↓/j   ", Style::default().fg(Color::Yellow)),
            Span::raw("Navigate"),
        ]),
        Line::from(vec![
            Span::styled("    c/C v/V   ", Style::default().fg(Color::Yellow)),
            Span::raw("Next/previous category or view filter"),
        ]),
        Line::from(vec![
            Span::styled("    x         ", Style::default().fg(Color::Yellow)),
            Span::raw("Clear filters"),
        ]),
        Line::from(vec![
            Span::styled("    m         ", Style::default().fg(Color::Yellow)),
            Span::raw("Load more"),
        ]),
        Line::from(vec![
            Span::styled("    Enter     ", Style::default().fg(Color::Yellow)),
            Span::raw("Open lightbox (←/→ to step through)"),
        ]),
        Line::from(vec![
            Span::styled("    e         ", Style::default().fg(Color::Yellow)),
            Span::raw("Edit category and view"),
        ]),
        Line::from(vec![
            Span::styled("    d         ", Style::default().fg(Color::Yellow)),
            Span::raw("Delete (asks for confirmation)"),
        ]),
        Line::from(vec![
            Span::styled("    s         ", Style::default().fg(Color::Yellow)),
            Span::raw("Selection mode; Space selects"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Articles", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("    c/C       ", Style::default().fg(Color::Yellow)),
            Span::raw("Next/previous category"),
        ]),
        Line::from(vec![
            Span::styled("    Enter     ", Style::default().fg(Color::Yellow)),
            Span::raw("Read article"),
        ]),
        Line::from(vec![
            Span::styled("    Tab/1-2   ", Style::default().fg(Color::Yellow)),
            Span::raw("Article text / related articles"),
        ]),
        Line::from(vec![
            Span::styled("    PgUp/PgDn ", Style::default().fg(Color::Yellow)),
            Span::raw("Scroll page up/down"),
        ]),
        Line::from(""),
    ];

    let help = Paragraph::new(help_text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help: keybindings ")
                .title_bottom(Line::from(" Press ? or Esc to close ").style(Style::default().fg(Color::DarkGray))),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(help, area);
}
