use super::centered_rect;
use crate::app::EditDraft;
use crate::model::{ViewCategory, WorkCategory};
use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

fn option_line<T: Copy + PartialEq>(options: &[T], current: T, label: impl Fn(T) -> &'static str) -> Line<'static> {
    let mut spans = vec![Span::raw("   ")];
    for &o in options {
        let style = if o == current {
            Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", label(o)), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

pub fn render_edit(draft: &EditDraft, frame: &mut Frame) {
    let area = centered_rect(80, 40, frame.area());
    frame.render_widget(Clear, area);

    let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("  Category (←/→)", heading)),
        option_line(&WorkCategory::ALL, draft.category, |c| c.metadata().label),
        Line::from(""),
        Line::from(Span::styled("  View (↑/↓)", heading)),
        option_line(&ViewCategory::ALL, draft.view_category, |v| v.metadata().label),
    ];

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(format!(" Edit work {} ", draft.id))
            .title_bottom(Line::from(" Enter Save   Esc Cancel ").style(Style::default().fg(Color::DarkGray))),
    );
    frame.render_widget(popup, area);
}

pub fn render_confirm_delete(count: usize, frame: &mut Frame) {
    let area = centered_rect(50, 20, frame.area());
    frame.render_widget(Clear, area);

    let popup = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  Delete {count} work(s)? This cannot be undone."),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(" Delete   "),
            Span::styled("any other key", Style::default().fg(Color::Cyan)),
            Span::raw(" Cancel"),
        ]),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Confirm delete "),
    );
    frame.render_widget(popup, area);
}
