use super::key_hints;
use crate::app::App;
use crate::article_detail::DetailTab;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};

pub fn render<S, H>(app: &App<S, H>, frame: &mut Frame) {
    let area = frame.area();
    let detail = match &app.detail {
        Some(d) => d,
        None => return,
    };
    let article = &detail.article;

    // Layout: header(5) + tabs(3) + content(min) + status(1)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    // ── Metadata header ──
    let meta_lines = vec![
        Line::from(Span::styled(
            format!(" {}", article.title),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(" Category: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                article.category_name().unwrap_or("-").to_string(),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw("   "),
            Span::styled("By: ", Style::default().fg(Color::DarkGray)),
            Span::raw(article.author.clone().unwrap_or_else(|| "-".to_string())),
            Span::raw("   "),
            Span::styled("Published: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                article.display_date().format("%Y-%m-%d").to_string(),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw("   "),
            Span::styled("Views: ", Style::default().fg(Color::DarkGray)),
            Span::raw(article.view_count.to_string()),
        ]),
        Line::from(vec![
            Span::styled(" Link: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                app.route.clone(),
                Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            ),
        ]),
    ];

    let meta_block = Paragraph::new(meta_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Article "),
    );
    frame.render_widget(meta_block, chunks[0]);

    // ── Tab strip ──
    let tab_titles: Vec<Line> = DetailTab::ALL
        .iter()
        .map(|t| {
            let style = if *t == detail.tab {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let label = match t {
                DetailTab::Related => format!("{} ({})", t.label(), detail.related.len()),
                DetailTab::Content => t.label().to_string(),
            };
            Line::from(Span::styled(label, style))
        })
        .collect();

    let tab_index = DetailTab::ALL
        .iter()
        .position(|t| *t == detail.tab)
        .unwrap_or(0);

    let tabs = Tabs::new(tab_titles)
        .select(tab_index)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" [Tab/1-2] "),
        )
        .highlight_style(Style::default().fg(Color::Cyan));
    frame.render_widget(tabs, chunks[1]);

    // ── Content area ──
    match detail.tab {
        DetailTab::Content => {
            let content = Paragraph::new(detail.body.as_str())
                .wrap(Wrap { trim: false })
                .scroll((detail.scroll, 0))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::DarkGray))
                        .title(format!(" {} ", detail.tab.label()))
                        .title_bottom(
                            Line::from(format!(" scroll: {} ", detail.scroll))
                                .alignment(Alignment::Right),
                        ),
                );
            frame.render_widget(content, chunks[2]);
        }
        DetailTab::Related => {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Related articles ");
            if detail.related.is_empty() {
                let p = Paragraph::new("No other articles yet")
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(Alignment::Center)
                    .block(block);
                frame.render_widget(p, chunks[2]);
            } else {
                let items: Vec<ListItem> = detail
                    .related
                    .iter()
                    .map(|a| {
                        ListItem::new(vec![
                            Line::from(Span::styled(
                                a.title.clone(),
                                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                            )),
                            Line::from(Span::styled(
                                format!(
                                    "  {}  ·  {} views",
                                    a.category_name().unwrap_or("-"),
                                    a.view_count
                                ),
                                Style::default().fg(Color::DarkGray),
                            )),
                        ])
                    })
                    .collect();
                let list = List::new(items)
                    .block(block)
                    .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White))
                    .highlight_symbol("▸ ");
                let mut state = ListState::default();
                state.select(Some(detail.related_selected));
                frame.render_stateful_widget(list, chunks[2], &mut state);
            }
        }
    }

    // ── Status bar ──
    let hints: &[(&str, &str)] = match detail.tab {
        DetailTab::Content => &[("↑↓/PgUp/PgDn", "Scroll"), ("Tab", "Switch"), ("Esc", "Back")],
        DetailTab::Related => &[("↑↓", "Navigate"), ("Enter", "Read"), ("Tab", "Switch"), ("Esc", "Back")],
    };
    frame.render_widget(Paragraph::new(key_hints(hints, &app.status_msg)), chunks[3]);
}
