use super::{chips, key_hints, truncate_str};
use crate::app::App;
use crate::filter::GridStatus;
use crate::gallery::LoadState;
use crate::model::Selection;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

pub fn render<S, H>(app: &App<S, H>, frame: &mut Frame) {
    let area = frame.area();
    let grid = &app.articles;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    // ── Header with the shareable route ──
    let mut header_spans = vec![
        Span::styled(" Works (Tab)  ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            "SP Warehouse · Articles ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {}", app.route), Style::default().fg(Color::Blue)),
    ];
    if grid.is_updating() {
        header_spans.push(Span::styled("  updating…", Style::default().fg(Color::Yellow)));
    }
    let header = Paragraph::new(Line::from(header_spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(header, chunks[0]);

    // ── Category chips, derived from the loaded articles ──
    let requested = grid.requested();
    let category_chips = chips(
        std::iter::once((
            format!("All ({})", grid.articles().len()),
            requested.is_all(),
        ))
        .chain(grid.categories().iter().map(|c| {
            (
                format!("{c} ({})", grid.category_count(c)),
                *requested == Selection::Only(c.clone()),
            )
        })),
    );
    let filters = Paragraph::new(category_chips).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Category (c/C) "),
    );
    frame.render_widget(filters, chunks[1]);

    // ── Articles ──
    let list_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Articles ");

    let placeholder = match (grid.state(), grid.status()) {
        (LoadState::Idle | LoadState::Loading, _) => Some(("Loading articles…".to_string(), Color::Yellow)),
        (LoadState::Error(msg), _) => Some((msg.clone(), Color::Red)),
        (_, GridStatus::NoItems) => Some(("No articles published yet".to_string(), Color::DarkGray)),
        (_, GridStatus::NoMatch) => Some(("No articles in this category".to_string(), Color::DarkGray)),
        (_, GridStatus::Populated) => None,
    };

    if let Some((text, color)) = placeholder {
        let p = Paragraph::new(text)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(list_block);
        frame.render_widget(p, chunks[2]);
    } else {
        let excerpt_width = (area.width as usize).saturating_sub(8);
        let items: Vec<ListItem> = grid
            .filtered()
            .into_iter()
            .map(|article| {
                let title = Line::from(vec![
                    Span::styled(
                        format!(" {} ", article.display_date().format("%Y-%m-%d")),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(
                        article.title.clone(),
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {}", article.category_name().unwrap_or("")),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::styled(
                        format!("  {} views", article.view_count),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]);
                let excerpt = Line::from(Span::styled(
                    format!("     {}", truncate_str(&article.excerpt, excerpt_width)),
                    Style::default().fg(Color::Gray),
                ));
                ListItem::new(vec![title, excerpt])
            })
            .collect();

        let list_widget = List::new(items)
            .block(list_block.title_bottom(
                Line::from(format!(" {} articles ", grid.filtered().len())).alignment(Alignment::Right),
            ))
            .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White))
            .highlight_symbol("▸ ");

        let mut list_state = ListState::default();
        list_state.select(Some(grid.cursor()));
        frame.render_stateful_widget(list_widget, chunks[2], &mut list_state);
    }

    // ── Status bar ──
    let hints = [
        ("↑↓", "Navigate"),
        ("Enter", "Read"),
        ("c", "Category"),
        ("r", "Reload"),
        ("?", "Help"),
        ("q", "Quit"),
    ];
    frame.render_widget(Paragraph::new(key_hints(&hints, &app.status_msg)), chunks[3]);
}
