use super::{chips, key_hints, truncate_str};
use crate::app::App;
use crate::filter::GridStatus;
use crate::gallery::LoadState;
use crate::model::{Selection, ViewCategory, WorkCategory};
use crate::upload::{ImageOptions, optimize_image_url};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

const THUMB_WIDTH: u32 = 400;
const THUMB_HEIGHT: u32 = 300;

pub fn render<S, H>(app: &App<S, H>, frame: &mut Frame) {
    let area = frame.area();
    let gallery = &app.gallery;

    // Layout: header(3) + filters(4) + list(min) + status(1)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    // ── Header ──
    let mut header_spans = vec![
        Span::styled(
            " SP Warehouse · Works ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Articles (Tab)", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(
            "   [{} of {} works]",
            gallery.filtered_len(),
            gallery.total_len()
        )),
    ];
    if gallery.is_updating() {
        header_spans.push(Span::styled("  updating…", Style::default().fg(Color::Yellow)));
    }
    if gallery.selection_mode() {
        header_spans.push(Span::styled(
            format!("  {} selected", gallery.selected_ids().len()),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ));
    }
    let header = Paragraph::new(Line::from(header_spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(header, chunks[0]);

    // ── Filter chips ──
    // The requested filter is shown right away; the grid follows on settle.
    let requested = gallery.requested_filter();
    let category_chips = chips(
        std::iter::once(("All".to_string(), requested.category.is_all())).chain(
            WorkCategory::ALL
                .iter()
                .map(|c| (c.metadata().label.to_string(), requested.category == Selection::Only(*c))),
        ),
    );
    let view_chips = chips(
        std::iter::once(("All views".to_string(), requested.view.is_all())).chain(
            ViewCategory::ALL
                .iter()
                .map(|v| (v.metadata().label.to_string(), requested.view == Selection::Only(*v))),
        ),
    );
    let filters = Paragraph::new(vec![category_chips, view_chips]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Category (c/C) · View (v/V) · Clear (x) "),
    );
    frame.render_widget(filters, chunks[1]);

    // ── Grid ──
    let list_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Works ");

    let placeholder = match (gallery.state(), gallery.status()) {
        (LoadState::Loading, _) if gallery.total_len() == 0 => Some(("Loading works…", Color::Yellow)),
        (LoadState::Error(msg), _) if gallery.total_len() == 0 => Some((msg.as_str(), Color::Red)),
        (_, GridStatus::NoItems) => Some(("No works yet", Color::DarkGray)),
        (_, GridStatus::NoMatch) => Some(("No works match these filters", Color::DarkGray)),
        (_, GridStatus::Populated) => None,
    };

    if let Some((text, color)) = placeholder {
        let p = Paragraph::new(text)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(list_block);
        frame.render_widget(p, chunks[2]);
    } else {
        let url_width = (area.width as usize).saturating_sub(60);
        let items: Vec<ListItem> = gallery
            .visible()
            .into_iter()
            .map(|work| {
                let mut spans = Vec::new();
                if gallery.selection_mode() {
                    let mark = if gallery.is_selected(work.id) { "[x] " } else { "[ ] " };
                    spans.push(Span::styled(mark, Style::default().fg(Color::Magenta)));
                }
                let thumb = optimize_image_url(
                    &work.image_ref,
                    THUMB_WIDTH,
                    Some(THUMB_HEIGHT),
                    &ImageOptions::default(),
                );
                spans.extend([
                    Span::styled(format!("{:>5} ", work.id), Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        format!("{:<20}", work.category.metadata().label),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled(
                        format!("{:<10}", work.view_category.metadata().label),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::styled(
                        format!("{}  ", work.created_at.format("%Y-%m-%d")),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(truncate_str(&thumb, url_width), Style::default().fg(Color::Blue)),
                ]);
                ListItem::new(Line::from(spans))
            })
            .collect();

        let shown = gallery.visible().len();
        let footer = if gallery.has_more() {
            format!(" {} of {} · m: load more ", shown, gallery.filtered_len())
        } else {
            format!(" {} of {} ", shown, gallery.filtered_len())
        };
        let mut block = list_block.title_bottom(Line::from(footer).alignment(Alignment::Right));
        if let LoadState::Error(msg) = gallery.state() {
            block = block.title_bottom(Line::from(Span::styled(
                format!(" {msg} "),
                Style::default().fg(Color::Red),
            )));
        }

        let list_widget = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▸ ");

        let mut list_state = ListState::default();
        list_state.select(Some(gallery.cursor()));
        frame.render_stateful_widget(list_widget, chunks[2], &mut list_state);
    }

    // ── Status bar ──
    let hints: &[(&str, &str)] = if gallery.selection_mode() {
        &[("Space", "Select"), ("d", "Delete selected"), ("s/Esc", "Done")]
    } else {
        &[
            ("↑↓", "Navigate"),
            ("Enter", "View"),
            ("e", "Edit"),
            ("d", "Delete"),
            ("s", "Select"),
            ("r", "Reload"),
            ("?", "Help"),
            ("q", "Quit"),
        ]
    };
    frame.render_widget(Paragraph::new(key_hints(hints, &app.status_msg)), chunks[3]);
}
