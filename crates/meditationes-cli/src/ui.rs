use meditationes_engine::resolver::{PartKind, split_line};
use meditationes_engine::{HeadingLevel, Language, LanguageBlock, ReaderState, TextUnit};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::app::App;

/// Line numbers are shown on every fifth line.
const LINE_NUMBER_STEP: u32 = 5;

pub fn ui(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());

    let header = Line::from(vec![
        Span::styled("Meditationes", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            "  page {} / {}",
            app.state.current_page, app.state.total_pages
        )),
    ]);
    f.render_widget(Paragraph::new(header), rows[0]);

    let body = if app.state.index_open {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(75), Constraint::Percentage(25)].as_ref())
            .split(rows[1]);
        render_index(f, app, columns[1]);
        columns[0]
    } else {
        rows[1]
    };
    render_grid(f, app, body);

    f.render_widget(Paragraph::new(footer(app)), rows[2]);
}

fn footer(app: &App) -> Line<'static> {
    if let Some(input) = &app.input {
        return Line::from(format!("Go to page[:line]: {input}_"));
    }
    if let Some(input) = &app.search_input {
        return Line::from(format!("Search terms: {input}_"));
    }
    if let Some(message) = &app.message {
        return Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red)));
    }
    if app.state.index_open {
        return Line::from(
            "q: Quit | Tab: Latin/French | /: Search | j/k: Select | Enter: Open | i: Close",
        );
    }
    Line::from(
        "q: Quit | ←/p →/n: Page | j/k: Segment | g: Go to | i: Index | Esc: Clear",
    )
}

fn render_grid(f: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);
    let cells: Vec<Rect> = rows
        .iter()
        .flat_map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
                .split(*row)
                .to_vec()
        })
        .collect();

    let term_lines = app.lines_with_terms();
    for (language, cell) in app.state.layout.iter().zip(cells) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(language.label());
        let block_view = app.view().and_then(|v| v.block(*language));
        let content = match block_view {
            Some(language_block) => render_block(language_block, &app.state, app.highlight, &term_lines),
            None => vec![Line::from(Span::styled(
                "No text for this page",
                Style::default().fg(Color::DarkGray),
            ))],
        };
        let paragraph = Paragraph::new(content).block(block);
        let paragraph = if *language == Language::La {
            paragraph
        } else {
            paragraph.wrap(Wrap { trim: false })
        };
        f.render_widget(paragraph, cell);
    }
}

fn render_block(
    language_block: &LanguageBlock,
    state: &ReaderState,
    highlight: Color,
    term_lines: &[u32],
) -> Vec<Line<'static>> {
    language_block
        .units()
        .iter()
        .map(|unit| render_unit(unit, state, highlight, term_lines))
        .collect()
}

pub fn render_unit(
    unit: &TextUnit,
    state: &ReaderState,
    highlight: Color,
    term_lines: &[u32],
) -> Line<'static> {
    if let Some(level) = unit.heading {
        let style = match level {
            HeadingLevel::H1 => Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            HeadingLevel::H2 | HeadingLevel::H3 => Style::default().add_modifier(Modifier::BOLD),
        };
        return Line::from(Span::styled(unit.text.clone(), style)).alignment(Alignment::Center);
    }

    let mut spans = Vec::new();
    if let Some(number) = unit.line_number {
        let gutter = if number % LINE_NUMBER_STEP == 0 {
            format!("{number:>3}")
        } else {
            "   ".to_string()
        };
        let mark = if term_lines.contains(&number) { "•" } else { " " };
        spans.push(Span::styled(
            format!("{gutter}{mark} "),
            Style::default().fg(Color::DarkGray),
        ));
    } else if unit.indent {
        spans.push(Span::raw("  "));
    }

    for part in split_line(&unit.text, unit.initial_segment) {
        let mut style = match part.kind {
            PartKind::Marker => Style::default().fg(Color::DarkGray),
            PartKind::Text => Style::default(),
        };
        if let Some(id) = part.segment {
            if state.is_segment_highlighted(id) {
                style = style.bg(highlight).fg(Color::Black);
            } else if state.hovered_segment == Some(id) {
                style = style.add_modifier(Modifier::REVERSED);
            }
        }
        spans.push(Span::styled(part.content.to_string(), style));
    }

    Line::from(spans)
}

fn render_index(f: &mut Frame, app: &App, area: Rect) {
    if app.indices.is_none() {
        let block = Block::default().borders(Borders::ALL).title("Index");
        let reason = app.index_error.as_deref().unwrap_or("Index not loaded");
        let item = ListItem::new(reason.to_string()).style(Style::default().fg(Color::Red));
        f.render_widget(List::new(vec![item]).block(block), area);
        return;
    }

    let on_page = app.terms_on_page();
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(on_page.len().clamp(1, 6) as u16 + 2),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    let page_items: Vec<ListItem> = on_page
        .into_iter()
        .map(|(line, terms)| ListItem::new(format!("{line:>3}  {}", terms.join(", "))))
        .collect();
    let page_block = Block::default().borders(Borders::ALL).title("This page");
    f.render_widget(List::new(page_items).block(page_block), parts[0]);

    let tabs = Line::from(
        [Language::La, Language::Fr]
            .into_iter()
            .map(|language| {
                let style = if language == app.index_language {
                    Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Span::styled(format!(" {} ", language.label()), style)
            })
            .collect::<Vec<_>>(),
    );
    let block = Block::default().borders(Borders::ALL).title(tabs);

    let rows = app.index_rows();
    let selected = app.selected_row(&rows);
    let mut items = Vec::with_capacity(rows.len() + 1);
    if !app.index_query.is_empty() {
        items.push(ListItem::new(format!("/{}", app.index_query)).style(Style::default().fg(Color::DarkGray)));
    }
    if rows.is_empty() {
        items.push(ListItem::new("No terms found").style(Style::default().fg(Color::DarkGray)));
    }
    for (i, row) in rows.into_iter().enumerate() {
        let style = if Some(i) == selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else if row.target.is_none() && !row.text.starts_with(' ') {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        items.push(ListItem::new(row.text).style(style));
    }
    f.render_widget(List::new(items).block(block), parts[1]);
}
