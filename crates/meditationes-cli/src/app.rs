use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use meditationes_config::Preferences;
use meditationes_engine::{
    IndexSet, Language, Library, PageCache, PageView, ReaderState, SegmentId, TermEntry,
};
use ratatui::style::Color;

/// Idle time on a page before the next one is prepared.
pub const PREFETCH_DELAY: Duration = Duration::from_millis(500);

/// Parse `page` or `page:line`.
pub fn parse_location(input: &str) -> Option<(i64, Option<u32>)> {
    let (page, line) = match input.trim().split_once(':') {
        Some((page, line)) => (page, Some(line.trim().parse().ok()?)),
        None => (input.trim(), None),
    };
    Some((page.trim().parse().ok()?, line))
}

/// Language layout from stored codes; unknown codes are skipped and
/// missing languages appended so every language keeps a slot.
pub fn layout_from_codes(codes: &[String]) -> Vec<Language> {
    let mut layout: Vec<Language> = Vec::with_capacity(Language::ALL.len());
    for code in codes {
        match code.parse::<Language>() {
            Ok(language) if !layout.contains(&language) => layout.push(language),
            Ok(_) => {}
            Err(e) => log::warn!("Ignoring layout entry: {e}"),
        }
    }
    for language in Language::ALL {
        if !layout.contains(&language) {
            layout.push(language);
        }
    }
    layout
}

pub fn parse_color(name: &str) -> Color {
    match name.to_lowercase().as_str() {
        "red" => Color::Red,
        "green" => Color::Green,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        _ => Color::Yellow,
    }
}

/// Where an index occurrence points: a Latin line, or a French segment
/// when `line` is 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTarget {
    pub page: u32,
    pub line: u32,
    pub segment: Option<String>,
}

/// One row of the index panel. Only occurrence rows carry a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub text: String,
    pub target: Option<IndexTarget>,
}

fn term_rows(entry: &TermEntry, rows: &mut Vec<IndexRow>) {
    rows.push(IndexRow {
        text: format!("{} [{}]", entry.term, entry.count),
        target: None,
    });

    for language in ["la", "fr", "ua"] {
        let terms = entry.translations.terms_for(language);
        if terms.is_empty() {
            continue;
        }
        let list: Vec<String> = terms
            .iter()
            .map(|t| match &t.count {
                Some(count) if count.is_positive() => format!("{} [{count}]", t.term),
                _ => t.term.clone(),
            })
            .collect();
        rows.push(IndexRow {
            text: format!("  {language}: {}", list.join(", ")),
            target: None,
        });
    }

    for occurrence in &entry.occurrences {
        for (page, lines) in occurrence.page_occurrences() {
            for line_ref in lines {
                let mut text = format!("  {} {page}: {}", occurrence.section, line_ref.label());
                if let Some(n) = line_ref.count_in_line {
                    text.push_str(&format!(" x{n}"));
                }
                rows.push(IndexRow {
                    text,
                    target: Some(IndexTarget {
                        page,
                        line: line_ref.line,
                        segment: line_ref.segment.clone(),
                    }),
                });
            }
        }
    }
}

pub struct App {
    library: Library,
    pub indices: Option<IndexSet>,
    /// Why the term index could not be loaded, shown in the index panel.
    pub index_error: Option<String>,
    cache: PageCache,
    pub state: ReaderState,
    /// Text typed after `g`, while the prompt is open.
    pub input: Option<String>,
    pub message: Option<String>,
    pub highlight: Color,
    /// Which term index the panel browses (Latin or French).
    pub index_language: Language,
    pub index_query: String,
    /// Text typed after `/`, while the search prompt is open.
    pub search_input: Option<String>,
    /// Position among the selectable occurrence rows.
    pub index_selected: usize,
    page_shown_at: Instant,
    prefetched: bool,
}

impl App {
    pub fn new(library: Library, indices: Option<IndexSet>, state: ReaderState) -> Self {
        let mut app = Self {
            library,
            indices,
            index_error: None,
            cache: PageCache::new(),
            state,
            input: None,
            message: None,
            highlight: Color::Yellow,
            index_language: Language::La,
            index_query: String::new(),
            search_input: None,
            index_selected: 0,
            page_shown_at: Instant::now(),
            prefetched: false,
        };
        app.load_current_page();
        app
    }

    pub fn view(&self) -> Option<&PageView> {
        self.cache.get(self.state.current_page)
    }

    fn load_current_page(&mut self) {
        if self.cache.get_or_build(&self.library, self.state.current_page).is_none() {
            self.message = Some(format!("Page {} is missing", self.state.current_page));
        }
    }

    /// Swap in the next state, resetting the prefetch timer on page change.
    fn apply(&mut self, next: ReaderState) {
        if next.current_page != self.state.current_page {
            self.page_shown_at = Instant::now();
            self.prefetched = false;
        }
        self.state = next;
        self.load_current_page();
    }

    pub fn preferences(&self) -> Preferences {
        Preferences {
            language_layout: self.state.layout.iter().map(|l| l.code().to_string()).collect(),
            current_page: self.state.current_page,
        }
    }

    /// Prefetch the following page once the reader has stayed put long
    /// enough.
    pub fn tick(&mut self, now: Instant) {
        if self.prefetched || now.duration_since(self.page_shown_at) < PREFETCH_DELAY {
            return;
        }
        self.prefetched = true;
        self.cache.prefetch(&self.library, self.state.current_page + 1);
    }

    /// Index term names on each line of the current page.
    pub fn terms_on_page(&self) -> Vec<(u32, Vec<String>)> {
        let Some(indices) = &self.indices else {
            return Vec::new();
        };
        indices
            .latin
            .lines_with_terms(self.state.current_page)
            .into_iter()
            .map(|(line, ids)| {
                let names = ids
                    .iter()
                    .map(|id| indices.latin.get(id).map_or(id.clone(), |e| e.term.clone()))
                    .collect();
                (line, names)
            })
            .collect()
    }

    pub fn lines_with_terms(&self) -> Vec<u32> {
        self.indices
            .as_ref()
            .map(|i| i.latin.lines_with_terms(self.state.current_page).into_keys().collect())
            .unwrap_or_default()
    }

    /// Rows of the index panel for the browsed language and query.
    pub fn index_rows(&self) -> Vec<IndexRow> {
        let Some(index) = self
            .indices
            .as_ref()
            .and_then(|i| i.for_language(self.index_language))
        else {
            return Vec::new();
        };
        let mut rows = Vec::new();
        for entry in index.search(&self.index_query) {
            term_rows(entry, &mut rows);
        }
        rows
    }

    /// Index of the selected row within `rows`, if any row is selectable.
    pub fn selected_row(&self, rows: &[IndexRow]) -> Option<usize> {
        rows.iter()
            .enumerate()
            .filter(|(_, row)| row.target.is_some())
            .nth(self.index_selected)
            .map(|(i, _)| i)
    }

    fn switch_index_language(&mut self) {
        self.index_language = match self.index_language {
            Language::La => Language::Fr,
            _ => Language::La,
        };
        self.index_selected = 0;
    }

    fn move_selection(&mut self, forward: bool) {
        let count = self
            .index_rows()
            .iter()
            .filter(|row| row.target.is_some())
            .count();
        if count == 0 {
            return;
        }
        self.index_selected = if forward {
            (self.index_selected + 1).min(count - 1)
        } else {
            self.index_selected.saturating_sub(1)
        };
    }

    /// Navigate to the selected occurrence. French references go by
    /// segment, Latin ones by line.
    fn open_selected(&mut self) {
        let rows = self.index_rows();
        let Some(target) = self
            .selected_row(&rows)
            .and_then(|i| rows[i].target.clone())
        else {
            return;
        };
        let segment = target
            .segment
            .as_deref()
            .and_then(|s| s.parse::<SegmentId>().ok());
        let next =
            self.state
                .navigate_to(&self.library, i64::from(target.page), target.line, segment);
        self.apply(next);
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        let Some(input) = self.search_input.as_mut() else {
            return;
        };
        match code {
            KeyCode::Enter => {
                self.index_query = std::mem::take(input);
                self.search_input = None;
                self.index_selected = 0;
            }
            KeyCode::Esc => self.search_input = None,
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) => input.push(c),
            _ => {}
        }
    }

    /// Move the hovered segment forward or back through the page.
    fn move_hover(&mut self, forward: bool) {
        let Some(view) = self.view() else { return };
        if view.segments.is_empty() {
            return;
        }
        let count = view.segments.len();
        let position = self
            .state
            .hovered_segment
            .and_then(|id| view.segments.iter().position(|s| s.id == id));
        let next = match (position, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        };
        let id = view.segments[next].id;
        self.state = self.state.hover(Some(id));
    }

    fn submit_location(&mut self, input: &str) {
        match parse_location(input) {
            Some((page, Some(line))) => {
                let next = self.state.navigate_to(&self.library, page, line, None);
                self.apply(next);
            }
            Some((page, None)) => {
                let next = self.state.go_to_page(&self.library, page);
                self.apply(next);
            }
            None => self.message = Some(format!("Not a location: {input}")),
        }
    }

    /// Handle a key press. Returns `true` when the reader should quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        if let Some(input) = self.input.as_mut() {
            match code {
                KeyCode::Enter => {
                    let input = std::mem::take(input);
                    self.input = None;
                    self.submit_location(&input);
                }
                KeyCode::Esc => self.input = None,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) if c.is_ascii_digit() || c == ':' => input.push(c),
                _ => {}
            }
            return false;
        }

        if self.search_input.is_some() {
            self.handle_search_key(code);
            return false;
        }

        self.message = None;
        if self.state.index_open {
            match code {
                KeyCode::Tab => {
                    self.switch_index_language();
                    return false;
                }
                KeyCode::Char('/') => {
                    self.search_input = Some(self.index_query.clone());
                    return false;
                }
                KeyCode::Char('j') | KeyCode::Down => {
                    self.move_selection(true);
                    return false;
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.move_selection(false);
                    return false;
                }
                KeyCode::Enter => {
                    self.open_selected();
                    return false;
                }
                _ => {}
            }
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Right | KeyCode::Char('n') => {
                let next = self.state.next_page(&self.library);
                self.apply(next);
            }
            KeyCode::Left | KeyCode::Char('p') => {
                let next = self.state.previous_page(&self.library);
                self.apply(next);
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_hover(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_hover(false),
            KeyCode::Char('g') => self.input = Some(String::new()),
            KeyCode::Char('i') => self.state = self.state.toggle_index(None),
            KeyCode::Esc => self.state = self.state.clear_highlight().hover(None),
            _ => {}
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meditationes_engine::{Page, Paragraph, TextData, TermIndex};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn app() -> App {
        let latin = TextData {
            pages: vec![
                Page::new(1, vec![Paragraph::body(["(1) Dubito ", "omnia (2) quae"])]),
                Page::new(2, vec![Paragraph::body(["(3) Cogito"])]),
                Page::new(3, vec![Paragraph::body(["(4) sum"])]),
            ],
        };
        let mut texts = BTreeMap::new();
        texts.insert(Language::La, latin);
        let library = Library::new(texts);

        let index = TermIndex::from_json(
            r#"[{ "id": 1, "term": "dubito", "occurrences": [{ "section": "I", "page": 1, "lines": [{ "line": 1 }] }] }]"#,
        )
        .unwrap();
        let french = TermIndex::from_json(
            r#"[
                { "id": 1, "term": "pensée", "occurrences": [{ "section": "II", "page": 2, "lines": [{ "line": 0, "segment": "3" }] }] },
                { "id": 2, "term": "Doute", "count": 1, "translations": { "la": [{ "term": "dubito", "count": 1 }] },
                  "occurrences": [{ "section": "I", "page": 1, "lines": [{ "line": 0, "segment": "2" }] }] }
            ]"#,
        )
        .unwrap();
        let indices = IndexSet {
            latin: index,
            french,
        };

        let state = ReaderState::new(&library);
        App::new(library, Some(indices), state)
    }

    fn type_keys(app: &mut App, keys: &str) {
        for c in keys.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    #[rstest]
    #[case("12", Some((12, None)))]
    #[case("12:7", Some((12, Some(7))))]
    #[case(" 3 : 4 ", Some((3, Some(4))))]
    #[case("x", None)]
    #[case("3:", None)]
    fn test_parse_location(#[case] input: &str, #[case] expected: Option<(i64, Option<u32>)>) {
        assert_eq!(parse_location(input), expected);
    }

    #[test]
    fn test_layout_from_codes_fills_missing() {
        let layout = layout_from_codes(&["fr".into(), "xx".into(), "fr".into(), "la".into()]);
        assert_eq!(
            layout,
            vec![Language::Fr, Language::La, Language::LaUa, Language::FrUa]
        );
    }

    #[test]
    fn test_paging_keys() {
        let mut app = app();
        app.handle_key(KeyCode::Char('n'));
        assert_eq!(app.state.current_page, 2);
        app.handle_key(KeyCode::Right);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.state.current_page, 3);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.view().unwrap().page_number, 2);
    }

    #[test]
    fn test_go_to_line_highlights() {
        let mut app = app();
        app.handle_key(KeyCode::Char('g'));
        type_keys(&mut app, "1:2");
        app.handle_key(KeyCode::Enter);

        assert!(app.input.is_none());
        let highlighted = app.state.active_highlight().unwrap();
        assert_eq!(highlighted.line, 2);
        assert_eq!(highlighted.segments.len(), 2);

        app.handle_key(KeyCode::Esc);
        assert!(app.state.highlighted.is_none());
    }

    #[test]
    fn test_bad_location_reports() {
        let mut app = app();
        app.handle_key(KeyCode::Char('g'));
        app.handle_key(KeyCode::Char(':'));
        app.handle_key(KeyCode::Enter);
        assert!(app.message.is_some());
        assert_eq!(app.state.current_page, 1);
    }

    #[test]
    fn test_hover_cycles_segments() {
        let mut app = app();
        app.handle_key(KeyCode::Char('j'));
        assert_eq!(app.state.hovered_segment.map(|s| s.to_string()), Some("1".into()));
        app.handle_key(KeyCode::Char('j'));
        app.handle_key(KeyCode::Char('j'));
        assert_eq!(app.state.hovered_segment.map(|s| s.to_string()), Some("1".into()));
        app.handle_key(KeyCode::Char('k'));
        assert_eq!(app.state.hovered_segment.map(|s| s.to_string()), Some("2".into()));
    }

    #[test]
    fn test_prefetch_waits_for_idle() {
        let mut app = app();
        let start = Instant::now();

        app.tick(start);
        assert!(!app.cache.contains(2));

        app.tick(start + PREFETCH_DELAY * 2);
        assert!(app.cache.contains(2));
    }

    #[test]
    fn test_terms_on_page() {
        let mut app = app();
        assert_eq!(app.terms_on_page(), vec![(1, vec!["dubito".to_string()])]);
        assert_eq!(app.lines_with_terms(), vec![1]);

        app.handle_key(KeyCode::Char('i'));
        assert!(app.state.index_open);
        app.handle_key(KeyCode::Char('n'));
        assert!(app.terms_on_page().is_empty());
    }

    #[test]
    fn test_index_rows_list_occurrences() {
        let mut app = app();
        app.handle_key(KeyCode::Char('i'));
        app.handle_key(KeyCode::Tab);
        assert_eq!(app.index_language, Language::Fr);

        let texts: Vec<String> = app.index_rows().into_iter().map(|r| r.text).collect();
        assert_eq!(
            texts,
            vec!["pensée [0]", "  II 2: 3", "Doute [1]", "  la: dubito [1]", "  I 1: 2"]
        );

        app.handle_key(KeyCode::Tab);
        let rows = app.index_rows();
        assert_eq!(rows[0].text, "dubito [0]");
        assert_eq!(app.selected_row(&rows), Some(1));
    }

    #[test]
    fn test_french_search_opens_segment() {
        let mut app = app();
        app.handle_key(KeyCode::Char('n'));
        app.handle_key(KeyCode::Char('i'));
        app.handle_key(KeyCode::Tab);

        app.handle_key(KeyCode::Char('/'));
        type_keys(&mut app, "DOU");
        assert_eq!(app.index_query, "");
        app.handle_key(KeyCode::Enter);
        assert!(app.search_input.is_none());
        assert_eq!(app.index_query, "DOU");

        let rows = app.index_rows();
        assert_eq!(rows.len(), 3);
        let selected = app.selected_row(&rows).unwrap();
        assert_eq!(
            rows[selected].target,
            Some(IndexTarget {
                page: 1,
                line: 0,
                segment: Some("2".into()),
            })
        );

        app.handle_key(KeyCode::Enter);
        assert!(!app.state.index_open);
        assert_eq!(app.state.current_page, 1);
        assert!(app.state.is_segment_highlighted("2".parse().unwrap()));
        assert!(!app.state.is_segment_highlighted("1".parse().unwrap()));
    }

    #[test]
    fn test_index_selection_stays_in_bounds() {
        let mut app = app();
        app.handle_key(KeyCode::Char('i'));
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Char('j'));
        app.handle_key(KeyCode::Char('j'));
        assert_eq!(app.index_selected, 1);
        // Index keys take j/k, so the hover stays untouched
        assert!(app.state.hovered_segment.is_none());
        app.handle_key(KeyCode::Char('k'));
        app.handle_key(KeyCode::Char('k'));
        assert_eq!(app.index_selected, 0);

        app.handle_key(KeyCode::Char('/'));
        type_keys(&mut app, "nihil");
        app.handle_key(KeyCode::Enter);
        assert!(app.index_rows().is_empty());
        app.handle_key(KeyCode::Enter);
        assert!(app.state.index_open);
        assert!(app.state.highlighted.is_none());
    }

    #[test]
    fn test_quit_and_preferences() {
        let mut app = app();
        app.handle_key(KeyCode::Char('n'));
        assert!(app.handle_key(KeyCode::Char('q')));

        let prefs = app.preferences();
        assert_eq!(prefs.current_page, 2);
        assert_eq!(prefs.language_layout, vec!["la", "la-ua", "fr", "fr-ua"]);
    }
}
