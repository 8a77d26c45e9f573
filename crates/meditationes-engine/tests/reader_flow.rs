use std::path::PathBuf;

use meditationes_engine::{
    DirSource, IoError, Language, Library, PageCache, ReaderState, Resolution, SegmentId,
    load_all_texts, load_index_set, resolve_line,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn source() -> DirSource {
    DirSource::new(fixtures().join("text"))
}

fn library() -> Library {
    Library::from(load_all_texts(&source()).unwrap())
}

fn ids(segments: &[SegmentId]) -> Vec<String> {
    segments.iter().map(ToString::to_string).collect()
}

#[test]
fn missing_translation_does_not_block_loading() {
    let loaded = load_all_texts(&source()).unwrap();

    assert_eq!(
        loaded.texts.keys().copied().collect::<Vec<_>>(),
        vec![Language::La, Language::LaUa, Language::Fr]
    );
    assert_eq!(loaded.failures.len(), 1);
    assert_eq!(loaded.failures[0].0, Language::FrUa);
    assert!(matches!(loaded.failures[0].1, IoError::NotFound(_)));
    assert_eq!(
        loaded.warnings(),
        vec![format!(
            "Error loading fr-ua: File not found: {}",
            fixtures().join("text/fr-ua.json").display()
        )]
    );
}

#[test]
fn page_view_aligns_segments_across_languages() {
    let view = library().process_page(1).unwrap();

    assert_eq!(view.total_pages, 2);
    assert_eq!(view.blocks.len(), 3);
    assert_eq!(
        view.segments.iter().map(|s| s.id.to_string()).collect::<Vec<_>>(),
        vec!["1", "2"]
    );

    let second = view.segment("2".parse().unwrap()).unwrap();
    assert_eq!(second.text(Language::La), Some("conjectus\n sum, ut nequeam"));
    assert_eq!(second.text(Language::LaUa), Some("я вкинутий у такі сумніви"));
    assert_eq!(
        second.text(Language::Fr),
        Some("m'a rempli l'esprit de tant de doutes")
    );
}

#[test]
fn cyrillic_marker_aligns_with_latin() {
    let view = library().process_page(2).unwrap();
    let id: SegmentId = "3a".parse().unwrap();

    let segment = view.segment(id).unwrap();
    assert_eq!(segment.texts.len(), 3);
    assert_eq!(segment.text(Language::LaUa), Some("твердою"));
}

#[test]
fn latin_units_are_numbered_without_headings() {
    let view = library().process_page(1).unwrap();
    let units = view.block(Language::La).unwrap().units();

    assert_eq!(
        units.iter().map(|u| u.line_number).collect::<Vec<_>>(),
        vec![None, Some(1), Some(2), Some(3)]
    );
}

#[rstest]
#[case(1, Resolution::Multi, vec!["1"])]
#[case(2, Resolution::Multi, vec!["1", "2"])]
#[case(3, Resolution::Multi, vec!["2"])]
#[case(2, Resolution::Single, vec!["2"])]
#[case(4, Resolution::Multi, vec![])]
fn index_lines_resolve_to_segments(
    #[case] line: u32,
    #[case] resolution: Resolution,
    #[case] expected: Vec<&str>,
) {
    let library = library();
    let latin = library.text(Language::La).unwrap();
    assert_eq!(ids(&resolve_line(latin, 1, line, resolution)), expected);
}

#[test]
fn index_navigation_highlights_every_language() {
    let library = library();
    let indices = load_index_set(&source()).unwrap();

    let terms = indices.latin.lines_with_terms(1);
    let (&line, term_ids) = terms.iter().next().unwrap();
    assert_eq!((line, term_ids.clone()), (2, vec!["dubitatio".to_string()]));

    let state = ReaderState::new(&library)
        .toggle_index(Some(true))
        .navigate_to(&library, 1, line, None);
    assert!(!state.index_open);

    let view = library.process_page(state.current_page).unwrap();
    let highlighted: Vec<_> = view
        .segments
        .iter()
        .filter(|s| state.is_segment_highlighted(s.id))
        .map(|s| s.id.to_string())
        .collect();
    assert_eq!(highlighted, vec!["1", "2"]);

    // Leaving the page drops the highlight
    let moved = state.next_page(&library);
    assert!(moved.active_highlight().is_none());
}

#[test]
fn french_index_refers_by_segment() {
    let library = library();
    let indices = load_index_set(&source()).unwrap();

    let entry = indices.french.get("doute").unwrap();
    let (page, lines) = entry.occurrences[0].page_occurrences().next().unwrap();
    let segment = lines[0].segment.as_deref().map(|s| s.parse().unwrap());

    let state = ReaderState::new(&library).navigate_to(&library, i64::from(page), lines[0].line, segment);
    assert_eq!(ids(&state.highlighted.unwrap().segments), vec!["2"]);
    assert_eq!(indices.french.lines_with_terms(1).len(), 0);
}

#[test]
fn nested_index_shape_is_read() {
    let indices = load_index_set(&source()).unwrap();
    let lines = indices.latin.lines_with_terms(2);
    assert_eq!(lines.get(&1), Some(&vec!["7".to_string()]));
}

#[test]
fn prefetched_page_is_served_from_cache() {
    let library = library();
    let mut cache = PageCache::new();

    let state = ReaderState::new(&library);
    cache.get_or_build(&library, state.current_page).unwrap();
    cache.prefetch(&library, state.current_page + 1);

    assert!(cache.contains(2));
    let next = state.next_page(&library);
    assert_eq!(cache.get_or_build(&library, next.current_page).unwrap().page_number, 2);
    assert_eq!(cache.len(), 2);
}
