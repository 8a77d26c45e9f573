use crate::models::Page;

use super::marker::{SegmentId, find_markers};

/// A segment as found in a single language's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSegment {
    pub id: SegmentId,
    /// The marker exactly as written, before Cyrillic normalization.
    pub marker: String,
    /// Text between this marker and the next one, trimmed. May be empty.
    pub text: String,
}

/// Split `text` into marker-delimited segments.
///
/// Anything before the first marker belongs to no segment and is dropped.
pub fn parse_segments(text: &str) -> Vec<ParsedSegment> {
    let markers: Vec<_> = find_markers(text).collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let end = markers.get(i + 1).map_or(text.len(), |next| next.start);
            ParsedSegment {
                id: m.id,
                marker: text[m.start..m.end].to_string(),
                text: text[m.end..end].trim().to_string(),
            }
        })
        .collect()
}

/// Flatten a page's body paragraphs into one string for segment parsing.
///
/// Verbatim languages keep line breaks and separate new paragraphs with a
/// blank line; flowing languages join everything with single spaces.
pub fn flatten_page(page: &Page, verbatim: bool) -> String {
    let joiner = if verbatim { "\n" } else { " " };
    let mut out = String::new();

    for (index, paragraph) in page.body_paragraphs().enumerate() {
        if index > 0 {
            out.push_str(joiner);
            if paragraph.is_new_paragraph() {
                out.push_str("\n\n");
            }
        }
        out.push_str(&paragraph.lines().join(joiner));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HeadingLevel, Paragraph};
    use pretty_assertions::assert_eq;

    fn ids(segments: &[ParsedSegment]) -> Vec<String> {
        segments.iter().map(|s| s.id.to_string()).collect()
    }

    #[test]
    fn test_parse_basic_segments() {
        let segments = parse_segments("(1) Cogito ergo (2) sum.");
        assert_eq!(ids(&segments), vec!["1", "2"]);
        assert_eq!(segments[0].text, "Cogito ergo");
        assert_eq!(segments[1].text, "sum.");
    }

    #[test]
    fn test_text_before_first_marker_is_dropped() {
        let segments = parse_segments("Preface text (1) body");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "body");
    }

    #[test]
    fn test_empty_segment_is_preserved() {
        let segments = parse_segments("(1)(2) text");
        assert_eq!(ids(&segments), vec!["1", "2"]);
        assert_eq!(segments[0].text, "");
    }

    #[test]
    fn test_cyrillic_marker_keeps_raw_form() {
        let segments = parse_segments("(6а) Текст");
        assert_eq!(segments[0].id.to_string(), "6a");
        assert_eq!(segments[0].marker, "(6а)");
    }

    #[test]
    fn test_large_marker_number_splits_text() {
        let segments = parse_segments("(1) a (4294967296) b");
        assert_eq!(ids(&segments), vec!["1", "4294967296"]);
        assert_eq!(segments[0].text, "a");
        assert_eq!(segments[1].text, "b");
    }

    #[test]
    fn test_no_markers() {
        assert!(parse_segments("plain prose").is_empty());
        assert!(parse_segments("").is_empty());
    }

    #[test]
    fn test_flatten_verbatim_keeps_lines() {
        let page = Page::new(
            1,
            vec![
                Paragraph::heading(HeadingLevel::H1, "MEDITATIO"),
                Paragraph::body(["(1) Cogito", "ergo"]),
                Paragraph::body([" (2) sum."]),
            ],
        );
        assert_eq!(flatten_page(&page, true), "(1) Cogito\nergo\n\n\n (2) sum.");
    }

    #[test]
    fn test_flatten_flowing_joins_with_spaces() {
        let page = Page::new(
            1,
            vec![
                Paragraph::body(["(1) Cogito", "ergo"]),
                Paragraph::body(["sum."]),
            ],
        );
        assert_eq!(flatten_page(&page, false), "(1) Cogito ergo sum.");
    }
}
