use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::Language;

use super::marker::SegmentId;
use super::parser::{ParsedSegment, parse_segments};

/// One aligned unit of meaning across languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub id: SegmentId,
    /// Normalized marker, e.g. `(6a)`.
    pub marker: String,
    /// Text per language; languages without this id are absent.
    pub texts: BTreeMap<Language, String>,
}

impl Segment {
    pub fn text(&self, language: Language) -> Option<&str> {
        self.texts.get(&language).map(String::as_str)
    }

    pub fn is_blank(&self) -> bool {
        self.texts.values().all(|t| t.trim().is_empty())
    }
}

/// Parse every language independently and merge the results by id.
///
/// The output is naturally sorted. If a language repeats an id, its first
/// occurrence is used.
pub fn align_segments(language_texts: &BTreeMap<Language, String>) -> Vec<Segment> {
    let parsed: BTreeMap<Language, Vec<ParsedSegment>> = language_texts
        .iter()
        .map(|(lang, text)| (*lang, parse_segments(text)))
        .collect();

    let ids: BTreeSet<SegmentId> = parsed.values().flatten().map(|s| s.id).collect();

    ids.into_iter()
        .map(|id| {
            let texts = parsed
                .iter()
                .filter_map(|(lang, segments)| {
                    segments
                        .iter()
                        .find(|s| s.id == id)
                        .map(|s| (*lang, s.text.clone()))
                })
                .collect();
            Segment {
                id,
                marker: id.marker(),
                texts,
            }
        })
        .collect()
}

/// Drop segments that have no text in any language.
pub fn validate_segments(segments: Vec<Segment>) -> Vec<Segment> {
    segments
        .into_iter()
        .filter(|segment| {
            let blank = segment.is_blank();
            if blank {
                log::warn!("Dropping segment {} with no text in any language", segment.id);
            }
            !blank
        })
        .collect()
}
