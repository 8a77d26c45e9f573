//! Line-number → segment resolution for the verbatim (Latin) text.
//!
//! The term index refers to Latin lines; to highlight the same passage in
//! the other languages we replay the marker scan line by line and read off
//! which segment(s) a given line belongs to. The scan is an explicit fold:
//! each line turns an accumulator `(line counter, active segment)` into the
//! next one and yields a [`LineState`] describing that line.

use serde::{Deserialize, Serialize};

use crate::models::{Page, TextData};
use crate::segments::{SegmentId, find_markers};

/// How a line is mapped to segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// The segment active at the end of the line (last marker seen wins).
    Single,
    /// Every segment with text on the line, including one carried over
    /// from the previous line.
    #[default]
    Multi,
}

/// What the scan knows about one counted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineState<'a> {
    /// 1-based line number within the page, headings not counted.
    pub number: u32,
    pub text: &'a str,
    /// Segment active when the line begins.
    pub carried_in: Option<SegmentId>,
    /// Markers on this line, left to right.
    pub markers: Vec<SegmentId>,
    /// The first non-blank content of the line is a marker.
    pub starts_with_marker: bool,
}

impl LineState<'_> {
    /// Segment active when the line ends.
    pub fn carried_out(&self) -> Option<SegmentId> {
        self.markers.last().copied().or(self.carried_in)
    }

    /// All segments that have text on this line, in reading order.
    pub fn segments(&self) -> Vec<SegmentId> {
        let carried = self.carried_in.filter(|_| !self.starts_with_marker);
        let mut out: Vec<SegmentId> = Vec::with_capacity(self.markers.len() + 1);
        for id in carried.into_iter().chain(self.markers.iter().copied()) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }

    pub fn resolve(&self, resolution: Resolution) -> Vec<SegmentId> {
        match resolution {
            Resolution::Single => self.carried_out().into_iter().collect(),
            Resolution::Multi => self.segments(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ScanAcc {
    line: u32,
    active: Option<SegmentId>,
}

impl ScanAcc {
    fn step(self, text: &str) -> (ScanAcc, LineState<'_>) {
        let found: Vec<_> = find_markers(text).collect();
        let starts_with_marker = found
            .first()
            .is_some_and(|m| text[..m.start].trim().is_empty());

        let state = LineState {
            number: self.line + 1,
            text,
            carried_in: self.active,
            markers: found.iter().map(|m| m.id).collect(),
            starts_with_marker,
        };
        let next = ScanAcc {
            line: state.number,
            active: state.carried_out(),
        };
        (next, state)
    }
}

/// Lazily scan a page's body lines, headings skipped.
pub fn scan_lines(page: &Page) -> impl Iterator<Item = LineState<'_>> {
    page.body_paragraphs()
        .flat_map(|p| p.lines())
        .scan(ScanAcc::default(), |acc, line| {
            let (next, state) = acc.step(line);
            *acc = next;
            Some(state)
        })
}

/// Find the state of `target_line` on `page_number`, stopping the scan there.
pub fn line_state(text: &TextData, page_number: u32, target_line: u32) -> Option<LineState<'_>> {
    if target_line == 0 {
        return None;
    }
    let page = text.page(page_number)?;
    scan_lines(page)
        .take_while(|state| state.number <= target_line)
        .find(|state| state.number == target_line)
}

/// Segment active at the end of the target line.
pub fn resolve_segment_for_line(
    text: &TextData,
    page_number: u32,
    target_line: u32,
) -> Option<SegmentId> {
    line_state(text, page_number, target_line).and_then(|state| state.carried_out())
}

/// Every segment with text on the target line; empty when the page or line
/// does not exist.
pub fn resolve_segments_for_line(
    text: &TextData,
    page_number: u32,
    target_line: u32,
) -> Vec<SegmentId> {
    resolve_line(text, page_number, target_line, Resolution::Multi)
}

pub fn resolve_line(
    text: &TextData,
    page_number: u32,
    target_line: u32,
    resolution: Resolution,
) -> Vec<SegmentId> {
    line_state(text, page_number, target_line)
        .map(|state| state.resolve(resolution))
        .unwrap_or_default()
}

/// Kind of a piece of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Text,
    Marker,
}

/// A piece of one line, tagged with the segment it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePart<'a> {
    pub kind: PartKind,
    pub content: &'a str,
    /// `None` for text before the first marker of the page.
    pub segment: Option<SegmentId>,
}

/// Split a line into text and marker parts, continuing `carried_in` until
/// the first marker.
pub fn split_line(line: &str, carried_in: Option<SegmentId>) -> Vec<LinePart<'_>> {
    let mut parts = Vec::new();
    let mut current = carried_in;
    let mut last = 0;

    for m in find_markers(line) {
        if m.start > last {
            parts.push(LinePart {
                kind: PartKind::Text,
                content: &line[last..m.start],
                segment: current,
            });
        }
        parts.push(LinePart {
            kind: PartKind::Marker,
            content: &line[m.start..m.end],
            segment: Some(m.id),
        });
        current = Some(m.id);
        last = m.end;
    }

    if last < line.len() {
        parts.push(LinePart {
            kind: PartKind::Text,
            content: &line[last..],
            segment: current,
        });
    }

    parts
}
