//! Reader UI state as immutable snapshots.
//!
//! Every action takes the current snapshot and returns the next one; no
//! state lives anywhere else.

use serde::Serialize;

use crate::library::Library;
use crate::models::Language;
use crate::resolver::{Resolution, resolve_line};
use crate::segments::SegmentId;

/// Where index navigation landed; cleared on page change or dismissal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightedLocation {
    pub page: u32,
    pub line: u32,
    pub segments: Vec<SegmentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReaderState {
    pub current_page: u32,
    pub total_pages: u32,
    /// Display order of the language blocks (TL, TR, BL, BR).
    pub layout: Vec<Language>,
    pub hovered_segment: Option<SegmentId>,
    pub highlighted: Option<HighlightedLocation>,
    pub index_open: bool,
    pub resolution: Resolution,
}

impl ReaderState {
    pub fn new(library: &Library) -> Self {
        Self {
            current_page: 1,
            total_pages: library.total_pages(),
            layout: Language::ALL.to_vec(),
            hovered_segment: None,
            highlighted: None,
            index_open: false,
            resolution: Resolution::default(),
        }
    }

    pub fn with_layout(&self, layout: Vec<Language>) -> Self {
        Self {
            layout,
            ..self.clone()
        }
    }

    pub fn with_resolution(&self, resolution: Resolution) -> Self {
        Self {
            resolution,
            ..self.clone()
        }
    }

    /// Move to `page`, clamped into range. Leaving the page drops the
    /// highlight and hover.
    pub fn go_to_page(&self, library: &Library, page: i64) -> Self {
        let current_page = library.clamp_page(page);
        if current_page == self.current_page {
            return self.clone();
        }
        Self {
            current_page,
            total_pages: library.total_pages(),
            hovered_segment: None,
            highlighted: None,
            ..self.clone()
        }
    }

    pub fn next_page(&self, library: &Library) -> Self {
        self.go_to_page(library, i64::from(self.current_page) + 1)
    }

    pub fn previous_page(&self, library: &Library) -> Self {
        self.go_to_page(library, i64::from(self.current_page) - 1)
    }

    /// Jump to a line referenced by the term index and highlight it.
    ///
    /// Without an explicit segment the segments are resolved from the
    /// Latin line numbering. Closes the index.
    pub fn navigate_to(
        &self,
        library: &Library,
        page: i64,
        line: u32,
        segment: Option<SegmentId>,
    ) -> Self {
        let page = library.clamp_page(page);
        let segments = match segment {
            Some(id) => vec![id],
            None => library
                .text(Language::La)
                .map(|latin| resolve_line(latin, page, line, self.resolution))
                .unwrap_or_default(),
        };

        Self {
            current_page: page,
            total_pages: library.total_pages(),
            hovered_segment: None,
            highlighted: Some(HighlightedLocation {
                page,
                line,
                segments,
            }),
            index_open: false,
            ..self.clone()
        }
    }

    pub fn clear_highlight(&self) -> Self {
        Self {
            highlighted: None,
            ..self.clone()
        }
    }

    /// Open or close the index; `None` flips it.
    pub fn toggle_index(&self, open: Option<bool>) -> Self {
        Self {
            index_open: open.unwrap_or(!self.index_open),
            ..self.clone()
        }
    }

    pub fn hover(&self, segment: Option<SegmentId>) -> Self {
        Self {
            hovered_segment: segment,
            ..self.clone()
        }
    }

    /// Highlight on the page currently shown, if any.
    pub fn active_highlight(&self) -> Option<&HighlightedLocation> {
        self.highlighted
            .as_ref()
            .filter(|h| h.page == self.current_page)
    }

    pub fn is_segment_highlighted(&self, id: SegmentId) -> bool {
        self.active_highlight()
            .is_some_and(|h| h.segments.contains(&id))
    }
}
