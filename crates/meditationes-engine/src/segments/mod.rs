//! Inline segment markers and cross-language alignment.
//!
//! Every language file carries markers such as `(6a)` inline in its text.
//! [`parser`] splits one language's page into `(id, text)` pairs and
//! [`align`] merges the pairs of all languages into one naturally ordered
//! list of [`Segment`]s.

pub mod align;
pub mod marker;
pub mod parser;

pub use align::{Segment, align_segments, validate_segments};
pub use marker::{
    InvalidSegmentId, MarkerMatch, SegmentId, compare_segment_ids, find_markers,
    has_cyrillic_lookalike, latin_lookalike, marker_regex,
};
pub use parser::{ParsedSegment, flatten_page, parse_segments};
