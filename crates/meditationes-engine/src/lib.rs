pub mod convert;
pub mod index;
pub mod io;
pub mod library;
pub mod models;
pub mod page;
pub mod resolver;
pub mod segments;
pub mod state;

// Re-export key types for easier usage
pub use index::{IndexError, IndexSet, LineRef, TermEntry, TermIndex};
pub use io::*;
pub use library::{Library, PageCache};
pub use models::*;
pub use page::{LanguageBlock, PageView, TextUnit};
pub use resolver::{Resolution, resolve_line, resolve_segment_for_line, resolve_segments_for_line};
pub use segments::{Segment, SegmentId};
pub use state::{HighlightedLocation, ReaderState};
