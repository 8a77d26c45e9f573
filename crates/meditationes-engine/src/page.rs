//! Per-page view data, derived from the loaded texts and never persisted.

use serde::Serialize;

use crate::models::{HeadingLevel, Language, Page, Paragraph};
use crate::resolver::scan_lines;
use crate::segments::{Segment, SegmentId, find_markers};

/// One language's content for the page being viewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageBlock {
    pub language: Language,
    pub page: Page,
    /// Longest line, only for verbatim languages.
    pub max_line_length: Option<usize>,
}

/// A renderable unit: one line (verbatim) or one sub-paragraph (flowing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextUnit {
    pub text: String,
    pub heading: Option<HeadingLevel>,
    pub indent: bool,
    /// Verbatim only.
    pub line_number: Option<u32>,
    pub last_in_paragraph: bool,
    /// Segment the unit's first text belongs to.
    pub initial_segment: Option<SegmentId>,
}

fn final_segment(text: &str, initial: Option<SegmentId>) -> Option<SegmentId> {
    find_markers(text).last().map(|m| m.id).or(initial)
}

impl LanguageBlock {
    pub fn new(language: Language, page: Page) -> Self {
        let max_line_length = language.is_verbatim().then(|| page.max_line_length());
        Self {
            language,
            page,
            max_line_length,
        }
    }

    pub fn units(&self) -> Vec<TextUnit> {
        if self.language.is_verbatim() {
            self.verbatim_units()
        } else {
            self.flowing_units()
        }
    }

    fn heading_unit(level: HeadingLevel, lines: &[String]) -> TextUnit {
        TextUnit {
            text: lines.join(" "),
            heading: Some(level),
            indent: false,
            line_number: None,
            last_in_paragraph: true,
            initial_segment: None,
        }
    }

    /// Every body line is its own numbered unit.
    fn verbatim_units(&self) -> Vec<TextUnit> {
        let mut states = scan_lines(&self.page);
        let mut units = Vec::new();

        for paragraph in &self.page.paragraphs {
            match paragraph {
                Paragraph::Heading { level, lines } => {
                    units.push(Self::heading_unit(*level, lines));
                }
                Paragraph::Body { lines, .. } => {
                    for i in 0..lines.len() {
                        let Some(state) = states.next() else { break };
                        units.push(TextUnit {
                            text: state.text.to_string(),
                            heading: None,
                            indent: state.text.starts_with(' '),
                            line_number: Some(state.number),
                            last_in_paragraph: lines.get(i + 1).is_none_or(|n| n.starts_with(' ')),
                            initial_segment: state.carried_in,
                        });
                    }
                }
            }
        }

        units
    }

    /// Lines are merged into sub-paragraphs, split at leading spaces.
    fn flowing_units(&self) -> Vec<TextUnit> {
        let mut units = Vec::new();
        let mut current: Option<SegmentId> = None;

        let mut flush = |lines: &mut Vec<&str>, indent: bool, units: &mut Vec<TextUnit>| {
            if lines.is_empty() {
                return;
            }
            let text = lines.join(" ");
            units.push(TextUnit {
                text: text.clone(),
                heading: None,
                indent,
                line_number: None,
                last_in_paragraph: true,
                initial_segment: current,
            });
            current = final_segment(&text, current);
            lines.clear();
        };

        for paragraph in &self.page.paragraphs {
            match paragraph {
                Paragraph::Heading { level, lines } => {
                    units.push(Self::heading_unit(*level, lines));
                }
                Paragraph::Body { lines, .. } => {
                    let mut pending: Vec<&str> = Vec::new();
                    let mut indent = false;
                    for (i, line) in lines.iter().enumerate() {
                        let leading_space = line.starts_with(' ');
                        if leading_space && !pending.is_empty() {
                            flush(&mut pending, indent, &mut units);
                            indent = true;
                        } else if i == 0 {
                            indent = leading_space;
                        }
                        pending.push(line.trim_start());
                    }
                    flush(&mut pending, indent, &mut units);
                }
            }
        }

        units
    }
}

/// Everything needed to show one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub page_number: u32,
    pub total_pages: u32,
    /// Languages loaded this session, whether or not they have this page.
    pub available_languages: Vec<Language>,
    /// Languages that have this page, in [`Language::ALL`] order.
    pub blocks: Vec<LanguageBlock>,
    /// Aligned, validated segments across all blocks.
    pub segments: Vec<Segment>,
}

impl PageView {
    pub fn block(&self, language: Language) -> Option<&LanguageBlock> {
        self.blocks.iter().find(|b| b.language == language)
    }

    /// Blocks ordered by `layout`, skipping languages without this page.
    pub fn blocks_in_layout<'a>(&'a self, layout: &'a [Language]) -> impl Iterator<Item = &'a LanguageBlock> {
        layout.iter().filter_map(|language| self.block(*language))
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }
}
