use std::collections::{BTreeMap, HashMap};

use crate::io::LoadedTexts;
use crate::models::{Language, TextData};
use crate::page::{LanguageBlock, PageView};
use crate::segments::{align_segments, flatten_page, validate_segments};

/// Loaded language texts, cached for the whole session.
#[derive(Debug, Clone, Default)]
pub struct Library {
    texts: BTreeMap<Language, TextData>,
}

impl From<LoadedTexts> for Library {
    fn from(loaded: LoadedTexts) -> Self {
        Self::new(loaded.texts)
    }
}

impl Library {
    pub fn new(texts: BTreeMap<Language, TextData>) -> Self {
        Self { texts }
    }

    pub fn text(&self, language: Language) -> Option<&TextData> {
        self.texts.get(&language)
    }

    pub fn languages(&self) -> Vec<Language> {
        self.texts.keys().copied().collect()
    }

    /// Page count of the longest language.
    pub fn total_pages(&self) -> u32 {
        self.texts
            .values()
            .map(|t| t.page_count() as u32)
            .max()
            .unwrap_or(0)
    }

    /// Clamp a requested page into `[1, total_pages]`.
    pub fn clamp_page(&self, page: i64) -> u32 {
        let last = i64::from(self.total_pages().max(1));
        page.clamp(1, last) as u32
    }

    /// Build the view of one page across every loaded language.
    ///
    /// A language that lacks the page is logged and left out; `None` means
    /// no language has it.
    pub fn process_page(&self, page_number: u32) -> Option<PageView> {
        let mut blocks = Vec::new();
        let mut language_texts = BTreeMap::new();

        for (language, data) in &self.texts {
            match data.page(page_number) {
                Some(page) => {
                    language_texts.insert(*language, flatten_page(page, language.is_verbatim()));
                    blocks.push(LanguageBlock::new(*language, page.clone()));
                }
                None => log::warn!("Missing page {page_number} for language {language}"),
            }
        }

        if blocks.is_empty() {
            return None;
        }

        blocks.sort_by_key(|b| Language::ALL.iter().position(|l| *l == b.language));

        Some(PageView {
            page_number,
            total_pages: self.total_pages(),
            available_languages: self.languages(),
            blocks,
            segments: validate_segments(align_segments(&language_texts)),
        })
    }
}

/// Processed pages by page number.
///
/// Entries never go stale: a page's view depends only on the loaded texts.
#[derive(Debug, Default)]
pub struct PageCache {
    pages: HashMap<u32, PageView>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, library: &Library, page_number: u32) -> Option<&PageView> {
        if !self.pages.contains_key(&page_number) {
            let view = library.process_page(page_number)?;
            log::debug!("Cached page {page_number}");
            self.pages.insert(page_number, view);
        }
        self.pages.get(&page_number)
    }

    /// Warm the cache for a page the reader is likely to open next.
    /// Misses are ignored.
    pub fn prefetch(&mut self, library: &Library, page_number: u32) {
        if page_number == 0 || page_number > library.total_pages() {
            return;
        }
        let _ = self.get_or_build(library, page_number);
    }

    pub fn get(&self, page_number: u32) -> Option<&PageView> {
        self.pages.get(&page_number)
    }

    pub fn contains(&self, page_number: u32) -> bool {
        self.pages.contains_key(&page_number)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}
