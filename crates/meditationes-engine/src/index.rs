//! Pre-built term index (read-only reference data).
//!
//! The index files are produced outside this project. Two occurrence shapes
//! exist in the wild: a flat `{ section, page, lines }` per page and a
//! nested `{ section, count, pages: [{ page, lines }] }` per section. Both
//! are accepted.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::Language;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Malformed index JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to load {language} index: {reason}")]
    Load { language: Language, reason: String },
}

/// A count written either as a number or as a string such as `"3*"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Count {
    Number(u64),
    Text(String),
}

impl Count {
    pub fn is_positive(&self) -> bool {
        match self {
            Count::Number(n) => *n > 0,
            Count::Text(s) => !s.trim().is_empty() && s.trim() != "0",
        }
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Count::Number(n) => write!(f, "{n}"),
            Count::Text(s) => f.write_str(s),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationTerm {
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Count>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageTranslation {
    pub language: String,
    #[serde(default)]
    pub terms: Vec<TranslationTerm>,
    #[serde(default)]
    pub special_terms: Vec<TranslationTerm>,
}

/// Translations of a term, keyed by language (`fr`, `ua`, `la`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Translations {
    ByLanguage(BTreeMap<String, Vec<TranslationTerm>>),
    List(Vec<LanguageTranslation>),
}

impl Default for Translations {
    fn default() -> Self {
        Translations::ByLanguage(BTreeMap::new())
    }
}

impl Translations {
    pub fn terms_for(&self, language: &str) -> Vec<&TranslationTerm> {
        match self {
            Translations::ByLanguage(map) => {
                map.get(language).map(|v| v.iter().collect()).unwrap_or_default()
            }
            Translations::List(list) => list
                .iter()
                .filter(|t| t.language == language)
                .flat_map(|t| t.terms.iter().chain(&t.special_terms))
                .collect(),
        }
    }
}

/// One reference to a line (Latin) or segment (French) of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRef {
    /// 0 when the reference is by segment only.
    #[serde(default)]
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(default)]
    pub is_title: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_in_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier3: Option<String>,
}

impl LineRef {
    /// Short label for listings: the line number, or the segment id for
    /// segment-only references, with a title mark. A note replaces both.
    pub fn label(&self) -> String {
        if let Some(note) = &self.note {
            return note.clone();
        }
        let mut label = match (&self.segment, self.line) {
            (Some(segment), 0) => segment.clone(),
            (_, 0) => String::new(),
            (_, line) => line.to_string(),
        };
        if self.is_title {
            label.push_str(" (tit)");
        }
        label
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOccurrence {
    pub page: u32,
    #[serde(default)]
    pub lines: Vec<LineRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionOccurrence {
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Count>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<LineRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageOccurrence>,
}

impl SectionOccurrence {
    /// `(page, lines)` pairs regardless of which shape the file used.
    pub fn page_occurrences(&self) -> impl Iterator<Item = (u32, &[LineRef])> {
        let flat = self.page.map(|page| (page, self.lines.as_slice()));
        flat.into_iter()
            .chain(self.pages.iter().map(|p| (p.page, p.lines.as_slice())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub term: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub translations: Translations,
    #[serde(default)]
    pub occurrences: Vec<SectionOccurrence>,
}

/// All terms of one language's index file (a JSON array).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermIndex {
    pub entries: Vec<TermEntry>,
}

impl TermIndex {
    pub fn from_json(json: &str) -> Result<Self, IndexError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn get(&self, id: &str) -> Option<&TermEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Terms whose text contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&TermEntry> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.term.to_lowercase().contains(&needle))
            .collect()
    }

    /// Map each line of `page` to the ids of the terms occurring on it.
    ///
    /// Segment-only references (line 0) are skipped. Ids per line are
    /// deduplicated and keep first-seen order.
    pub fn lines_with_terms(&self, page: u32) -> BTreeMap<u32, Vec<String>> {
        let mut map: BTreeMap<u32, Vec<String>> = BTreeMap::new();

        for entry in &self.entries {
            for occurrence in &entry.occurrences {
                for (_, lines) in occurrence.page_occurrences().filter(|(p, _)| *p == page) {
                    for line_ref in lines.iter().filter(|l| l.line > 0) {
                        let ids = map.entry(line_ref.line).or_default();
                        if !ids.contains(&entry.id) {
                            ids.push(entry.id.clone());
                        }
                    }
                }
            }
        }

        map
    }
}

/// The two source-language indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSet {
    pub latin: TermIndex,
    pub french: TermIndex,
}

impl IndexSet {
    pub fn for_language(&self, language: Language) -> Option<&TermIndex> {
        match language {
            Language::La => Some(&self.latin),
            Language::Fr => Some(&self.french),
            Language::LaUa | Language::FrUa => None,
        }
    }
}
