use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four hard-coded text variants shipped with the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "la")]
    La,
    #[serde(rename = "la-ua")]
    LaUa,
    #[serde(rename = "fr")]
    Fr,
    #[serde(rename = "fr-ua")]
    FrUa,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown language code: {0}")]
pub struct UnknownLanguage(pub String);

impl Language {
    /// All languages in default layout order (TL, TR, BL, BR).
    pub const ALL: [Language; 4] = [Language::La, Language::LaUa, Language::Fr, Language::FrUa];

    pub fn code(self) -> &'static str {
        match self {
            Language::La => "la",
            Language::LaUa => "la-ua",
            Language::Fr => "fr",
            Language::FrUa => "fr-ua",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Language::La => "Latin",
            Language::LaUa => "Ukrainian (from Latin)",
            Language::Fr => "French",
            Language::FrUa => "Ukrainian (from French)",
        }
    }

    /// Verbatim languages keep the edition's original line breaks and line
    /// numbering. Only the Latin source does; the rest flow as prose.
    pub fn is_verbatim(self) -> bool {
        matches!(self, Language::La)
    }

    pub fn is_ukrainian_translation(self) -> bool {
        self.code().ends_with("-ua")
    }

    /// Source languages ship a pre-built term index.
    pub fn has_index(self) -> bool {
        matches!(self, Language::La | Language::Fr)
    }

    /// File name of this language's text (and index) JSON.
    pub fn file_name(self) -> String {
        format!("{}.json", self.code())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.code() == s)
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}
