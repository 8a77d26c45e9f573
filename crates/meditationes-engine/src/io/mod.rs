use crate::index::{IndexError, IndexSet, TermIndex};
use crate::models::{Language, TextData, TextError};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse {language} text: {source}")]
    Malformed {
        language: Language,
        source: TextError,
    },
    #[error("No language files could be loaded")]
    NothingLoaded,
    #[error("Invalid texts directory: {0}")]
    InvalidTextsDir(String),
}

/// Where language and index files come from.
pub trait TextSource: Sync {
    fn fetch_text(&self, language: Language) -> Result<String, IoError>;
    fn fetch_index(&self, language: Language) -> Result<String, IoError>;
}

/// Reads `<texts_dir>/<code>.json` and `<index_dir>/<code>.json`.
#[derive(Debug, Clone)]
pub struct DirSource {
    texts_dir: PathBuf,
    index_dir: PathBuf,
}

impl DirSource {
    /// The index directory defaults to a sibling `index/` of the texts dir.
    pub fn new(texts_dir: impl Into<PathBuf>) -> Self {
        let texts_dir = texts_dir.into();
        let index_dir = texts_dir
            .parent()
            .map(|parent| parent.join("index"))
            .unwrap_or_else(|| PathBuf::from("index"));
        Self {
            texts_dir,
            index_dir,
        }
    }

    pub fn with_index_dir(mut self, index_dir: impl Into<PathBuf>) -> Self {
        self.index_dir = index_dir.into();
        self
    }

    pub fn texts_dir(&self) -> &Path {
        &self.texts_dir
    }
}

fn read_existing(path: PathBuf) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path));
    }
    fs::read_to_string(&path).map_err(IoError::Io)
}

impl TextSource for DirSource {
    fn fetch_text(&self, language: Language) -> Result<String, IoError> {
        read_existing(self.texts_dir.join(language.file_name()))
    }

    fn fetch_index(&self, language: Language) -> Result<String, IoError> {
        read_existing(self.index_dir.join(language.file_name()))
    }
}

/// In-memory files, e.g. texts embedded in a binary.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub texts: BTreeMap<Language, String>,
    pub indices: BTreeMap<Language, String>,
}

impl MemorySource {
    pub fn with_text(mut self, language: Language, json: impl Into<String>) -> Self {
        self.texts.insert(language, json.into());
        self
    }

    pub fn with_index(mut self, language: Language, json: impl Into<String>) -> Self {
        self.indices.insert(language, json.into());
        self
    }
}

impl TextSource for MemorySource {
    fn fetch_text(&self, language: Language) -> Result<String, IoError> {
        self.texts
            .get(&language)
            .cloned()
            .ok_or_else(|| IoError::NotFound(PathBuf::from(language.file_name())))
    }

    fn fetch_index(&self, language: Language) -> Result<String, IoError> {
        self.indices
            .get(&language)
            .cloned()
            .ok_or_else(|| IoError::NotFound(PathBuf::from(language.file_name())))
    }
}

/// Outcome of loading every language: what loaded and what did not.
#[derive(Debug)]
pub struct LoadedTexts {
    pub texts: BTreeMap<Language, TextData>,
    /// One entry per language that failed; each was logged as a warning.
    pub failures: Vec<(Language, IoError)>,
}

impl LoadedTexts {
    /// The warning lines logged for `failures`, in the same order.
    pub fn warnings(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|(language, e)| load_warning(*language, e))
            .collect()
    }
}

fn load_warning(language: Language, e: &IoError) -> String {
    format!("Error loading {language}: {e}")
}

fn load_text(source: &impl TextSource, language: Language) -> Result<TextData, IoError> {
    let json = source.fetch_text(language)?;
    TextData::from_json(&json).map_err(|source| IoError::Malformed { language, source })
}

/// Fetch all four languages in parallel.
///
/// A language that is missing or malformed is logged and left out. The
/// load only fails when no language at all could be read.
pub fn load_all_texts(source: &impl TextSource) -> Result<LoadedTexts, IoError> {
    let results: Vec<(Language, Result<TextData, IoError>)> = Language::ALL
        .par_iter()
        .map(|&language| (language, load_text(source, language)))
        .collect();

    let mut texts = BTreeMap::new();
    let mut failures = Vec::new();
    for (language, result) in results {
        match result {
            Ok(data) => {
                log::debug!("Loaded {language}: {} pages", data.page_count());
                texts.insert(language, data);
            }
            Err(e) => {
                log::warn!("{}", load_warning(language, &e));
                failures.push((language, e));
            }
        }
    }

    if texts.is_empty() {
        return Err(IoError::NothingLoaded);
    }

    Ok(LoadedTexts { texts, failures })
}

/// Load the Latin and French term indices. Both are required.
pub fn load_index_set(source: &impl TextSource) -> Result<IndexSet, IndexError> {
    let load = |language: Language| -> Result<TermIndex, IndexError> {
        let json = source.fetch_index(language).map_err(|e| IndexError::Load {
            language,
            reason: e.to_string(),
        })?;
        TermIndex::from_json(&json)
    };

    Ok(IndexSet {
        latin: load(Language::La)?,
        french: load(Language::Fr)?,
    })
}

pub fn validate_texts_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidTextsDir(
            "Directory does not exist".to_string(),
        ));
    }

    let has_any = Language::ALL
        .into_iter()
        .any(|language| path.join(language.file_name()).is_file());
    if !has_any {
        return Err(IoError::InvalidTextsDir(
            "no language files (la.json, la-ua.json, fr.json, fr-ua.json) found".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PAGE_JSON: &str =
        r#"{ "pages": [{ "pageNumber": 1, "paragraphs": [{ "lines": ["(1) Cogito"] }] }] }"#;

    fn create_texts_dir(languages: &[Language]) -> TempDir {
        let dir = TempDir::new().unwrap();
        let texts = dir.path().join("text");
        fs::create_dir(&texts).unwrap();
        for language in languages {
            fs::write(texts.join(language.file_name()), PAGE_JSON).unwrap();
        }
        dir
    }

    #[test]
    fn test_load_from_directory() {
        let dir = create_texts_dir(&Language::ALL);
        let source = DirSource::new(dir.path().join("text"));

        let loaded = load_all_texts(&source).unwrap();
        assert_eq!(loaded.texts.len(), 4);
        assert!(loaded.failures.is_empty());
    }

    #[test]
    fn test_missing_language_is_tolerated() {
        let dir = create_texts_dir(&[Language::La, Language::LaUa, Language::Fr]);
        let source = DirSource::new(dir.path().join("text"));

        let loaded = load_all_texts(&source).unwrap();
        assert_eq!(loaded.texts.len(), 3);
        assert_eq!(loaded.failures.len(), 1);
        assert_eq!(loaded.failures[0].0, Language::FrUa);
        assert!(matches!(loaded.failures[0].1, IoError::NotFound(_)));

        let warnings = loaded.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Error loading fr-ua: File not found"));
        assert!(warnings[0].ends_with("fr-ua.json"));
    }

    #[test]
    fn test_malformed_language_is_tolerated() {
        let source = MemorySource::default()
            .with_text(Language::La, PAGE_JSON)
            .with_text(Language::Fr, "{ not json");

        let loaded = load_all_texts(&source).unwrap();
        assert_eq!(loaded.texts.keys().copied().collect::<Vec<_>>(), vec![Language::La]);
        assert!(loaded
            .failures
            .iter()
            .any(|(l, e)| *l == Language::Fr && matches!(e, IoError::Malformed { .. })));
    }

    #[test]
    fn test_nothing_loaded_is_fatal() {
        let result = load_all_texts(&MemorySource::default());
        assert!(matches!(result, Err(IoError::NothingLoaded)));
    }

    #[test]
    fn test_index_dir_defaults_to_sibling() {
        let source = DirSource::new("/data/meditations/text");
        assert_eq!(source.index_dir, PathBuf::from("/data/meditations/index"));
        let custom = source.with_index_dir("/elsewhere");
        assert_eq!(custom.index_dir, PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_index_set_requires_both_languages() {
        let source = MemorySource::default().with_index(Language::La, "[]");
        let err = load_index_set(&source).unwrap_err();
        assert!(err.to_string().contains("fr index"));

        let source = source.with_index(Language::Fr, "[]");
        assert!(load_index_set(&source).is_ok());
    }

    #[test]
    fn test_validate_texts_dir() {
        let dir = create_texts_dir(&[Language::La]);
        assert!(validate_texts_dir(&dir.path().join("text")).is_ok());
        assert!(matches!(
            validate_texts_dir(dir.path()),
            Err(IoError::InvalidTextsDir(_))
        ));
        assert!(validate_texts_dir(Path::new("/nonexistent/path")).is_err());
    }
}
