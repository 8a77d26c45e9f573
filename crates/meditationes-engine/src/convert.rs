//! One-off data preparation: plain-text export → page JSON, and Cyrillic
//! lookalike cleanup inside parentheses.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::models::{Page, Paragraph, TextData};
use crate::segments::{has_cyrillic_lookalike, latin_lookalike};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Start page must be a positive number, got {0}")]
    InvalidStartPage(u32),
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Split a line-numbered text export into pages.
///
/// Blank lines end a page; lines holding only a number (stray line or page
/// numbers) are dropped. Each page becomes one body paragraph with the
/// original lines, formatting untouched.
pub fn markdown_to_text_data(content: &str, start_page: u32) -> Result<TextData, ConvertError> {
    if start_page == 0 {
        return Err(ConvertError::InvalidStartPage(start_page));
    }

    let mut pages = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut page_number = start_page;

    let mut finish_page = |lines: &mut Vec<String>, pages: &mut Vec<Page>| {
        if !lines.is_empty() {
            pages.push(Page::new(page_number, vec![Paragraph::body(lines.drain(..))]));
            page_number += 1;
        }
    };

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            finish_page(&mut current, &mut pages);
        } else if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            current.push(line.to_string());
        }
    }
    finish_page(&mut current, &mut pages);

    Ok(TextData { pages })
}

/// Serialize with four-space indentation, matching the shipped files.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, ConvertError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buf)?)
}

/// Convert `input` and write it to `output`. Returns the page count.
pub fn convert_file(input: &Path, output: &Path, start_page: u32) -> Result<usize, ConvertError> {
    if !input.exists() {
        return Err(ConvertError::NotFound(input.to_path_buf()));
    }
    let content = fs::read_to_string(input)?;
    let data = markdown_to_text_data(&content, start_page)?;
    fs::write(output, to_pretty_json(&data)?)?;
    log::info!("Converted {} to {}", input.display(), output.display());
    Ok(data.page_count())
}

/// `foo.md` → `foo-converted.json`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}-converted.json"))
}

fn parentheses_regex() -> &'static Regex {
    static PARENTHESES_REGEX: OnceLock<Regex> = OnceLock::new();
    PARENTHESES_REGEX.get_or_init(|| Regex::new(r"\([^)]+\)").expect("Invalid parentheses regex"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyrillicFix {
    pub original: String,
    pub fixed: String,
}

/// Replace Cyrillic lookalikes with Latin letters inside every `( … )`.
pub fn fix_cyrillic_in_parentheses(content: &str) -> (String, Vec<CyrillicFix>) {
    let mut changes = Vec::new();
    let fixed = parentheses_regex().replace_all(content, |caps: &Captures| {
        let original = &caps[0];
        if !has_cyrillic_lookalike(original) {
            return original.to_string();
        }
        let fixed: String = original.chars().map(latin_lookalike).collect();
        changes.push(CyrillicFix {
            original: original.to_string(),
            fixed: fixed.clone(),
        });
        fixed
    });
    (fixed.into_owned(), changes)
}

/// Fix one file in place unless `dry_run`.
pub fn fix_cyrillic_file(path: &Path, dry_run: bool) -> Result<Vec<CyrillicFix>, ConvertError> {
    if !path.exists() {
        return Err(ConvertError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let (fixed, changes) = fix_cyrillic_in_parentheses(&content);
    if !changes.is_empty() && !dry_run {
        fs::write(path, fixed)?;
    }
    Ok(changes)
}

/// Fix every `*.json` in `dir`. Files that fail are logged and skipped.
pub fn fix_cyrillic_dir(
    dir: &Path,
    dry_run: bool,
) -> anyhow::Result<Vec<(PathBuf, Vec<CyrillicFix>)>> {
    let pattern = dir.join("*.json");
    let mut results = Vec::new();

    for entry in glob::glob(&pattern.to_string_lossy())? {
        let path = entry?;
        match fix_cyrillic_file(&path, dry_run) {
            Ok(changes) => results.push((path, changes)),
            Err(e) => log::warn!("Error processing {}: {e}", path.display()),
        }
    }

    Ok(results)
}
