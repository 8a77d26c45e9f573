use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Matches inline segment markers such as `(1)`, `(6a)` or `(6а)`.
///
/// Group 1 is the number, group 2 the optional one-letter suffix (Latin or
/// Cyrillic).
pub fn marker_regex() -> &'static Regex {
    static MARKER_REGEX: OnceLock<Regex> = OnceLock::new();
    MARKER_REGEX
        .get_or_init(|| Regex::new(r"\((\d+)([a-zа-яіїєґѕ]?)\)").expect("Invalid marker regex"))
}

/// Cyrillic letters that are visually identical to a Latin letter.
const CYRILLIC_LOOKALIKES: &[(char, char)] = &[
    ('а', 'a'),
    ('е', 'e'),
    ('і', 'i'),
    ('о', 'o'),
    ('р', 'p'),
    ('с', 'c'),
    ('у', 'y'),
    ('х', 'x'),
    ('ѕ', 's'),
    ('А', 'A'),
    ('В', 'B'),
    ('Е', 'E'),
    ('І', 'I'),
    ('К', 'K'),
    ('М', 'M'),
    ('Н', 'H'),
    ('О', 'O'),
    ('Р', 'P'),
    ('С', 'C'),
    ('Т', 'T'),
    ('Х', 'X'),
    ('Ѕ', 'S'),
];

/// Letters allowed as an id suffix: the lowercase class of [`marker_regex`].
fn is_suffix_letter(c: char) -> bool {
    c.is_ascii_lowercase() || ('а'..='я').contains(&c) || "іїєґѕ".contains(c)
}

/// Map a Cyrillic lookalike to its Latin twin; other chars pass through.
pub fn latin_lookalike(c: char) -> char {
    CYRILLIC_LOOKALIKES
        .iter()
        .find(|(cyr, _)| *cyr == c)
        .map(|(_, lat)| *lat)
        .unwrap_or(c)
}

pub fn has_cyrillic_lookalike(s: &str) -> bool {
    s.chars().any(|c| latin_lookalike(c) != c)
}

/// Stable cross-language id of a segment: a number plus an optional letter.
///
/// Ordering is natural: by number first, then "no letter" before any
/// letter, so `1 < 2 < 2a < 2b < 10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId {
    pub number: u64,
    pub suffix: Option<char>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid segment id: {0:?}")]
pub struct InvalidSegmentId(pub String);

impl SegmentId {
    pub fn new(number: u64, suffix: Option<char>) -> Self {
        Self {
            number,
            suffix: suffix.map(latin_lookalike),
        }
    }

    /// Build an id from the two capture groups of [`marker_regex`].
    fn from_parts(digits: &str, letter: &str) -> Option<Self> {
        let number = digits.parse().ok()?;
        let mut chars = letter.chars();
        let suffix = chars.next();
        if chars.next().is_some() {
            return None;
        }
        Some(Self::new(number, suffix))
    }

    /// The marker as it appears in normalized text, e.g. `(6a)`.
    pub fn marker(&self) -> String {
        format!("({self})")
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number)?;
        if let Some(c) = self.suffix {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl FromStr for SegmentId {
    type Err = InvalidSegmentId;

    /// Accepts a bare id (`6a`) or a full marker (`(6a)`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed);
        let split = inner
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(inner.len());
        let (digits, letter) = inner.split_at(split);
        let valid_letter = letter.chars().all(is_suffix_letter);
        if digits.is_empty() || !valid_letter {
            return Err(InvalidSegmentId(s.to_string()));
        }
        Self::from_parts(digits, letter).ok_or_else(|| InvalidSegmentId(s.to_string()))
    }
}

impl Serialize for SegmentId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SegmentId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A marker found in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch {
    pub id: SegmentId,
    /// Byte range of the whole `(…)` marker.
    pub start: usize,
    pub end: usize,
}

/// All markers in `text`, left to right.
pub fn find_markers(text: &str) -> impl Iterator<Item = MarkerMatch> + '_ {
    marker_regex().captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let Some(id) = SegmentId::from_parts(caps.get(1)?.as_str(), caps.get(2)?.as_str()) else {
            log::warn!("Ignoring segment marker {} with an out-of-range number", whole.as_str());
            return None;
        };
        Some(MarkerMatch {
            id,
            start: whole.start(),
            end: whole.end(),
        })
    })
}

/// Natural ordering of two id strings.
///
/// Strings that are not valid ids sort as `(0, "")`, i.e. together with
/// and before `0a`.
pub fn compare_segment_ids(a: &str, b: &str) -> Ordering {
    let key = |s: &str| s.parse::<SegmentId>().unwrap_or(SegmentId::new(0, None));
    key(a).cmp(&key(b))
}
