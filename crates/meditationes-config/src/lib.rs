use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

fn read_toml<T: DeserializeOwned>(config_path: &Path) -> Result<Option<T>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }

    let content =
        std::fs::read_to_string(config_path).map_err(|source| ConfigError::ConfigReadError {
            config_path: config_path.to_path_buf(),
            source,
        })?;

    toml::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::ConfigParseError {
            config_path: config_path.to_path_buf(),
            source,
        })
}

fn write_toml<T: Serialize>(value: &T, config_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(value)?;
    std::fs::write(config_path, content)?;
    Ok(())
}

fn config_dir() -> PathBuf {
    let config_dir = shellexpand::tilde("~/.config/meditationes");
    PathBuf::from(config_dir.as_ref())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `la.json`, `la-ua.json`, `fr.json`, `fr-ua.json`.
    pub texts_path: PathBuf,
    /// Term index directory; defaults to `index/` next to the texts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_path: Option<PathBuf>,
    /// Highlight colour name, e.g. `yellow`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    /// `multi` (default) or `single` line-to-segment resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

impl Config {
    pub fn new(texts_path: impl Into<PathBuf>) -> Self {
        Self {
            texts_path: texts_path.into(),
            index_path: None,
            highlight: None,
            resolution: None,
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let Some(mut config) = read_toml::<Config>(config_path.as_ref())? else {
            return Ok(None);
        };

        // Expand shell variables and tilde in the loaded paths
        config.texts_path = Self::expand_path(&config.texts_path).unwrap_or(config.texts_path);
        config.index_path = config
            .index_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        write_toml(self, config_path.as_ref())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

/// What the reader remembers between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Language codes in display order.
    #[serde(default = "default_layout")]
    pub language_layout: Vec<String>,
    #[serde(default = "default_page")]
    pub current_page: u32,
}

fn default_layout() -> Vec<String> {
    ["la", "la-ua", "fr", "fr-ua"].map(String::from).to_vec()
}

fn default_page() -> u32 {
    1
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language_layout: default_layout(),
            current_page: default_page(),
        }
    }
}

impl Preferences {
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Option<Self>, ConfigError> {
        read_toml(path.as_ref())
    }

    /// Saved preferences, or defaults when none exist or they can't be read.
    pub fn load_or_default() -> Self {
        Self::load_from_path(Self::preferences_path())
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        write_toml(self, path.as_ref())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(Self::preferences_path())
    }

    pub fn preferences_path() -> PathBuf {
        config_dir().join("reader-state.toml")
    }
}
