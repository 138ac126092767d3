//! Startup store selection.
//!
//! # Responsibility
//! - Resolve which gateway backend to open and where its data lives.
//! - Read overrides from `TASKDECK_*` environment variables.
//!
//! # Invariants
//! - Parsing is a pure function of the lookup; [`StoreConfig::from_env`] is
//!   only a thin adapter over it.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const STORE_ENV: &str = "TASKDECK_STORE";
pub const DATA_DIR_ENV: &str = "TASKDECK_DATA_DIR";
pub const FILE_NAME_ENV: &str = "TASKDECK_FILE_NAME";

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_JSON_FILE_NAME: &str = "todos.json";
const DEFAULT_SQLITE_FILE_NAME: &str = "tasks.sqlite3";

/// Persistence backend chosen at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    #[default]
    JsonFile,
    Sqlite,
    Memory,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JsonFile => "json",
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" | "json_file" | "file" => Ok(Self::JsonFile),
            "sqlite" | "table" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::UnsupportedStore(other.to_string())),
        }
    }

    fn default_file_name(self) -> &'static str {
        match self {
            Self::JsonFile | Self::Memory => DEFAULT_JSON_FILE_NAME,
            Self::Sqlite => DEFAULT_SQLITE_FILE_NAME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedStore(String),
    EmptyValue(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedStore(value) => {
                write!(f, "unsupported store `{value}`; expected json|sqlite|memory")
            }
            Self::EmptyValue(key) => write!(f, "`{key}` is set but empty"),
        }
    }
}

impl Error for ConfigError {}

/// Where and how tasks are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub data_dir: PathBuf,
    /// `None` uses the backend's default file name.
    pub file_name: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            file_name: None,
        }
    }
}

impl StoreConfig {
    /// Reads `TASKDECK_STORE`, `TASKDECK_DATA_DIR` and `TASKDECK_FILE_NAME`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    ///
    /// Unset keys keep defaults; keys set to blank strings are rejected.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = non_blank(&lookup, STORE_ENV)? {
            config.kind = StoreKind::parse(&raw)?;
        }
        if let Some(raw) = non_blank(&lookup, DATA_DIR_ENV)? {
            config.data_dir = PathBuf::from(raw);
        }
        config.file_name = non_blank(&lookup, FILE_NAME_ENV)?;

        Ok(config)
    }

    /// Full path of the store file. Not used by [`StoreKind::Memory`].
    pub fn store_path(&self) -> PathBuf {
        let file_name = self
            .file_name
            .as_deref()
            .unwrap_or_else(|| self.kind.default_file_name());
        self.data_dir.join(file_name)
    }
}

fn non_blank(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<String>, ConfigError> {
    match lookup(key) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue(key)),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}
