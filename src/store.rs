//! Local durable key-value storage for history and custom rules
//!
//! Two string entries are kept: the JSON-serialized history list and the raw
//! rules text. Both are read once at startup and overwritten on every change.
//! Reads never fail from the caller's point of view: a missing or corrupt
//! entry loads as empty.

use crate::history::{HistoryList, HistoryRecord};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const HISTORY_KEY: &str = "translation_history";
pub const RULES_KEY: &str = "translation_rules";

/// Error types for storage backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Reading or writing the backing medium failed
    Io(String),
    /// A value could not be encoded
    Serialization(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "Storage I/O error: {}", msg),
            StoreError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// String-keyed storage backend
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// In-process store, used by tests and as a fallback when no data directory exists
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed an entry, e.g. with deliberately corrupt data
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Io("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Io("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir`, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            StoreError::Io(format!(
                "Failed to create data directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    /// The platform data directory for this application, if one can be determined
    pub fn default_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "tsuyaku", "tsuyaku")
            .map(|dirs| dirs.data_dir().to_path_buf())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(name)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a sibling temp file, then rename over the old value
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Typed adapter over a [`KeyValueStore`]
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored history, or an empty list if it is missing or unreadable
    pub fn load_history(&self) -> HistoryList {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return HistoryList::new(),
            Err(e) => {
                tracing::warn!("Failed to read history, starting empty: {}", e);
                return HistoryList::new();
            }
        };

        match serde_json::from_str::<Vec<HistoryRecord>>(&raw) {
            Ok(records) => HistoryList::from_records(records),
            Err(e) => {
                tracing::warn!("Stored history is corrupt, starting empty: {}", e);
                HistoryList::new()
            }
        }
    }

    pub fn save_history(&self, history: &HistoryList) -> StoreResult<()> {
        let json = serde_json::to_string(history.as_slice())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.set(HISTORY_KEY, &json)
    }

    /// Stored rules, or an empty string
    pub fn load_rules(&self) -> String {
        match self.store.get(RULES_KEY) {
            Ok(rules) => rules.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Failed to read custom rules: {}", e);
                String::new()
            }
        }
    }

    pub fn save_rules(&self, rules: &str) -> StoreResult<()> {
        self.store.set(RULES_KEY, rules)
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence").finish_non_exhaustive()
    }
}
