//! Persisted key/value state
//!
//! Values are raw strings, usually JSON text, the way browser local storage
//! holds them. `FileStore` keeps them in a TOML table next to the config.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::config_dir;

/// Error type for store operations
#[derive(Debug)]
pub enum StoreError {
    /// Failed to determine config directory
    NoConfigDir,
    Io(io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NoConfigDir => write!(f, "Could not determine config directory"),
            StoreError::Io(e) => write!(f, "IO error: {}", e),
            StoreError::Parse(e) => write!(f, "Parse error: {}", e),
            StoreError::Serialize(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(e: toml::de::Error) -> Self {
        StoreError::Parse(e)
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(e: toml::ser::Error) -> Self {
        StoreError::Serialize(e)
    }
}

/// Key/value store the sharing feature reads from and writes to
pub trait StateStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
    fn keys(&self) -> Vec<String>;
}

/// In-memory store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Store backed by a TOML file; every write is flushed to disk
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: MemoryStore,
}

impl FileStore {
    /// Open `shared_state.toml` in the planner's config directory
    pub fn open_default() -> Result<Self, StoreError> {
        let path = config_dir()
            .ok_or(StoreError::NoConfigDir)?
            .join("shared_state.toml");
        Self::open(path)
    }

    /// Open a store file; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            MemoryStore {
                entries: toml::from_str(&contents)?,
            }
        } else {
            MemoryStore::new()
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(&self.entries.entries)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    fn flush_or_warn(&self) {
        if let Err(e) = self.flush() {
            warn!(path = %self.path.display(), "Failed to save shared state: {}", e);
        }
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key)
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.set(key, value);
        self.flush_or_warn();
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.flush_or_warn();
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys()
    }
}
