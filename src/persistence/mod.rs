//! Key-value stores for persisted high scores
//!
//! Values are stored as decimal strings, one entry per key, so the file and
//! LocalStorage layouts stay readable by anything that lists saved scores.
//!
//! Backends:
//! - `MemoryStore`: tests and sessions without storage
//! - `JsonFileStore`: native, one JSON object per file, atomic replace (tmp → file)
//! - `LocalStorageStore`: wasm32, browser LocalStorage

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PersistenceError;

/// String-keyed integer store
pub trait ScoreStore {
    /// Read `key`; `Ok(None)` when nothing is stored
    fn get(&self, key: &str) -> Result<Option<u64>, PersistenceError>;

    fn set(&mut self, key: &str, value: u64) -> Result<(), PersistenceError>;

    /// Delete `key`; removing a missing key is not an error
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

fn parse_value(key: &str, raw: &str) -> Result<u64, PersistenceError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| PersistenceError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        })
}

/// Volatile in-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw string, bypassing validation (simulates foreign writers)
    pub fn set_raw(&mut self, key: &str, raw: &str) {
        self.entries.insert(key.to_string(), raw.to_string());
    }
}

impl ScoreStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<u64>, PersistenceError> {
        self.entries
            .get(key)
            .map(|raw| parse_value(key, raw))
            .transpose()
    }

    fn set(&mut self, key: &str, value: u64) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Native store backed by a single JSON object file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(json) if json.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write via a sibling temp file and rename so a crash never leaves a torn file
    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), PersistenceError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ScoreStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<u64>, PersistenceError> {
        self.read_all()?
            .get(key)
            .map(|raw| parse_value(key, raw))
            .transpose()
    }

    fn set(&mut self, key: &str, value: u64) -> Result<(), PersistenceError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Browser LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> Result<web_sys::Storage, PersistenceError> {
        web_sys::window()
            .ok_or_else(|| PersistenceError::Unavailable("no window".into()))?
            .local_storage()
            .map_err(|e| PersistenceError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| PersistenceError::Unavailable("LocalStorage disabled".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl ScoreStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<u64>, PersistenceError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| PersistenceError::Unavailable(format!("{e:?}")))?
            .map(|raw| parse_value(key, &raw))
            .transpose()
    }

    fn set(&mut self, key: &str, value: u64) -> Result<(), PersistenceError> {
        Self::storage()?
            .set_item(key, &value.to_string())
            .map_err(|e| PersistenceError::Unavailable(format!("quota or access: {e:?}")))
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| PersistenceError::Unavailable(format!("{e:?}")))
    }
}
