//! Preference storage backends.
//!
//! The fetch layer only ever sees a string key-value contract: reads return
//! `Option<String>`, writes are best-effort. The JSON file store stands in
//! for the platform preference storage the device app used.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed preference file: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// String key-value store for device preferences.
pub trait PrefsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// On-disk representation of the preference file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PrefsFile {
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// Preference store persisted as a JSON document at a fixed path.
///
/// Each operation reads the file fresh and writes it back whole; the file is
/// a handful of short strings, so there is nothing to cache. A missing file
/// reads as empty.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<PrefsFile, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PrefsFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, file: &PrefsFile) -> Result<(), StoreError> {
        fs::write(&self.path, serde_json::to_string_pretty(file)?)?;
        Ok(())
    }
}

impl PrefsStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.load()?;
        file.entries.insert(key.to_string(), value.to_string());
        self.save(&file)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.load()?;
        if file.entries.remove(key).is_some() {
            self.save(&file)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrefsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "trmnl-prefs-test-{}-{}.json",
            tag,
            std::process::id()
        ))
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("api_id").unwrap(), None);

        store.set("api_id", "device-1").unwrap();
        assert_eq!(store.get("api_id").unwrap().as_deref(), Some("device-1"));

        store.remove("api_id").unwrap();
        assert_eq!(store.get("api_id").unwrap(), None);
    }

    #[test]
    fn json_file_store_round_trip() {
        let path = temp_path("round-trip");
        let store = JsonFileStore::new(&path);

        assert_eq!(store.get("api_token").unwrap(), None);
        store.set("api_token", "secret").unwrap();
        store.set("api_base_url", "https://example.com/api").unwrap();

        // A second store over the same path sees the persisted values.
        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("api_token").unwrap().as_deref(), Some("secret"));
        assert_eq!(
            reopened.get("api_base_url").unwrap().as_deref(),
            Some("https://example.com/api")
        );

        reopened.remove("api_token").unwrap();
        assert_eq!(reopened.get("api_token").unwrap(), None);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn json_file_store_missing_file_reads_empty() {
        let store = JsonFileStore::new(temp_path("missing"));
        assert_eq!(store.get("anything").unwrap(), None);
    }
}
