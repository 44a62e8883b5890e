//! Client-side key/value storage seam.
//!
//! The browser build of the product keeps small pieces of client state
//! (access token, feature-guide bookkeeping) in shared string storage.
//! This trait is the equivalent seam for the Rust client: callers only
//! see string get/set/remove, and tests use the in-memory implementation.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// String key/value storage, shared across the client.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str);

    /// Remove the value stored under `key`, if any.
    fn remove(&mut self, key: &str);
}

/// In-memory storage backed by a `HashMap`.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Storage persisted as a JSON object on disk.
///
/// Fills the role browser storage plays for the web client: small
/// pieces of state that survive restarts. Every write is flushed to
/// the file immediately.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open the storage file at `path`, loading any existing entries.
    /// A missing file starts empty; a corrupt one is ignored with a
    /// warning and overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("ignoring corrupt state file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, entries }
    }

    fn flush(&self) {
        match serde_json::to_string_pretty(&self.entries) {
            Ok(raw) => {
                if let Err(e) = std::fs::write(&self.path, raw) {
                    tracing::warn!("failed to write state file {}: {}", self.path.display(), e);
                }
            }
            Err(e) => {
                tracing::warn!("failed to encode state file {}: {}", self.path.display(), e);
            }
        }
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush();
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(test: &str) -> PathBuf {
        std::env::temp_dir().join(format!("matcha-storage-{}-{}.json", test, std::process::id()))
    }

    #[test]
    fn test_memory_storage_set_then_get() {
        // given:
        let mut storage = MemoryStorage::new();

        // when:
        storage.set("k", "v");

        // then:
        assert_eq!(storage.get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_memory_storage_remove_clears_value() {
        // given:
        let mut storage = MemoryStorage::new();
        storage.set("k", "v");

        // when:
        storage.remove("k");

        // then:
        assert_eq!(storage.get("k"), None);
    }

    #[test]
    fn test_memory_storage_set_overwrites() {
        // given:
        let mut storage = MemoryStorage::new();
        storage.set("k", "old");

        // when:
        storage.set("k", "new");

        // then:
        assert_eq!(storage.get("k"), Some("new".to_string()));
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        // given:
        let path = temp_path("reopen");
        let mut storage = FileStorage::open(&path);
        storage.set("k", "v");

        // when:
        let reopened = FileStorage::open(&path);

        // then:
        assert_eq!(reopened.get("k"), Some("v".to_string()));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_file_storage_remove_persists() {
        // given:
        let path = temp_path("remove");
        let mut storage = FileStorage::open(&path);
        storage.set("k", "v");

        // when:
        storage.remove("k");

        // then:
        assert_eq!(FileStorage::open(&path).get("k"), None);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_file_storage_missing_file_starts_empty() {
        // given:
        let path = temp_path("missing");
        std::fs::remove_file(&path).ok();

        // when:
        let storage = FileStorage::open(&path);

        // then:
        assert_eq!(storage.get("k"), None);
    }

    #[test]
    fn test_file_storage_tolerates_corrupt_contents() {
        // given:
        let path = temp_path("corrupt");
        std::fs::write(&path, "not json").unwrap();

        // when:
        let mut storage = FileStorage::open(&path);
        storage.set("k", "v");

        // then: the corrupt file is replaced by a valid one
        assert_eq!(FileStorage::open(&path).get("k"), Some("v".to_string()));
        std::fs::remove_file(&path).ok();
    }
}
