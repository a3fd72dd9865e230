//! String key-value storage for the console's data sets.
//!
//! The console persists three JSON documents (devices, update logs,
//! terminology) plus a data-version marker.  Each lives under its own key in
//! a [`KeyValueStore`]:
//!
//! - [`FileStore`] keeps one `<key>.json` file per key inside the data
//!   directory.  Writes go to a uniquely named temp file first and are then
//!   renamed over the target, so a crash mid-write never leaves a truncated
//!   document behind.
//! - [`MemoryStore`] keeps everything in a `HashMap`; tests and dry runs use it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Error type for key-value store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Keys become file names, so only `[A-Za-z0-9_-]` is accepted.
    #[error("invalid store key {0:?}")]
    InvalidKey(String),

    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Minimal string storage, modelled on a browser's local storage.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key was never set.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes the key.  Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// ── File-backed store ─────────────────────────────────────────────────────────

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`.  The directory is created lazily on
    /// the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let tmp = self.dir.join(format!(".{key}.{}.tmp", Uuid::new_v4()));
        std::fs::write(&tmp, value).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        if let Err(source) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(StoreError::Io { path, source });
        }

        debug!(key, bytes = value.len(), "store key written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

// ── In-memory store ───────────────────────────────────────────────────────────

/// `HashMap`-backed store; nothing touches the disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // Every critical section is a single map call; poisoning is ignored.
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values().remove(key);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> FileStore {
        FileStore::new(std::env::temp_dir().join(format!("plate_store_test_{}", Uuid::new_v4())))
    }

    #[test]
    fn test_file_store_get_missing_key_is_none() {
        let store = temp_store();
        assert!(store.get("pressure_plate_devices").unwrap().is_none());
    }

    #[test]
    fn test_file_store_set_then_get_returns_value() {
        // Arrange
        let store = temp_store();

        // Act
        store.set("pressure_plate_data_version", "3.3").unwrap();
        let value = store.get("pressure_plate_data_version").unwrap();

        // Assert
        assert_eq!(value.as_deref(), Some("3.3"));
        assert!(store.dir().join("pressure_plate_data_version.json").exists());

        // Cleanup
        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_file_store_set_overwrites_and_leaves_no_temp_files() {
        let store = temp_store();
        store.set("k", "first").unwrap();
        store.set("k", "second").unwrap();

        assert_eq!(store.get("k").unwrap().as_deref(), Some("second"));
        let leftovers = std::fs::read_dir(store.dir())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        std::fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_file_store_remove_missing_key_is_ok() {
        let store = temp_store();
        assert!(store.remove("never_written").is_ok());
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let store = temp_store();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn test_memory_store_round_trip_and_remove() {
        let store = MemoryStore::new();
        store.set("terminology_config", "{}").unwrap();
        assert_eq!(store.get("terminology_config").unwrap().as_deref(), Some("{}"));
        store.remove("terminology_config").unwrap();
        assert!(store.get("terminology_config").unwrap().is_none());
    }
}
