//! Persistent storage for clear-convey
//!
//! Session data lives in a single data directory, one file per key:
//!
//! ~/.local/share/clear-convey/        # Default data dir (platform specific)
//! ├── convey_session.json             # Serialized session state
//! └── convey_thread_id.json           # Current thread id
//!
//! [`MemoryStore`] backs tests and throwaway sessions.

use crate::core::KeyValueStore;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Application name used for platform directories
const APP_NAME: &str = "clear-convey";

/// File-backed key/value store rooted at a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store at `root`
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create data directory: {}", root.display()))?;
        Ok(Self { root })
    }

    /// Open the store at the platform data directory
    pub fn default_location() -> Result<Self> {
        Self::new(default_data_dir())
    }

    /// Get the data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        // Write-then-rename so a crash never leaves a half-written value
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// In-memory key/value store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Platform data directory, falling back to `./.clear-convey`
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".").join(format!(".{}", APP_NAME)))
}

/// Sanitize a key into a file name (remove unsafe characters)
fn sanitize_key(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '.' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, FileStore) {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("data")).unwrap();
        (temp, store)
    }

    #[test]
    fn test_file_store_init_creates_dir() {
        let (_temp, store) = create_test_store();
        assert!(store.root().exists());
    }

    #[test]
    fn test_missing_key_is_none() {
        let (_temp, store) = create_test_store();
        assert_eq!(store.get("convey_session").unwrap(), None);
    }

    #[test]
    fn test_set_get_remove() {
        let (_temp, store) = create_test_store();
        store.set("convey_thread_id", "thread-1").unwrap();
        assert_eq!(
            store.get("convey_thread_id").unwrap().as_deref(),
            Some("thread-1")
        );

        store.set("convey_thread_id", "thread-2").unwrap();
        assert_eq!(
            store.get("convey_thread_id").unwrap().as_deref(),
            Some("thread-2")
        );

        store.remove("convey_thread_id").unwrap();
        assert_eq!(store.get("convey_thread_id").unwrap(), None);
        // Removing twice is fine
        store.remove("convey_thread_id").unwrap();
    }

    #[test]
    fn test_values_survive_reopen() {
        let (temp, store) = create_test_store();
        store.set("convey_session", "{\"threads\":{}}").unwrap();
        drop(store);

        let reopened = FileStore::new(temp.path().join("data")).unwrap();
        assert_eq!(
            reopened.get("convey_session").unwrap().as_deref(),
            Some("{\"threads\":{}}")
        );
    }

    #[test]
    fn test_keys_cannot_escape_root() {
        let (_temp, store) = create_test_store();
        store.set("../outside", "x").unwrap();
        let path = store.key_path("../outside");
        assert!(path.starts_with(store.root()));
        assert_eq!(store.get("../outside").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.len(), 1);
        store.remove("a").unwrap();
        assert!(store.is_empty());
    }
}
