//! Shared key-value memory store
//!
//! Holds facts the assistant is asked to remember across requests within
//! a process, with optional JSON persistence between sessions. The store
//! owns its own synchronization; callers may clone the handle freely and
//! use it from concurrent requests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Errors in memory persistence
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("memory io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("memory decode error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MemoryError>;

/// On-disk shape of the store
#[derive(Debug, Serialize, Deserialize)]
struct MemoryFile {
    entries: HashMap<String, serde_json::Value>,
    updated_at: DateTime<Local>,
}

/// Concurrent key-value store, clonable handle
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under a key, replacing any previous value
    pub async fn set(&self, key: impl Into<String>, value: serde_json::Value) {
        self.entries.write().await.insert(key.into(), value);
    }

    /// Fetch a value by key
    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.read().await.get(key).cloned()
    }

    /// Remove a key, returning whether it existed
    pub async fn remove(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// All stored keys, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Load entries from a JSON file, replacing current contents.
    ///
    /// A missing file is not an error; an unreadable one is logged and
    /// leaves the store empty rather than failing startup.
    pub async fn load(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            debug!("no memory file at {:?}", path);
            return Ok(());
        }

        let content = tokio::fs::read_to_string(path).await?;
        match serde_json::from_str::<MemoryFile>(&content) {
            Ok(file) => {
                let mut entries = self.entries.write().await;
                *entries = file.entries;
                debug!("loaded {} memory entries", entries.len());
                Ok(())
            }
            Err(e) => {
                warn!("memory file at {:?} unreadable: {}", path, e);
                Ok(())
            }
        }
    }

    /// Persist all entries to a JSON file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let file = MemoryFile {
            entries: self.entries.read().await.clone(),
            updated_at: Local::now(),
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&file)?;
        tokio::fs::write(path, content).await?;
        debug!("saved {} memory entries to {:?}", file.entries.len(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        store.set("project", json!("opencoder")).await;

        assert_eq!(store.get("project").await, Some(json!("opencoder")));
        assert_eq!(store.len().await, 1);

        assert!(store.remove("project").await);
        assert!(!store.remove("project").await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_replaces() {
        let store = MemoryStore::new();
        store.set("k", json!(1)).await;
        store.set("k", json!({"nested": true})).await;

        assert_eq!(store.get("k").await, Some(json!({"nested": true})));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_keys_sorted() {
        let store = MemoryStore::new();
        store.set("b", json!(2)).await;
        store.set("a", json!(1)).await;

        assert_eq!(store.keys().await, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("memory.json");

        let store = MemoryStore::new();
        store.set("language", json!("rust")).await;
        store.set("steps", json!([1, 2, 3])).await;
        store.save(&path).await.unwrap();

        let restored = MemoryStore::new();
        restored.load(&path).await.unwrap();

        assert_eq!(restored.get("language").await, Some(json!("rust")));
        assert_eq!(restored.get("steps").await, Some(json!([1, 2, 3])));
        assert_eq!(restored.len().await, 2);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = MemoryStore::new();
        store.load(&dir.path().join("absent.json")).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_load_corrupt_file_is_tolerated() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("memory.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let store = MemoryStore::new();
        store.load(&path).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let store = MemoryStore::new();
        let mut handles = Vec::new();

        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.set(format!("key-{i}"), json!(i)).await;
                store.get(&format!("key-{i}")).await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }
        assert_eq!(store.len().await, 16);
    }
}
