// File-backed key-value store.
// Keeps every key in one JSON document, written atomically via a temp file.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::{AdoprError, Result};

/// Store backed by a single JSON file.
///
/// Every call reads the file again, so changes written by another adopr
/// process (for example `adopr viewed toggle` while the TUI is open) are seen
/// by the next read-modify-write here. Calls within this process are
/// serialized by `lock`; two processes writing in the same instant can still
/// lose one update.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Open the store at the platform data directory.
    pub fn open_default() -> Result<Self> {
        let path = super::paths::storage_path()
            .ok_or_else(|| AdoprError::Other("could not resolve data directory".to_string()))?;
        Ok(Self::open(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&contents) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "store file is corrupt, starting empty");
                Ok(BTreeMap::new())
            }
        }
    }

    async fn persist(&self, items: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(items)?;

        // Write atomically via temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!(path = %self.path.display(), keys = items.len(), "store persisted");
        Ok(())
    }

    async fn modify<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) + Send,
    {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await?;
        apply(&mut items);
        self.persist(&items)
            .await
            .map_err(|e| AdoprError::StoreWrite(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.modify(move |items| {
            items.insert(key, value);
        })
        .await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.modify(move |items| {
            items.remove(&key);
        })
        .await
    }

    async fn all_items(&self) -> Result<BTreeMap<String, String>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("storage.json");

        let store = FileStore::open(&path);
        store.set_item("viewedPullRequests", "{\"1\":{}}").await.unwrap();
        store.set_item("other", "x").await.unwrap();
        store.remove_item("other").await.unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(
            reopened.get_item("viewedPullRequests").await.unwrap(),
            Some("{\"1\":{}}".to_string())
        );
        assert_eq!(reopened.get_item("other").await.unwrap(), None);
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_sees_writes_from_another_handle() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");

        let tui = FileStore::open(&path);
        let cli = FileStore::open(&path);
        tui.set_item("a", "1").await.unwrap();
        cli.set_item("b", "2").await.unwrap();
        tui.set_item("c", "3").await.unwrap();

        assert_eq!(tui.get_item("b").await.unwrap(), Some("2".to_string()));
        let items = cli.all_items().await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items.get("a").map(String::as_str), Some("1"));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path().join("storage.json"));

        assert!(store.all_items().await.unwrap().is_empty());
        assert_eq!(store.get_item("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::open(&path);
        assert!(store.all_items().await.unwrap().is_empty());

        store.set_item("k", "v").await.unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"k\""));
    }
}
