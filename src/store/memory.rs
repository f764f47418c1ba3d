// In-memory key-value store.
// Used for tests and for the --memory flag where nothing should touch disk.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::KeyValueStore;
use crate::error::{AdoprError, Result};

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_seed(seed: impl IntoIterator<Item = (String, String)>) -> Self {
        let store = Self::default();
        if let Ok(mut items) = store.items.lock() {
            items.extend(seed);
        }
        store
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.items
            .lock()
            .map_err(|e| AdoprError::Other(format!("memory store poisoned: {}", e)))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn all_items(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.lock()?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("a").await.unwrap(), None);

        store.set_item("a", "1").await.unwrap();
        store.set_item("a", "2").await.unwrap();
        assert_eq!(store.get_item("a").await.unwrap(), Some("2".to_string()));

        store.remove_item("a").await.unwrap();
        store.remove_item("a").await.unwrap();
        assert!(store.all_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_with_seed() {
        let store = MemoryStore::with_seed([("k".to_string(), "v".to_string())]);
        let all = store.all_items().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get("k").map(String::as_str), Some("v"));
    }
}
