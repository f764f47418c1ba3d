// Key-value store abstraction.
// A small async string-keyed store shared by the response cache and viewed tracking.

pub mod file;
pub mod memory;
pub mod paths;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Persistent string-keyed store with no transactions.
///
/// Each call is atomic on its own; sequences of calls are not.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<()>;

    /// Snapshot of every key and value currently stored.
    async fn all_items(&self) -> Result<BTreeMap<String, String>>;
}

/// Store whose every call fails, for exercising best-effort callers.
#[cfg(test)]
pub struct FailingStore;

#[cfg(test)]
#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get_item(&self, _key: &str) -> Result<Option<String>> {
        Err(crate::error::AdoprError::Other("store offline".to_string()))
    }

    async fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
        Err(crate::error::AdoprError::StoreWrite("store offline".to_string()))
    }

    async fn remove_item(&self, _key: &str) -> Result<()> {
        Err(crate::error::AdoprError::StoreWrite("store offline".to_string()))
    }

    async fn all_items(&self) -> Result<BTreeMap<String, String>> {
        Err(crate::error::AdoprError::Other("store offline".to_string()))
    }
}
