// Cache manager for pull request lists.
// Expiring, best-effort caching on top of the key-value store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::entry::{CACHE_PREFIX, CacheEntry, CacheKey};
use crate::azure::PullRequest;
use crate::store::KeyValueStore;

type PullRequestEntry = CacheEntry<Vec<PullRequest>>;

/// Expiring cache of pull request lists keyed by (organization, project, repository, day range).
///
/// Failures never reach the caller: unreadable entries are misses and failed
/// writes are logged.
///
/// Clones share one lock, so a sweep running on one fetch task cannot delete
/// an entry another task is writing.
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn KeyValueStore>,
    lock: Arc<Mutex<()>>,
}

impl CacheManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Return the cached list if present and younger than the TTL.
    ///
    /// An expired or unreadable entry is removed as part of the read.
    pub async fn read(&self, key: &CacheKey) -> Option<Vec<PullRequest>> {
        let _guard = self.lock.lock().await;
        let store_key = key.encode();

        let raw = match self.store.get_item(&store_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %store_key, "cache miss");
                return None;
            }
            Err(e) => {
                warn!(key = %store_key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        let entry: PullRequestEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %store_key, error = %e, "corrupt cache entry, discarding");
                self.remove(&store_key).await;
                return None;
            }
        };

        if entry.is_expired() {
            debug!(key = %store_key, cached_at = %entry.cached_at, "cache entry expired");
            self.remove(&store_key).await;
            return None;
        }

        debug!(key = %store_key, count = entry.data.len(), "cache hit");
        Some(entry.data)
    }

    /// Overwrite the entry for `key` with `data`, stamped now.
    pub async fn write(&self, key: &CacheKey, data: &[PullRequest]) {
        let store_key = key.encode();
        let entry = CacheEntry::new(key, data);

        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                warn!(key = %store_key, error = %e, "failed to serialize cache entry");
                return;
            }
        };

        let _guard = self.lock.lock().await;
        if let Err(e) = self.store.set_item(&store_key, &json).await {
            warn!(key = %store_key, error = %e, "failed to write cache entry");
        }
    }

    /// Drop the entry for `key` regardless of its age.
    pub async fn invalidate(&self, key: &CacheKey) {
        let _guard = self.lock.lock().await;
        let store_key = key.encode();
        debug!(key = %store_key, "invalidating cache entry");
        self.remove(&store_key).await;
    }

    /// Delete every expired or unparsable cache entry. Returns how many were removed.
    ///
    /// Each candidate is read again just before removal and kept if it has
    /// been rewritten since the listing.
    pub async fn sweep_expired(&self) -> usize {
        let _guard = self.lock.lock().await;
        let items = match self.store.all_items().await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "cache sweep could not list store");
                return 0;
            }
        };

        let now = Utc::now();
        let mut removed = 0;
        for (key, raw) in items.iter().filter(|(key, _)| key.starts_with(CACHE_PREFIX)) {
            if !is_stale(raw, now) {
                continue;
            }
            match self.store.get_item(key).await {
                Ok(Some(current)) if is_stale(&current, now) => {}
                Ok(_) => continue,
                Err(e) => {
                    warn!(key = %key, error = %e, "cache sweep could not recheck entry");
                    continue;
                }
            }
            if self.remove(key).await {
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, "swept expired cache entries");
        }
        removed
    }

    async fn remove(&self, store_key: &str) -> bool {
        match self.store.remove_item(store_key).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %store_key, error = %e, "failed to remove cache entry");
                false
            }
        }
    }
}

/// Expired at `now`, or not a cache entry at all.
fn is_stale(raw: &str, now: DateTime<Utc>) -> bool {
    match serde_json::from_str::<PullRequestEntry>(raw) {
        Ok(entry) => entry.is_expired_at(now),
        Err(_) => true,
    }
}
