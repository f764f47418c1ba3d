// Cache entries and keys.
// Wraps a cached pull request list with its timestamp and the tuple it was fetched for.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Config, DayRange};

/// Prefix shared by every cache key in the store.
pub const CACHE_PREFIX: &str = "pr-cache/";

/// Cached lists expire two hours after they were written.
pub const CACHE_TTL: TimeDelta = TimeDelta::hours(2);

/// Identifies one cached pull request list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub organization: String,
    pub project: String,
    pub repository: String,
    pub day_range: DayRange,
}

impl CacheKey {
    pub fn new(
        organization: impl Into<String>,
        project: impl Into<String>,
        repository: impl Into<String>,
        day_range: DayRange,
    ) -> Self {
        Self {
            organization: organization.into(),
            project: project.into(),
            repository: repository.into(),
            day_range,
        }
    }

    pub fn for_config(config: &Config, day_range: DayRange) -> Self {
        Self::new(
            config.organization.clone(),
            config.project.clone(),
            config.repository.clone(),
            day_range,
        )
    }

    /// Store key for this tuple.
    ///
    /// Each text component is length-prefixed, so a `/` or `:` inside a name
    /// cannot make two different tuples encode to the same key.
    pub fn encode(&self) -> String {
        let mut key = String::from(CACHE_PREFIX);
        for part in [&self.organization, &self.project, &self.repository] {
            key.push_str(&format!("{}:{}/", part.len(), part));
        }
        key.push_str(&self.day_range.days().to_string());
        key
    }
}

/// Stored payload for one cache key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    /// The cached data.
    pub data: T,
    /// When the data was cached.
    pub cached_at: DateTime<Utc>,
    pub organization: String,
    pub project: String,
    pub repository: String,
    pub day_range: DayRange,
}

impl<T> CacheEntry<T> {
    /// Create a new entry stamped with the current time.
    pub fn new(key: &CacheKey, data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
            organization: key.organization.clone(),
            project: key.project.clone(),
            repository: key.repository.clone(),
            day_range: key.day_range,
        }
    }

    /// Whether the entry is at least `CACHE_TTL` old at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.cached_at) >= CACHE_TTL
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let a = CacheKey::new("contoso", "proj", "repo", DayRange::Week);
        let b = CacheKey::new("contoso", "proj", "repo", DayRange::Week);
        assert_eq!(a.encode(), b.encode());
        assert_eq!(a.encode(), "pr-cache/7:contoso/4:proj/4:repo/7");
    }

    #[test]
    fn test_key_does_not_collide_on_delimiters() {
        let a = CacheKey::new("a/b", "c", "d", DayRange::Week);
        let b = CacheKey::new("a", "b/c", "d", DayRange::Week);
        let c = CacheKey::new("1:a", "b", "c", DayRange::Week);
        let d = CacheKey::new("1", "a:b", "c", DayRange::Week);
        assert_ne!(a.encode(), b.encode());
        assert_ne!(c.encode(), d.encode());
    }

    #[test]
    fn test_key_varies_by_day_range() {
        let keys: Vec<String> = DayRange::ALL
            .iter()
            .map(|range| CacheKey::new("o", "p", "r", *range).encode())
            .collect();
        for (i, key) in keys.iter().enumerate() {
            assert!(key.starts_with(CACHE_PREFIX));
            assert!(!keys[i + 1..].contains(key));
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let key = CacheKey::new("o", "p", "r", DayRange::Week);
        let entry = CacheEntry::new(&key, vec![1, 2, 3]);

        let just_before = entry.cached_at + CACHE_TTL - TimeDelta::seconds(1);
        let exactly = entry.cached_at + CACHE_TTL;
        assert!(!entry.is_expired_at(just_before));
        assert!(entry.is_expired_at(exactly));
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_carries_key_components() {
        let key = CacheKey::new("contoso", "proj", "repo", DayRange::ThreeWeeks);
        let entry = CacheEntry::new(&key, "x");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["organization"], "contoso");
        assert_eq!(json["dayRange"], 21);
        assert!(json["cachedAt"].is_string());
    }
}
