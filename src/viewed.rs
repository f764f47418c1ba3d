// Viewed pull request tracking.
// One aggregate record maps pull request ids to when the user marked them viewed.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::KeyValueStore;

/// Store key of the aggregate record.
pub const VIEWED_KEY: &str = "viewedPullRequests";

/// Viewed markers are dropped thirty days after they were set.
pub const VIEWED_TTL: TimeDelta = TimeDelta::days(30);

/// When a pull request was marked viewed, with its title at that moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewedEntry {
    pub viewed_at: DateTime<Utc>,
    pub pr_title: String,
}

impl ViewedEntry {
    pub fn new(pr_title: impl Into<String>) -> Self {
        Self {
            viewed_at: Utc::now(),
            pr_title: pr_title.into(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.viewed_at) >= VIEWED_TTL
    }
}

/// Pull request id (decimal string) to viewed entry.
pub type ViewedPrs = BTreeMap<String, ViewedEntry>;

/// Drop every entry that has reached the TTL at `now`.
pub fn prune(viewed: ViewedPrs, now: DateTime<Utc>) -> ViewedPrs {
    viewed
        .into_iter()
        .filter(|(_, entry)| !entry.is_expired_at(now))
        .collect()
}

/// Owns the viewed aggregate. Nothing else writes `VIEWED_KEY`.
///
/// Every operation is a read-modify-write of the whole record and assumes a
/// single caller at a time.
#[derive(Clone)]
pub struct ViewedTracker {
    store: Arc<dyn KeyValueStore>,
}

impl ViewedTracker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load all viewed entries, pruning expired ones and saving the result back.
    ///
    /// A missing or unreadable record is an empty mapping.
    pub async fn get_all(&self) -> ViewedPrs {
        let stored = match self.store.get_item(VIEWED_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return ViewedPrs::new(),
            Err(e) => {
                warn!(error = %e, "failed to read viewed pull requests");
                return ViewedPrs::new();
            }
        };

        let viewed: ViewedPrs = match serde_json::from_str(&stored) {
            Ok(viewed) => viewed,
            Err(e) => {
                warn!(error = %e, "viewed pull requests record is corrupt, ignoring");
                return ViewedPrs::new();
            }
        };

        let before = viewed.len();
        let cleaned = prune(viewed, Utc::now());
        if cleaned.len() < before {
            debug!(pruned = before - cleaned.len(), "pruned old viewed entries");
        }

        self.save(&cleaned).await;
        cleaned
    }

    /// Mark `pr_id` viewed now, replacing any earlier marker.
    pub async fn mark_viewed(&self, pr_id: u64, pr_title: &str) {
        let mut viewed = self.get_all().await;
        viewed.insert(pr_id.to_string(), ViewedEntry::new(pr_title));
        self.save(&viewed).await;
    }

    /// Flip the viewed state of `pr_id` and return the new state.
    pub async fn toggle(&self, pr_id: u64, pr_title: &str, is_currently_viewed: bool) -> bool {
        if !is_currently_viewed {
            self.mark_viewed(pr_id, pr_title).await;
            return true;
        }

        let mut viewed = self.get_all().await;
        viewed.remove(&pr_id.to_string());
        self.save(&viewed).await;
        false
    }

    async fn save(&self, viewed: &ViewedPrs) {
        let json = match serde_json::to_string(viewed) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize viewed pull requests");
                return;
            }
        };
        if let Err(e) = self.store.set_item(VIEWED_KEY, &json).await {
            warn!(error = %e, "failed to save viewed pull requests");
        }
    }
}
