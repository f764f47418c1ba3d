// Pull request fetch orchestration.
// Serves lists from the cache when fresh, otherwise asks the source and repopulates.

use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta, Utc};
use tracing::{debug, info};

use crate::azure::{PullRequest, PullRequestSource, RawPullRequest, SourceQuery};
use crate::cache::{CacheKey, CacheManager};
use crate::error::Result;

const BRANCH_PREFIX: &str = "refs/heads/";

/// Short branch name from a full ref (`refs/heads/main` -> `main`).
pub fn short_branch(ref_name: &str) -> &str {
    ref_name.strip_prefix(BRANCH_PREFIX).unwrap_or(ref_name)
}

/// Browser URL of a pull request.
pub fn web_url(organization: &str, project: &str, repository: &str, pr_id: u64) -> String {
    format!(
        "https://dev.azure.com/{}/{}/_git/{}/pullrequest/{}",
        organization, project, repository, pr_id
    )
}

/// Turn a raw az record into the form the rest of the app uses.
pub fn normalize(raw: RawPullRequest, key: &CacheKey) -> PullRequest {
    let url = web_url(
        &key.organization,
        &key.project,
        &key.repository,
        raw.pull_request_id,
    );
    PullRequest {
        pull_request_id: raw.pull_request_id,
        title: raw.title,
        created_by: raw.created_by,
        creation_date: raw.creation_date,
        status: raw.status,
        source_ref_name: short_branch(&raw.source_ref_name).to_string(),
        target_ref_name: short_branch(&raw.target_ref_name).to_string(),
        description: raw.description,
        reviewers: raw.reviewers.unwrap_or_default(),
        url: Some(url),
    }
}

/// First day included by a look-back of `days` days.
pub fn since_date(days: u32) -> NaiveDate {
    (Utc::now() - TimeDelta::days(i64::from(days))).date_naive()
}

/// Coordinates the cache and the pull request source.
#[derive(Clone)]
pub struct PullRequestFetcher {
    cache: CacheManager,
    source: Arc<dyn PullRequestSource>,
}

impl PullRequestFetcher {
    pub fn new(cache: CacheManager, source: Arc<dyn PullRequestSource>) -> Self {
        Self { cache, source }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Pull requests for `key`, from cache unless stale, missing, or `force_refresh`.
    ///
    /// Source failures are returned; cache failures only cost a refetch.
    pub async fn fetch(&self, key: &CacheKey, force_refresh: bool) -> Result<Vec<PullRequest>> {
        let pull_requests = if force_refresh {
            info!(days = key.day_range.days(), "forced refresh");
            self.cache.invalidate(key).await;
            self.fetch_and_store(key).await?
        } else if let Some(cached) = self.cache.read(key).await {
            debug!(count = cached.len(), "serving pull requests from cache");
            cached
        } else {
            self.fetch_and_store(key).await?
        };

        self.cache.sweep_expired().await;
        Ok(pull_requests)
    }

    async fn fetch_and_store(&self, key: &CacheKey) -> Result<Vec<PullRequest>> {
        let query = SourceQuery {
            organization: key.organization.clone(),
            project: key.project.clone(),
            repository: key.repository.clone(),
            since: since_date(key.day_range.days()),
        };

        let pull_requests: Vec<PullRequest> = self
            .source
            .list_pull_requests(&query)
            .await?
            .into_iter()
            .map(|raw| normalize(raw, key))
            .collect();

        self.cache.write(key, &pull_requests).await;
        Ok(pull_requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::TimeZone;

    use crate::azure::{Author, PrStatus, Reviewer};
    use crate::cache::entry::CacheEntry;
    use crate::config::DayRange;
    use crate::error::AdoprError;
    use crate::store::{FailingStore, KeyValueStore, MemoryStore};

    /// Source that returns a fixed list and counts invocations.
    #[derive(Default)]
    struct ScriptedSource {
        records: Vec<RawPullRequest>,
        fail: bool,
        calls: AtomicUsize,
        queries: Mutex<Vec<SourceQuery>>,
    }

    impl ScriptedSource {
        fn returning(records: Vec<RawPullRequest>) -> Self {
            Self {
                records,
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PullRequestSource for ScriptedSource {
        async fn list_pull_requests(&self, query: &SourceQuery) -> Result<Vec<RawPullRequest>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut queries) = self.queries.lock() {
                queries.push(query.clone());
            }
            if self.fail {
                return Err(AdoprError::SourceUnavailable(
                    "Azure CLI is not logged in. Please run 'az login' first.".to_string(),
                ));
            }
            Ok(self.records.clone())
        }
    }

    fn raw(id: u64, source: &str) -> RawPullRequest {
        RawPullRequest {
            pull_request_id: id,
            title: format!("PR {}", id),
            created_by: Author {
                display_name: "Grace".to_string(),
                unique_name: "grace@contoso.com".to_string(),
            },
            creation_date: Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap(),
            status: PrStatus::Active,
            source_ref_name: source.to_string(),
            target_ref_name: "refs/heads/main".to_string(),
            description: Some("desc".to_string()),
            reviewers: None,
        }
    }

    fn key() -> CacheKey {
        CacheKey::new("contoso", "proj", "repo", DayRange::Week)
    }

    fn setup(source: ScriptedSource) -> (Arc<MemoryStore>, Arc<ScriptedSource>, PullRequestFetcher) {
        let store = Arc::new(MemoryStore::new());
        let source = Arc::new(source);
        let fetcher = PullRequestFetcher::new(CacheManager::new(store.clone()), source.clone());
        (store, source, fetcher)
    }

    #[test]
    fn test_short_branch() {
        assert_eq!(short_branch("refs/heads/main"), "main");
        assert_eq!(short_branch("refs/heads/feature/x"), "feature/x");
        assert_eq!(short_branch("refs/tags/v1"), "refs/tags/v1");
        assert_eq!(short_branch("main"), "main");
    }

    #[test]
    fn test_normalize() {
        let mut record = raw(17, "refs/heads/feature/login");
        record.reviewers = Some(vec![Reviewer {
            display_name: "Linus".to_string(),
            vote: 10,
        }]);

        let pr = normalize(record, &key());
        assert_eq!(pr.source_ref_name, "feature/login");
        assert_eq!(pr.target_ref_name, "main");
        assert_eq!(pr.reviewers.len(), 1);
        assert_eq!(
            pr.url.as_deref(),
            Some("https://dev.azure.com/contoso/proj/_git/repo/pullrequest/17")
        );
    }

    #[test]
    fn test_missing_reviewers_become_empty() {
        let pr = normalize(raw(1, "refs/heads/a"), &key());
        assert!(pr.reviewers.is_empty());
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let (store, source, fetcher) = setup(ScriptedSource::returning(vec![raw(1, "refs/heads/main")]));

        let first = fetcher.fetch(&key(), false).await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(first[0].source_ref_name, "main");
        assert!(store.get_item(&key().encode()).await.unwrap().is_some());

        let second = fetcher.fetch(&key(), false).await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_force_refresh_always_calls_source() {
        let (store, source, fetcher) = setup(ScriptedSource::returning(vec![raw(2, "refs/heads/b")]));

        // A fresh entry with different contents
        let stale_view = vec![normalize(raw(1, "refs/heads/a"), &key())];
        fetcher.cache().write(&key(), &stale_view).await;

        let result = fetcher.fetch(&key(), true).await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(result[0].pull_request_id, 2);

        let raw_entry = store.get_item(&key().encode()).await.unwrap().unwrap();
        let entry: CacheEntry<Vec<PullRequest>> = serde_json::from_str(&raw_entry).unwrap();
        assert_eq!(entry.data, result);

        fetcher.fetch(&key(), true).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_source_failure_is_surfaced_and_cache_untouched() {
        let (store, source, fetcher) = setup(ScriptedSource::failing());

        let err = fetcher.fetch(&key(), false).await.unwrap_err();
        assert!(err.is_fetch_error());
        assert!(err.to_string().contains("az login"));
        assert_eq!(source.calls(), 1);
        assert!(store.all_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_uses_day_range() {
        let (_, source, fetcher) = setup(ScriptedSource::returning(Vec::new()));
        let key = CacheKey::new("contoso", "proj", "repo", DayRange::TwoWeeks);

        fetcher.fetch(&key, false).await.unwrap();

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].since, since_date(14));
        assert_eq!(queries[0].organization, "contoso");
    }

    #[tokio::test]
    async fn test_fetch_sweeps_expired_entries() {
        let (store, _, fetcher) = setup(ScriptedSource::returning(Vec::new()));
        let old_key = CacheKey::new("contoso", "proj", "old", DayRange::Week);
        let mut entry = CacheEntry::new(&old_key, Vec::<PullRequest>::new());
        entry.cached_at = Utc::now() - TimeDelta::hours(5);
        store
            .set_item(&old_key.encode(), &serde_json::to_string(&entry).unwrap())
            .await
            .unwrap();

        fetcher.fetch(&key(), false).await.unwrap();

        assert!(store.get_item(&old_key.encode()).await.unwrap().is_none());
        assert!(store.get_item(&key().encode()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failing_store_fetches_every_time() {
        let source = Arc::new(ScriptedSource::returning(vec![raw(3, "refs/heads/c")]));
        let fetcher =
            PullRequestFetcher::new(CacheManager::new(Arc::new(FailingStore)), source.clone());

        let first = fetcher.fetch(&key(), false).await.unwrap();
        let second = fetcher.fetch(&key(), false).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].source_ref_name, "c");
        assert_eq!(source.calls(), 2);
    }
}
