// Azure DevOps module.
// Pull request types and the source that retrieves them through the az CLI.

pub mod cli;
pub mod types;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;

pub use cli::AzCli;
pub use types::*;

/// Parameters for one source query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuery {
    pub organization: String,
    pub project: String,
    pub repository: String,
    /// Only pull requests created on or after this date are returned.
    pub since: NaiveDate,
}

/// Capability that retrieves raw pull request records.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    async fn list_pull_requests(&self, query: &SourceQuery) -> Result<Vec<RawPullRequest>>;
}
