// Azure CLI pull request source.
// Locates the az executable, checks the login, and runs `az repos pr list`.

use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::types::RawPullRequest;
use super::{PullRequestSource, SourceQuery};
use crate::error::{AdoprError, Result};

/// Candidate locations for the az executable, tried in order.
const AZ_CANDIDATES: [&str; 3] = ["/opt/homebrew/bin/az", "/usr/local/bin/az", "az"];

const DEVOPS_BASE: &str = "https://dev.azure.com";

const NOT_LOGGED_IN: &str = "Azure CLI is not logged in. Please run 'az login' first.";

/// Pull request source backed by the az command-line tool.
#[derive(Debug, Default)]
pub struct AzCli {
    /// Explicit executable, skips probing when set.
    program: Option<String>,
    resolved: OnceCell<String>,
}

impl AzCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific az executable instead of probing the usual locations.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: Some(program.into()),
            resolved: OnceCell::new(),
        }
    }

    /// Resolve the az executable once per process.
    async fn program(&self) -> Result<&str> {
        let program = self
            .resolved
            .get_or_try_init(|| async {
                if let Some(program) = &self.program {
                    return Ok(program.clone());
                }
                for candidate in AZ_CANDIDATES {
                    let probe = Command::new(candidate).arg("--version").output().await;
                    if matches!(&probe, Ok(output) if output.status.success()) {
                        debug!(program = candidate, "found az executable");
                        return Ok(candidate.to_string());
                    }
                }
                Err(AdoprError::SourceUnavailable(
                    "Azure CLI (az) was not found. Install it and run 'az login'.".to_string(),
                ))
            })
            .await?;
        Ok(program.as_str())
    }

    async fn ensure_logged_in(&self, program: &str) -> Result<()> {
        let output = Command::new(program)
            .args(["account", "show", "--output", "none"])
            .output()
            .await
            .map_err(|e| AdoprError::SourceUnavailable(format!("{} ({})", NOT_LOGGED_IN, e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(AdoprError::SourceUnavailable(NOT_LOGGED_IN.to_string()))
        }
    }
}

/// Arguments for `az repos pr list` restricted to records created since the query date.
pub fn list_args(query: &SourceQuery) -> Vec<String> {
    vec![
        "repos".to_string(),
        "pr".to_string(),
        "list".to_string(),
        "--organization".to_string(),
        format!("{}/{}", DEVOPS_BASE, query.organization),
        "--project".to_string(),
        query.project.clone(),
        "--repository".to_string(),
        query.repository.clone(),
        "--status".to_string(),
        "all".to_string(),
        "--query".to_string(),
        format!("[?creationDate >= '{}']", query.since.format("%Y-%m-%d")),
        "--output".to_string(),
        "json".to_string(),
    ]
}

/// Parse the JSON array printed by `az repos pr list`.
pub fn parse_records(stdout: &[u8]) -> Result<Vec<RawPullRequest>> {
    serde_json::from_slice(stdout).map_err(|e| AdoprError::MalformedRecord(e.to_string()))
}

fn check_output(output: Output) -> Result<Vec<u8>> {
    if output.status.success() {
        return Ok(output.stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.contains("az login") || stderr.contains("authenticate") {
        return Err(AdoprError::SourceUnavailable(NOT_LOGGED_IN.to_string()));
    }
    Err(AdoprError::Source(format!("exit {}: {}", output.status, stderr)))
}

#[async_trait]
impl PullRequestSource for AzCli {
    async fn list_pull_requests(&self, query: &SourceQuery) -> Result<Vec<RawPullRequest>> {
        let program = self.program().await?;
        self.ensure_logged_in(program).await?;

        info!(
            organization = %query.organization,
            project = %query.project,
            repository = %query.repository,
            since = %query.since,
            "listing pull requests via az"
        );

        let output = Command::new(program)
            .args(list_args(query))
            .output()
            .await
            .map_err(|e| AdoprError::SourceUnavailable(format!("failed to run az: {}", e)))?;

        let stdout = check_output(output)?;
        let records = parse_records(&stdout)?;
        debug!(count = records.len(), "az returned pull requests");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn query() -> SourceQuery {
        SourceQuery {
            organization: "contoso".to_string(),
            project: "Fabrikam Fiber".to_string(),
            repository: "web".to_string(),
            since: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    #[test]
    fn test_list_args() {
        let args = list_args(&query());
        let joined = args.join(" ");
        assert!(joined.starts_with("repos pr list --organization https://dev.azure.com/contoso"));
        // Passed as a single argument, no shell quoting needed
        assert!(args.contains(&"Fabrikam Fiber".to_string()));
        assert!(args.contains(&"[?creationDate >= '2024-03-01']".to_string()));
        assert!(joined.ends_with("--status all --query [?creationDate >= '2024-03-01'] --output json"));
    }

    #[test]
    fn test_parse_records_rejects_garbage() {
        let err = parse_records(b"ERROR: something").unwrap_err();
        assert!(matches!(err, AdoprError::MalformedRecord(_)));
        assert!(err.is_fetch_error());
    }

    #[test]
    fn test_parse_records_empty_array() {
        assert!(parse_records(b"[]").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let cli = AzCli::with_program("/nonexistent/adopr-test/az");
        let err = cli.list_pull_requests(&query()).await.unwrap_err();
        assert!(matches!(err, AdoprError::SourceUnavailable(_)));
        assert!(err.to_string().contains("az login"));
    }
}
