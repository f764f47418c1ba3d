// Azure DevOps pull request types.
// Raw records as emitted by `az repos pr list` and the normalized form the app uses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pull request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrStatus {
    Active,
    Completed,
    Abandoned,
    #[serde(other)]
    Other,
}

impl PrStatus {
    pub fn glyph(&self) -> &'static str {
        match self {
            PrStatus::Active => "🔄",
            PrStatus::Completed => "✅",
            PrStatus::Abandoned => "❌",
            PrStatus::Other => "⚪",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrStatus::Active => "active",
            PrStatus::Completed => "completed",
            PrStatus::Abandoned => "abandoned",
            PrStatus::Other => "other",
        }
    }
}

/// Identity of the pull request author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub display_name: String,
    #[serde(default)]
    pub unique_name: String,
}

/// Reviewer vote, reduced to its sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Approved,
    Rejected,
    Pending,
}

impl Vote {
    pub fn glyph(&self) -> &'static str {
        match self {
            Vote::Approved => "✅",
            Vote::Rejected => "❌",
            Vote::Pending => "⏳",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    pub display_name: String,
    /// Positive approves, negative rejects, zero is pending.
    pub vote: i32,
}

impl Reviewer {
    pub fn vote_state(&self) -> Vote {
        match self.vote {
            v if v > 0 => Vote::Approved,
            v if v < 0 => Vote::Rejected,
            _ => Vote::Pending,
        }
    }
}

/// Pull request record exactly as the az CLI returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPullRequest {
    pub pull_request_id: u64,
    pub title: String,
    pub created_by: Author,
    pub creation_date: DateTime<Utc>,
    pub status: PrStatus,
    pub source_ref_name: String,
    pub target_ref_name: String,
    pub description: Option<String>,
    pub reviewers: Option<Vec<Reviewer>>,
}

/// Normalized pull request: short branch names and a browsable URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub pull_request_id: u64,
    pub title: String,
    pub created_by: Author,
    pub creation_date: DateTime<Utc>,
    pub status: PrStatus,
    pub source_ref_name: String,
    pub target_ref_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reviewers: Vec<Reviewer>,
    #[serde(default)]
    pub url: Option<String>,
}

impl PullRequest {
    /// Key used by viewed tracking.
    pub fn viewed_key(&self) -> String {
        self.pull_request_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = r#"[{
        "pullRequestId": 42,
        "title": "Add retry to uploader",
        "createdBy": {"displayName": "Ada Lovelace", "uniqueName": "ada@contoso.com", "id": "x"},
        "creationDate": "2024-03-05T09:15:27.1234567Z",
        "status": "active",
        "sourceRefName": "refs/heads/feature/retry",
        "targetRefName": "refs/heads/main",
        "isDraft": false
    }]"#;

    #[test]
    fn test_raw_record_parses_with_extra_fields() {
        let raw: Vec<RawPullRequest> = serde_json::from_str(RAW).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].pull_request_id, 42);
        assert_eq!(raw[0].created_by.unique_name, "ada@contoso.com");
        assert_eq!(raw[0].status, PrStatus::Active);
        assert!(raw[0].reviewers.is_none());
        assert!(raw[0].description.is_none());
    }

    #[test]
    fn test_unknown_status_is_other() {
        let status: PrStatus = serde_json::from_str("\"notSet\"").unwrap();
        assert_eq!(status, PrStatus::Other);
        assert_eq!(status.glyph(), "⚪");
    }

    #[test]
    fn test_vote_state() {
        let reviewer = |vote| Reviewer {
            display_name: "r".to_string(),
            vote,
        };
        assert_eq!(reviewer(10).vote_state(), Vote::Approved);
        assert_eq!(reviewer(5).vote_state(), Vote::Approved);
        assert_eq!(reviewer(-10).vote_state(), Vote::Rejected);
        assert_eq!(reviewer(0).vote_state(), Vote::Pending);
    }
}
