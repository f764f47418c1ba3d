// Error types for adopr.
// Covers the az CLI source, the key-value store, configuration and I/O.

#![allow(dead_code)]

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdoprError {
    #[error("{0}")]
    SourceUnavailable(String),

    #[error("az command failed: {0}")]
    Source(String),

    #[error("Malformed pull request data: {0}")]
    MalformedRecord(String),

    #[error("Failed to write to store: {0}")]
    StoreWrite(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AdoprError {
    /// Whether this error aborts a pull request fetch cycle.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            AdoprError::SourceUnavailable(_) | AdoprError::Source(_) | AdoprError::MalformedRecord(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AdoprError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_kinds() {
        assert!(AdoprError::SourceUnavailable("x".into()).is_fetch_error());
        assert!(AdoprError::MalformedRecord("x".into()).is_fetch_error());
        assert!(!AdoprError::StoreWrite("x".into()).is_fetch_error());
        assert!(!AdoprError::Config("x".into()).is_fetch_error());
    }

    #[test]
    fn test_source_unavailable_message_is_verbatim() {
        let err = AdoprError::SourceUnavailable("Please run 'az login' first.".into());
        assert_eq!(err.to_string(), "Please run 'az login' first.");
    }
}
