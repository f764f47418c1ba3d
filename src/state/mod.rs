// State management module.
// Presentation state for the pull request list and the notification log.

#![allow(dead_code)]

pub mod notifications;
pub mod pull_requests;

pub use notifications::{NotificationLevel, Notifications};
pub use pull_requests::{FetchApplied, LoadingState, PullRequestsState};
