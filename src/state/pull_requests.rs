// Pull request list state.
// Loading state, selection, viewed snapshot, hide-viewed filter and the fetch generation guard.

use ratatui::widgets::ListState;

use crate::azure::PullRequest;
use crate::config::DayRange;
use crate::viewed::{ViewedEntry, ViewedPrs};

/// Loading state for async data.
#[derive(Debug, Clone, Default)]
pub enum LoadingState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> LoadingState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadingState::Loaded(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadingState::Loaded(data) => Some(data),
            _ => None,
        }
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchApplied {
    Loaded(usize),
    /// Failed, but earlier data is still shown.
    FailedKeptData(String),
    Failed(String),
    /// A newer fetch was issued after this one.
    Superseded,
}

/// State of the pull request list for the selected day range.
#[derive(Debug, Default)]
pub struct PullRequestsState {
    pub day_range: DayRange,
    pub data: LoadingState<Vec<PullRequest>>,
    /// A fetch is running while older data stays visible.
    pub refreshing: bool,
    pub list_state: ListState,
    /// Snapshot from the last viewed-tracker read or toggle.
    pub viewed: ViewedPrs,
    pub hide_viewed: bool,
    generation: u64,
}

impl PullRequestsState {
    pub fn new(day_range: DayRange) -> Self {
        Self {
            day_range,
            ..Default::default()
        }
    }

    /// Switch day range. Returns true if it changed.
    pub fn set_day_range(&mut self, day_range: DayRange) -> bool {
        if self.day_range == day_range {
            return false;
        }
        self.day_range = day_range;
        true
    }

    /// Record that a fetch was issued and return its generation.
    ///
    /// Only the most recently issued generation may update the list.
    pub fn begin_fetch(&mut self) -> u64 {
        self.generation += 1;
        if self.data.is_loaded() {
            self.refreshing = true;
        } else {
            self.data = LoadingState::Loading;
        }
        self.generation
    }

    pub fn latest_generation(&self) -> u64 {
        self.generation
    }

    /// Apply a finished fetch unless a newer one has been issued since.
    pub fn complete_fetch(
        &mut self,
        generation: u64,
        result: std::result::Result<Vec<PullRequest>, String>,
    ) -> FetchApplied {
        if generation != self.generation {
            return FetchApplied::Superseded;
        }
        self.refreshing = false;

        match result {
            Ok(items) => {
                let count = items.len();
                self.data = LoadingState::Loaded(items);
                self.reset_selection();
                FetchApplied::Loaded(count)
            }
            Err(message) if self.data.is_loaded() => FetchApplied::FailedKeptData(message),
            Err(message) => {
                self.data = LoadingState::Error(message.clone());
                self.list_state.select(None);
                FetchApplied::Failed(message)
            }
        }
    }

    pub fn is_viewed(&self, pr: &PullRequest) -> bool {
        self.viewed.contains_key(&pr.viewed_key())
    }

    /// Replace the viewed snapshot, keeping the selection in range.
    pub fn set_viewed(&mut self, viewed: ViewedPrs) {
        self.viewed = viewed;
        self.clamp_selection();
    }

    /// Mirror a toggle result into the snapshot.
    pub fn apply_viewed_state(&mut self, pr: &PullRequest, viewed: bool) {
        if viewed {
            self.viewed
                .insert(pr.viewed_key(), ViewedEntry::new(pr.title.clone()));
        } else {
            self.viewed.remove(&pr.viewed_key());
        }
        self.clamp_selection();
    }

    pub fn toggle_hide_viewed(&mut self) -> bool {
        self.hide_viewed = !self.hide_viewed;
        self.reset_selection();
        self.hide_viewed
    }

    /// Pull requests currently shown, after the hide-viewed filter.
    pub fn visible(&self) -> Vec<&PullRequest> {
        match self.data.data() {
            Some(items) => items
                .iter()
                .filter(|pr| !(self.hide_viewed && self.is_viewed(pr)))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn viewed_count(&self) -> usize {
        self.data
            .data()
            .map(|items| items.iter().filter(|pr| self.is_viewed(pr)).count())
            .unwrap_or(0)
    }

    pub fn selected(&self) -> Option<&PullRequest> {
        let index = self.list_state.selected()?;
        self.visible().get(index).copied()
    }

    /// Select the next item in the list.
    pub fn select_next(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i >= len - 1 => i, // Stay at end
            Some(i) => i + 1,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// Select the previous item in the list.
    pub fn select_prev(&mut self) {
        if self.visible().is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// Reset selection to first item.
    pub fn reset_selection(&mut self) {
        if self.visible().is_empty() {
            self.list_state.select(None);
        } else {
            self.list_state.select(Some(0));
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            None => self.list_state.select(Some(0)),
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::{Author, PrStatus};
    use chrono::Utc;

    fn pr(id: u64) -> PullRequest {
        PullRequest {
            pull_request_id: id,
            title: format!("PR {}", id),
            created_by: Author {
                display_name: "Ada".to_string(),
                unique_name: String::new(),
            },
            creation_date: Utc::now(),
            status: PrStatus::Active,
            source_ref_name: "a".to_string(),
            target_ref_name: "main".to_string(),
            description: None,
            reviewers: Vec::new(),
            url: None,
        }
    }

    fn loaded(ids: &[u64]) -> PullRequestsState {
        let mut state = PullRequestsState::new(DayRange::Week);
        let generation = state.begin_fetch();
        state.complete_fetch(generation, Ok(ids.iter().map(|id| pr(*id)).collect()));
        state
    }

    #[test]
    fn test_first_fetch_shows_loading() {
        let mut state = PullRequestsState::new(DayRange::Week);
        state.begin_fetch();
        assert!(state.data.is_loading());
        assert!(!state.refreshing);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut state = PullRequestsState::new(DayRange::Week);
        let first = state.begin_fetch();
        state.set_day_range(DayRange::Month);
        let second = state.begin_fetch();

        assert_eq!(
            state.complete_fetch(second, Ok(vec![pr(2)])),
            FetchApplied::Loaded(1)
        );
        assert_eq!(
            state.complete_fetch(first, Ok(vec![pr(1), pr(3)])),
            FetchApplied::Superseded
        );
        assert_eq!(state.visible()[0].pull_request_id, 2);
    }

    #[test]
    fn test_failure_keeps_previous_data() {
        let mut state = loaded(&[1, 2]);
        let generation = state.begin_fetch();
        assert!(state.refreshing);

        let applied = state.complete_fetch(generation, Err("not logged in".to_string()));
        assert_eq!(applied, FetchApplied::FailedKeptData("not logged in".to_string()));
        assert_eq!(state.visible().len(), 2);
        assert!(!state.refreshing);
    }

    #[test]
    fn test_failure_without_data_is_error() {
        let mut state = PullRequestsState::new(DayRange::Week);
        let generation = state.begin_fetch();
        state.complete_fetch(generation, Err("boom".to_string()));
        assert!(matches!(state.data, LoadingState::Error(ref e) if e == "boom"));
        assert!(state.selected().is_none());
    }

    #[test]
    fn test_hide_viewed_filters_and_clamps() {
        let mut state = loaded(&[1, 2, 3]);
        state.select_next();
        state.select_next();
        assert_eq!(state.selected().map(|p| p.pull_request_id), Some(3));

        let third = pr(3);
        state.apply_viewed_state(&third, true);
        assert!(state.is_viewed(&third));
        assert_eq!(state.viewed_count(), 1);

        assert!(state.toggle_hide_viewed());
        assert_eq!(state.visible().len(), 2);
        assert_eq!(state.selected().map(|p| p.pull_request_id), Some(1));

        // Marking the last visible row viewed keeps the selection in range
        state.select_next();
        state.apply_viewed_state(&pr(2), true);
        assert_eq!(state.selected().map(|p| p.pull_request_id), Some(1));

        state.apply_viewed_state(&third, false);
        assert_eq!(state.visible().len(), 2);
    }

    #[test]
    fn test_selection_bounds() {
        let mut state = loaded(&[1, 2]);
        state.select_prev();
        assert_eq!(state.list_state.selected(), Some(0));
        state.select_next();
        state.select_next();
        assert_eq!(state.list_state.selected(), Some(1));

        let mut empty = loaded(&[]);
        empty.select_next();
        assert!(empty.selected().is_none());
    }

    #[test]
    fn test_set_day_range() {
        let mut state = PullRequestsState::new(DayRange::Week);
        assert!(!state.set_day_range(DayRange::Week));
        assert!(state.set_day_range(DayRange::TwoWeeks));
        assert_eq!(state.day_range, DayRange::TwoWeeks);
    }
}
