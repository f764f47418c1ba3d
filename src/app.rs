// App state and main event loop.
// Wires keyboard actions to fetches and viewed toggles, and applies fetch results.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::azure::PullRequest;
use crate::cache::CacheKey;
use crate::config::{Config, DayRange};
use crate::error::Result;
use crate::fetch::PullRequestFetcher;
use crate::state::{FetchApplied, Notifications, PullRequestsState};
use crate::ui;
use crate::viewed::ViewedTracker;

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    List,
    Detail,
}

/// Result of a spawned fetch, tagged with the generation that issued it.
#[derive(Debug)]
pub struct FetchOutcome {
    pub generation: u64,
    pub day_range: DayRange,
    pub result: Result<Vec<PullRequest>>,
}

/// What `y` and `Y` put on the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTarget {
    Url,
    Title,
}

impl CopyTarget {
    fn label(self) -> &'static str {
        match self {
            CopyTarget::Url => "URL",
            CopyTarget::Title => "title",
        }
    }

    pub fn text(self, pr: &PullRequest) -> Option<String> {
        match self {
            CopyTarget::Url => pr.url.clone(),
            CopyTarget::Title => Some(pr.title.clone()),
        }
    }
}

/// Main application state.
pub struct App {
    pub config: Config,
    pub fetcher: PullRequestFetcher,
    pub tracker: ViewedTracker,
    pub pull_requests: PullRequestsState,
    pub notifications: Notifications,
    pub view: View,
    pub show_help: bool,
    /// Whether the app should exit.
    pub should_quit: bool,
    /// Opened on first copy and kept so X11 keeps serving the contents.
    clipboard: Option<arboard::Clipboard>,
    outcome_tx: UnboundedSender<FetchOutcome>,
    outcome_rx: UnboundedReceiver<FetchOutcome>,
}

impl App {
    pub fn new(config: Config, fetcher: PullRequestFetcher, tracker: ViewedTracker) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            pull_requests: PullRequestsState::new(config.day_range),
            config,
            fetcher,
            tracker,
            notifications: Notifications::new(),
            view: View::default(),
            show_help: false,
            should_quit: false,
            clipboard: None,
            outcome_tx,
            outcome_rx,
        }
    }

    /// Main event loop.
    pub async fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> io::Result<()> {
        self.request_fetch(false);

        while !self.should_quit {
            self.drain_outcomes().await;
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.handle_events().await?;
        }
        Ok(())
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::for_config(&self.config, self.pull_requests.day_range)
    }

    /// Spawn a fetch for the current day range.
    ///
    /// The result comes back through the outcome channel; older generations
    /// are dropped when applied.
    pub fn request_fetch(&mut self, force_refresh: bool) {
        let generation = self.pull_requests.begin_fetch();
        let key = self.cache_key();
        let fetcher = self.fetcher.clone();
        let tx = self.outcome_tx.clone();

        debug!(generation, days = key.day_range.days(), force_refresh, "requesting fetch");
        tokio::spawn(async move {
            let result = fetcher.fetch(&key, force_refresh).await;
            let _ = tx.send(FetchOutcome {
                generation,
                day_range: key.day_range,
                result,
            });
        });
    }

    async fn drain_outcomes(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply_outcome(outcome).await;
        }
    }

    /// Apply one finished fetch to the list and reload the viewed snapshot.
    pub async fn apply_outcome(&mut self, outcome: FetchOutcome) {
        let result = outcome.result.map_err(|e| e.to_string());
        match self.pull_requests.complete_fetch(outcome.generation, result) {
            FetchApplied::Loaded(count) => {
                debug!(count, days = outcome.day_range.days(), "pull requests loaded");
                let viewed = self.tracker.get_all().await;
                self.pull_requests.set_viewed(viewed);
            }
            FetchApplied::FailedKeptData(message) | FetchApplied::Failed(message) => {
                warn!(error = %message, "fetch failed");
                self.notifications
                    .error("Error fetching pull requests", message);
            }
            FetchApplied::Superseded => {
                debug!(generation = outcome.generation, "discarding superseded fetch");
            }
        }
    }

    /// Handle keyboard and other events.
    #[allow(clippy::collapsible_if)]
    async fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key).await;
                }
            }
        }
        Ok(())
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Esc => match self.view {
                View::Detail => self.view = View::List,
                View::List => self.should_quit = true,
            },
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab | KeyCode::Right => {
                let next = self.pull_requests.day_range.next();
                self.select_day_range(next);
            }
            KeyCode::BackTab | KeyCode::Left => {
                let prev = self.pull_requests.day_range.prev();
                self.select_day_range(prev);
            }
            KeyCode::Down | KeyCode::Char('j') if self.view == View::List => {
                self.pull_requests.select_next()
            }
            KeyCode::Up | KeyCode::Char('k') if self.view == View::List => {
                self.pull_requests.select_prev()
            }
            KeyCode::Enter => {
                if self.pull_requests.selected().is_some() {
                    self.view = View::Detail;
                }
            }
            KeyCode::Char('r') => self.request_fetch(false),
            KeyCode::Char('R') => self.request_fetch(true),
            KeyCode::Char('m') => self.toggle_selected_viewed().await,
            KeyCode::Char('v') => {
                let hidden = self.pull_requests.toggle_hide_viewed();
                let title = if hidden { "Hiding viewed" } else { "Showing viewed" };
                self.notifications.info(title, "");
            }
            KeyCode::Char('o') => self.open_selected(),
            KeyCode::Char('y') => self.copy_selected(CopyTarget::Url),
            KeyCode::Char('Y') => self.copy_selected(CopyTarget::Title),
            _ => {}
        }
    }

    fn select_day_range(&mut self, day_range: DayRange) {
        if self.pull_requests.set_day_range(day_range) {
            self.view = View::List;
            self.request_fetch(false);
        }
    }

    /// Toggle the viewed marker on the selected pull request.
    pub async fn toggle_selected_viewed(&mut self) {
        let Some(pr) = self.pull_requests.selected().cloned() else {
            return;
        };
        let was_viewed = self.pull_requests.is_viewed(&pr);

        let now_viewed = self
            .tracker
            .toggle(pr.pull_request_id, &pr.title, was_viewed)
            .await;
        self.pull_requests.apply_viewed_state(&pr, now_viewed);

        // A PR hidden by the filter must not hand the detail view to its neighbour
        let still_selected = self
            .pull_requests
            .selected()
            .is_some_and(|selected| selected.pull_request_id == pr.pull_request_id);
        if !still_selected {
            self.view = View::List;
        }

        let title = if now_viewed {
            "Marked as viewed"
        } else {
            "Marked as unread"
        };
        self.notifications
            .success(title, format!("PR #{}", pr.pull_request_id));
    }

    fn open_selected(&mut self) {
        let Some(url) = self.pull_requests.selected().and_then(|pr| pr.url.clone()) else {
            return;
        };
        if let Err(e) = open::that(&url) {
            warn!(url = %url, error = %e, "failed to open browser");
            self.notifications.error("Failed to open browser", e.to_string());
        }
    }

    /// Copy the URL or title of the selected pull request.
    pub fn copy_selected(&mut self, target: CopyTarget) {
        let Some(text) = self.pull_requests.selected().and_then(|pr| target.text(pr)) else {
            return;
        };

        match self.write_clipboard(&text) {
            Ok(()) => {
                debug!(what = target.label(), "copied to clipboard");
                self.notifications
                    .success(format!("Copied {}", target.label()), text);
            }
            Err(e) => {
                warn!(error = %e, "failed to copy to clipboard");
                self.notifications
                    .error(format!("Failed to copy {}", target.label()), e.to_string());
            }
        }
    }

    fn write_clipboard(&mut self, text: &str) -> std::result::Result<(), arboard::Error> {
        let clipboard = match self.clipboard.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()?,
        };
        self.clipboard.insert(clipboard).set_text(text)
    }
}
