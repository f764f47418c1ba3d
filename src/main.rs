// adopr: browse Azure DevOps pull requests from the terminal.
// Parses the command line, sets up logging and storage, and runs the TUI or a subcommand.

mod app;
mod azure;
mod cache;
mod config;
mod error;
mod fetch;
mod state;
mod store;
mod ui;
mod viewed;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use app::App;
use azure::AzCli;
use cache::{CacheKey, CacheManager};
use config::{Config, ConfigLayer, DayRange};
use error::{AdoprError, Result};
use fetch::PullRequestFetcher;
use store::{FileStore, KeyValueStore, MemoryStore};
use viewed::ViewedTracker;

#[derive(Parser, Debug)]
#[command(
    name = "adopr",
    version,
    about = "Browse Azure DevOps pull requests with a local cache and viewed tracking"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Azure DevOps organization (the part after dev.azure.com/)
    #[arg(long, env = "ADOPR_ORGANIZATION", global = true)]
    organization: Option<String>,

    /// Project name
    #[arg(long, env = "ADOPR_PROJECT", global = true)]
    project: Option<String>,

    /// Repository name
    #[arg(long, env = "ADOPR_REPOSITORY", global = true)]
    repository: Option<String>,

    /// Look-back window in days: 7, 14, 21 or 31
    #[arg(long, env = "ADOPR_DAYS", global = true)]
    days: Option<DayRange>,

    /// Path to the JSON config file (default: OS config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the store file (default: OS data dir)
    #[arg(long, global = true)]
    store_path: Option<PathBuf>,

    /// Keep cache and viewed state in memory only
    #[arg(long, default_value_t = false, global = true)]
    memory: bool,

    /// Explicit az executable instead of probing the usual locations
    #[arg(long, env = "ADOPR_AZ", global = true)]
    az: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive pull request list (default)
    Tui,
    /// Print pull requests and exit
    List {
        /// Bypass the cache
        #[arg(long)]
        refresh: bool,
        /// Print normalized records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or change viewed markers
    Viewed {
        #[command(subcommand)]
        action: ViewedAction,
    },
    /// Maintain the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum ViewedAction {
    /// List pull requests marked viewed
    List,
    /// Toggle the viewed marker of one pull request
    Toggle {
        id: u64,
        /// Title to remember with the marker
        #[arg(long)]
        title: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Remove expired and corrupt cache entries
    Sweep,
    /// Drop cached lists of the configured repository for every day range
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Command::Tui));
    init_logging(interactive);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("adopr: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to a file while the TUI owns the terminal, otherwise to stderr.
fn init_logging(interactive: bool) {
    let filter = EnvFilter::try_from_env("ADOPR_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if !interactive {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    }

    let log_file = store::paths::log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match log_file {
        Some(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .try_init();
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let file_layer = match cli.config.clone().or_else(store::paths::config_path) {
        Some(path) => ConfigLayer::from_file(&path)?,
        None => ConfigLayer::default(),
    };
    let cli_layer = ConfigLayer {
        organization: cli.organization.clone(),
        project: cli.project.clone(),
        repository: cli.repository.clone(),
        day_range: cli.days,
    };
    Config::resolve(file_layer.merge(cli_layer))
}

fn open_store(cli: &Cli) -> Result<Arc<dyn KeyValueStore>> {
    if cli.memory {
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = match &cli.store_path {
        Some(path) => FileStore::open(path),
        None => FileStore::open_default()?,
    };
    info!(path = %store.path().display(), "using store");
    Ok(Arc::new(store))
}

async fn run(cli: Cli) -> Result<()> {
    let store = open_store(&cli)?;
    let tracker = ViewedTracker::new(store.clone());
    let cache = CacheManager::new(store);

    // Viewed markers and cache sweeps need no repository configuration
    match &cli.command {
        Some(Command::Viewed {
            action: ViewedAction::List,
        }) => return print_viewed(&tracker).await,
        Some(Command::Viewed {
            action: ViewedAction::Toggle { id, title },
        }) => return toggle_viewed(&tracker, *id, title.as_deref()).await,
        Some(Command::Cache {
            action: CacheAction::Sweep,
        }) => {
            let removed = cache.sweep_expired().await;
            println!("Removed {} expired cache entries", removed);
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(&cli)?;
    let source = match &cli.az {
        Some(program) => AzCli::with_program(program.clone()),
        None => AzCli::new(),
    };
    let fetcher = PullRequestFetcher::new(cache, Arc::new(source));

    match cli.command {
        None | Some(Command::Tui) => run_tui(config, fetcher, tracker).await,
        Some(Command::List { refresh, json }) => {
            print_pull_requests(&config, &fetcher, &tracker, refresh, json).await
        }
        Some(Command::Cache {
            action: CacheAction::Clear,
        }) => {
            for range in DayRange::ALL {
                let key = CacheKey::for_config(&config, range);
                fetcher.cache().invalidate(&key).await;
                debug!(key = %key.encode(), "cache entry cleared");
            }
            println!(
                "Cleared cached pull requests for {}/{}/{}",
                config.organization, config.project, config.repository
            );
            Ok(())
        }
        Some(Command::Viewed { .. }) | Some(Command::Cache { .. }) => Ok(()),
    }
}

async fn run_tui(config: Config, fetcher: PullRequestFetcher, tracker: ViewedTracker) -> Result<()> {
    info!(
        organization = %config.organization,
        project = %config.project,
        repository = %config.repository,
        days = config.day_range.days(),
        "starting tui"
    );

    let mut app = App::new(config, fetcher, tracker);
    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal).await;
    ratatui::restore();
    result.map_err(AdoprError::from)
}

async fn print_pull_requests(
    config: &Config,
    fetcher: &PullRequestFetcher,
    tracker: &ViewedTracker,
    refresh: bool,
    json: bool,
) -> Result<()> {
    let key = CacheKey::for_config(config, config.day_range);
    let pull_requests = fetcher.fetch(&key, refresh).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pull_requests)?);
        return Ok(());
    }

    if pull_requests.is_empty() {
        println!(
            "No pull requests found in the last {} days",
            config.day_range.days()
        );
        return Ok(());
    }

    let viewed = tracker.get_all().await;
    for pr in &pull_requests {
        let marker = if viewed.contains_key(&pr.viewed_key()) {
            "✔"
        } else {
            " "
        };
        println!(
            "{} #{:<6} {} {}  ({}, {})",
            pr.status.glyph(),
            pr.pull_request_id,
            marker,
            pr.title,
            pr.created_by.display_name,
            ui::format_date(&pr.creation_date)
        );
    }
    Ok(())
}

async fn print_viewed(tracker: &ViewedTracker) -> Result<()> {
    let viewed = tracker.get_all().await;
    if viewed.is_empty() {
        println!("No pull requests marked viewed");
        return Ok(());
    }
    for (id, entry) in &viewed {
        println!(
            "#{:<6} {}  (viewed {})",
            id,
            entry.pr_title,
            ui::format_date(&entry.viewed_at)
        );
    }
    Ok(())
}

async fn toggle_viewed(tracker: &ViewedTracker, id: u64, title: Option<&str>) -> Result<()> {
    let viewed = tracker.get_all().await;
    let existing = viewed.get(&id.to_string());
    let title = title
        .map(str::to_string)
        .or_else(|| existing.map(|entry| entry.pr_title.clone()))
        .unwrap_or_else(|| format!("PR #{}", id));

    let now_viewed = tracker.toggle(id, &title, existing.is_some()).await;
    if now_viewed {
        println!("Marked as viewed: PR #{}", id);
    } else {
        println!("Marked as unread: PR #{}", id);
    }
    Ok(())
}
