use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::Emoji;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use podsync::config::{default_config_dir, default_library_path};
use podsync::{
    Config, JsonStorage, Library, LogReporter, NoopReporter, ProgressEvent, ProgressReporter,
    ReqwestClient, RssFetcher, SharedProgressReporter, run_periodic,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static NEW: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");

type AppLibrary = Library<JsonStorage, RssFetcher<ReqwestClient>>;

/// Keep a local podcast library in sync with its RSS feeds
#[derive(Parser, Debug)]
#[command(name = "podsync")]
#[command(about = "Keep a local podcast library in sync with its RSS feeds")]
#[command(version)]
struct Args {
    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the library file (overrides the config file)
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Subscribe to a podcast feed
    Subscribe {
        /// RSS feed URL
        feed_url: String,

        /// Artwork URL to store with the podcast
        #[arg(long, default_value = "")]
        image_url: String,
    },

    /// Remove a subscription and its episodes
    Unsubscribe {
        /// RSS feed URL
        feed_url: String,
    },

    /// List subscribed podcasts
    List,

    /// Show stored episodes of a subscribed podcast
    Episodes {
        /// RSS feed URL
        feed_url: String,

        /// Maximum number of episodes to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Check subscriptions for new episodes once
    Update {
        /// Only check this feed
        feed_url: Option<String>,

        /// Maximum number of feeds checked at once (0 = unlimited)
        #[arg(short = 'c', long)]
        concurrent: Option<usize>,

        /// Quiet mode - suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Keep checking for new episodes on a schedule until interrupted
    Watch {
        /// Minutes between update cycles
        #[arg(long)]
        interval_minutes: Option<u64>,
    },
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    multi: MultiProgress,
    main_bar: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Self {
        let multi = MultiProgress::new();

        let main_style = ProgressStyle::default_bar()
            .template("{spinner:.green} {wide_msg}")
            .unwrap();

        let main_bar = multi.add(ProgressBar::new_spinner());
        main_bar.set_style(main_style);
        main_bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Self { multi, main_bar }
    }

    fn line(&self, message: String) {
        let _ = self.multi.println(message);
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::SyncStarted { podcasts } => {
                self.main_bar.set_length(podcasts as u64);
                self.main_bar.set_message(format!(
                    "{HEADPHONES}Checking {} podcasts",
                    podcasts.to_string().cyan()
                ));
            }

            ProgressEvent::FetchingFeed { url } => {
                self.main_bar
                    .set_message(format!("{SEARCH}Fetching feed: {}", url.cyan()));
            }

            ProgressEvent::FeedChecked { .. } => {}

            ProgressEvent::PodcastUpdated {
                podcast_title,
                new_episodes,
                ..
            } => {
                self.line(format!(
                    "  {NEW}{} • {} new",
                    truncate_title(&podcast_title, 50).bold().green(),
                    new_episodes.to_string().yellow()
                ));
            }

            ProgressEvent::PodcastFailed { feed_url, error } => {
                self.line(format!(
                    "  {FAILURE}{} - {}",
                    feed_url.red(),
                    error.dimmed()
                ));
            }

            ProgressEvent::SyncCompleted {
                updated_count,
                unchanged_count,
                failed_count,
            } => {
                self.main_bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} updated, {} unchanged, {} failed",
                    "Update complete:".bold().green(),
                    updated_count.to_string().green().bold(),
                    unchanged_count.to_string().yellow(),
                    if failed_count > 0 {
                        failed_count.to_string().red().bold()
                    } else {
                        failed_count.to_string().green()
                    }
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let truncated: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

fn home_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Unattended runs log progress; interactive commands only log problems
    let default_filter = match args.command {
        Command::Watch { .. } => "podsync=info",
        _ => "podsync=warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_dir(&home_dir()?).join("config.toml"),
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let library_path = match args.library.or_else(|| config.library_path.clone()) {
        Some(path) => path,
        None => default_library_path(&home_dir()?),
    };

    let storage = Arc::new(
        JsonStorage::open(&library_path)
            .await
            .with_context(|| format!("Failed to open library {}", library_path.display()))?,
    );

    let client = match config.sync_options().fetch_timeout {
        Some(timeout) => {
            ReqwestClient::with_timeout(timeout).context("Failed to build HTTP client")?
        }
        None => ReqwestClient::new(),
    };

    let library = Library::new(storage.clone(), Arc::new(RssFetcher::new(client)));

    let result = run(args.command, &library, &config).await;

    drop(library);
    close_storage(storage).await?;

    result
}

async fn close_storage(storage: Arc<JsonStorage>) -> Result<()> {
    match Arc::try_unwrap(storage) {
        Ok(storage) => storage.close().await.context("Failed to close library"),
        Err(_) => {
            // Every change is already on disk; only the final flush is skipped
            tracing::warn!("Library still in use at shutdown, skipping final flush");
            Ok(())
        }
    }
}

async fn run(command: Command, library: &AppLibrary, config: &Config) -> Result<()> {
    match command {
        Command::Subscribe {
            feed_url,
            image_url,
        } => subscribe(library, &feed_url, &image_url).await,
        Command::Unsubscribe { feed_url } => {
            if library.unsubscribe(&feed_url).await? {
                println!("{SUCCESS}Unsubscribed from {}", feed_url.cyan());
            } else {
                println!("{FAILURE}Not subscribed to {}", feed_url.yellow());
            }
            Ok(())
        }
        Command::List => list(library).await,
        Command::Episodes { feed_url, limit } => episodes(library, &feed_url, limit).await,
        Command::Update {
            feed_url,
            concurrent,
            quiet,
        } => update(library, config, feed_url.as_deref(), concurrent, quiet).await,
        Command::Watch { interval_minutes } => {
            watch_subscriptions(library, config, interval_minutes).await
        }
    }
}

async fn subscribe(library: &AppLibrary, feed_url: &str, image_url: &str) -> Result<()> {
    let podcast = library
        .get_podcast(feed_url, image_url)
        .await
        .with_context(|| format!("Failed to load podcast from {feed_url}"))?;

    if podcast.is_subscribed() {
        println!("{HEADPHONES}Already subscribed to {}", podcast.title.bold());
        return Ok(());
    }

    let podcast = library
        .subscribe(podcast)
        .await
        .context("Failed to save subscription")?;

    println!(
        "{SUCCESS}Subscribed to {} ({} episodes)",
        podcast.title.bold().green(),
        podcast.episodes.len().to_string().cyan()
    );
    Ok(())
}

async fn list(library: &AppLibrary) -> Result<()> {
    let podcasts = library.subscriptions().await?;

    if podcasts.is_empty() {
        println!("No subscriptions yet. Add one with {}", "podsync subscribe <URL>".cyan());
        return Ok(());
    }

    for podcast in podcasts {
        println!(
            "{MICROPHONE}{}  {}  {}",
            podcast.title.bold(),
            podcast.last_updated.format("%Y-%m-%d").to_string().dimmed(),
            podcast.feed_url.cyan()
        );
    }
    Ok(())
}

async fn episodes(library: &AppLibrary, feed_url: &str, limit: usize) -> Result<()> {
    let episodes = library.episodes(feed_url).await?;

    for episode in episodes.iter().take(limit) {
        println!(
            "{}  {}  {}",
            episode.release_date.format("%Y-%m-%d").to_string().dimmed(),
            truncate_title(&episode.title, 60),
            episode.duration.yellow()
        );
    }

    if episodes.len() > limit {
        println!("... and {} more", (episodes.len() - limit).to_string().cyan());
    }
    Ok(())
}

async fn update(
    library: &AppLibrary,
    config: &Config,
    feed_url: Option<&str>,
    concurrent: Option<usize>,
    quiet: bool,
) -> Result<()> {
    let mut options = config.sync_options();
    if let Some(concurrent) = concurrent {
        options.max_concurrent = Some(concurrent).filter(|n| *n > 0);
    }

    if let Some(feed_url) = feed_url {
        let summary = library
            .update_podcast(feed_url, &options, &NoopReporter)
            .await
            .with_context(|| format!("Failed to update {feed_url}"))?;

        if !quiet {
            match summary {
                Some(summary) => println!(
                    "{NEW}{} • {} new",
                    summary.title.bold().green(),
                    summary.new_episode_count.to_string().yellow()
                ),
                None => println!("{HEADPHONES}No new episodes"),
            }
        }
        return Ok(());
    }

    if !quiet {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "podsync".bold().magenta(),
            "- Podcast Updater".dimmed()
        );
    }

    let reporter: SharedProgressReporter = if quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new())
    };

    let report = library
        .update_all(&options, reporter)
        .await
        .context("Failed to update podcasts")?;

    if !quiet {
        println!(
            "\n{FOLDER}Library: {}\n",
            library.storage().path().display().to_string().cyan()
        );
    }

    if report.failed > 0 && report.failed == report.checked {
        bail!("All {} feeds failed to update", report.failed);
    }

    Ok(())
}

async fn watch_subscriptions(
    library: &AppLibrary,
    config: &Config,
    interval_minutes: Option<u64>,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(minutes) = interval_minutes {
        config.refresh_interval_minutes = minutes;
    }
    let interval = config.refresh_interval();

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(true);
        }
    });

    tracing::info!(
        interval_minutes = interval.as_secs() / 60,
        "Watching subscriptions, press Ctrl-C to stop"
    );

    let cycles = run_periodic(
        library.clone(),
        interval,
        config.sync_options(),
        LogReporter::shared(),
        stop_rx,
    )
    .await
    .context("Scheduled update failed")?;

    tracing::info!(cycles, "Stopped watching");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_titles() {
        assert_eq!(truncate_title("Short", 10), "Short");
    }

    #[test]
    fn truncate_shortens_long_titles() {
        assert_eq!(truncate_title("A very long episode title", 10), "A very ...");
    }

    #[test]
    fn truncate_respects_multibyte_characters() {
        assert_eq!(truncate_title("Ünïcödé tïtlé hère", 8), "Ünïcö...");
    }

    #[test]
    fn cli_parses_update_with_concurrency() {
        let args = Args::parse_from(["podsync", "update", "-c", "2", "--quiet"]);
        assert!(matches!(
            args.command,
            Command::Update {
                feed_url: None,
                concurrent: Some(2),
                quiet: true
            }
        ));
    }

    #[test]
    fn cli_accepts_global_library_flag() {
        let args = Args::parse_from(["podsync", "list", "--library", "/tmp/lib.json"]);
        assert_eq!(args.library, Some(PathBuf::from("/tmp/lib.json")));
    }
}
