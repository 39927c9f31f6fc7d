use std::sync::Arc;

/// Events emitted during podcast synchronization for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// An update cycle is starting over a snapshot of subscriptions
    SyncStarted { podcasts: usize },

    /// Feed is being fetched from URL
    FetchingFeed { url: String },

    /// Feed has been fetched and compared against stored episodes
    FeedChecked {
        feed_url: String,
        podcast_title: String,
        total_episodes: usize,
        new_episodes: usize,
    },

    /// New episodes were saved for a podcast
    PodcastUpdated {
        feed_url: String,
        podcast_title: String,
        new_episodes: usize,
    },

    /// Checking a podcast failed; the cycle carries on without it
    PodcastFailed { feed_url: String, error: String },

    /// Update cycle completed. Emitted exactly once per cycle.
    SyncCompleted {
        updated_count: usize,
        unchanged_count: usize,
        failed_count: usize,
    },
}

/// Trait for reporting progress events during synchronization.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {
        // Intentionally empty
    }
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

/// Forwards progress events to `tracing`, for unattended runs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl LogReporter {
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

impl ProgressReporter for LogReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::SyncStarted { podcasts } => {
                tracing::info!(podcasts, "Update cycle started");
            }
            ProgressEvent::FetchingFeed { url } => {
                tracing::debug!(%url, "Fetching feed");
            }
            ProgressEvent::FeedChecked {
                feed_url,
                total_episodes,
                new_episodes,
                ..
            } => {
                tracing::debug!(%feed_url, total_episodes, new_episodes, "Feed checked");
            }
            ProgressEvent::PodcastUpdated {
                feed_url,
                podcast_title,
                new_episodes,
            } => {
                tracing::info!(%feed_url, title = %podcast_title, new_episodes, "Podcast updated");
            }
            ProgressEvent::PodcastFailed { feed_url, error } => {
                tracing::warn!(%feed_url, %error, "Podcast update failed");
            }
            ProgressEvent::SyncCompleted {
                updated_count,
                unchanged_count,
                failed_count,
            } => {
                tracing::info!(
                    updated = updated_count,
                    unchanged = unchanged_count,
                    failed = failed_count,
                    "Update cycle completed"
                );
            }
        }
    }
}
