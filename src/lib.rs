pub mod config;
pub mod diff;
pub mod error;
pub mod feed;
pub mod http;
pub mod library;
pub mod model;
pub mod progress;
pub mod schedule;
pub mod storage;
pub mod sync;

// Re-export main types for convenience
pub use config::Config;
pub use diff::{EpisodeDiff, diff_episodes, find_new_episodes};
pub use error::{ConfigError, FeedError, StorageError, SyncError};
pub use feed::{FeedFetcher, RawEpisode, RawFeed, RssFetcher, normalize, parse_raw_feed};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use library::Library;
pub use model::{Episode, EpisodeId, Podcast, PodcastId};
pub use progress::{
    LogReporter, NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter,
};
pub use schedule::run_periodic;
pub use storage::{JsonStorage, MemoryStorage, Storage};
pub use sync::{SyncOptions, SyncReport, UpdateSummary, update_all, update_podcast};
