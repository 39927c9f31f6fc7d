// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::diff::diff_episodes;
use crate::error::{FeedError, StorageError, SyncError};
use crate::feed::{FeedFetcher, RawFeed, normalize};
use crate::model::{Episode, Podcast, PodcastId};
use crate::progress::{ProgressEvent, ProgressReporter, SharedProgressReporter};
use crate::storage::Storage;

/// Options for an update cycle
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum number of podcasts checked at once (None = no limit)
    pub max_concurrent: Option<usize>,
    /// Give up on a feed that has not answered within this time (None = wait forever)
    pub fetch_timeout: Option<Duration>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_concurrent: Some(4),
            fetch_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// A podcast that received new episodes during an update
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UpdateSummary {
    pub feed_url: String,
    pub title: String,
    pub new_episode_count: usize,
}

/// Result of an update cycle
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Podcasts with new episodes, in completion order
    pub updates: Vec<UpdateSummary>,
    /// Number of podcasts in the snapshot that were checked
    pub checked: usize,
    /// Podcasts whose feed had nothing new
    pub unchanged: usize,
    /// Podcasts whose feed could not be fetched or understood
    pub failed: usize,
}

impl SyncReport {
    /// Total number of episodes saved across all podcasts
    pub fn new_episode_count(&self) -> usize {
        self.updates.iter().map(|u| u.new_episode_count).sum()
    }
}

/// Check every subscribed podcast for new episodes and save them
///
/// Subscriptions are read once up front; podcasts added while the cycle runs
/// wait for the next one. Each podcast is checked in its own task and the
/// function returns only after every task has finished, whether it found new
/// episodes, found none, or failed. Feed failures are counted in the report
/// and never abort the cycle. A storage failure is returned as an error once
/// all tasks have finished.
///
/// Dropping the returned future aborts all outstanding checks.
pub async fn update_all<S, F>(
    storage: Arc<S>,
    fetcher: Arc<F>,
    options: &SyncOptions,
    reporter: SharedProgressReporter,
) -> Result<SyncReport, SyncError>
where
    S: Storage + ?Sized + 'static,
    F: FeedFetcher + ?Sized + 'static,
{
    let podcasts = storage.load_subscribed_podcasts().await?;

    reporter.report(ProgressEvent::SyncStarted {
        podcasts: podcasts.len(),
    });

    let limiter = options
        .max_concurrent
        .map(|max| Arc::new(Semaphore::new(max.max(1))));

    let mut tasks = JoinSet::new();

    for podcast in podcasts {
        let storage = storage.clone();
        let fetcher = fetcher.clone();
        let reporter = reporter.clone();
        let limiter = limiter.clone();
        let fetch_timeout = options.fetch_timeout;

        tasks.spawn(async move {
            let _permit = match limiter {
                Some(limiter) => limiter.acquire_owned().await.ok(),
                None => None,
            };

            let result = check_podcast(
                storage.as_ref(),
                fetcher.as_ref(),
                &podcast,
                fetch_timeout,
                reporter.as_ref(),
            )
            .await;

            (podcast.feed_url, result)
        });
    }

    let mut report = SyncReport::default();
    let mut storage_failure: Option<StorageError> = None;

    // Barrier: every spawned task is joined, whatever its outcome
    while let Some(joined) = tasks.join_next().await {
        report.checked += 1;

        match joined {
            Ok((_, Ok(Some(summary)))) => report.updates.push(summary),
            Ok((_, Ok(None))) => report.unchanged += 1,
            Ok((feed_url, Err(e))) => {
                report.failed += 1;
                reporter.report(ProgressEvent::PodcastFailed {
                    feed_url,
                    error: e.to_string(),
                });

                if let SyncError::Storage(e) = e {
                    storage_failure.get_or_insert(e);
                }
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!(error = %e, "Podcast update task did not finish");
            }
        }
    }

    reporter.report(ProgressEvent::SyncCompleted {
        updated_count: report.updates.len(),
        unchanged_count: report.unchanged,
        failed_count: report.failed,
    });

    if let Some(e) = storage_failure {
        return Err(e.into());
    }

    Ok(report)
}

/// Check a single subscribed podcast for new episodes right away
///
/// Unlike [`update_all`], feed failures are returned to the caller.
pub async fn update_podcast<S, F>(
    storage: &S,
    fetcher: &F,
    feed_url: &str,
    options: &SyncOptions,
    reporter: &dyn ProgressReporter,
) -> Result<Option<UpdateSummary>, SyncError>
where
    S: Storage + ?Sized,
    F: FeedFetcher + ?Sized,
{
    let podcast = storage
        .load_podcast_by_feed_url(feed_url)
        .await?
        .ok_or_else(|| SyncError::NotSubscribed {
            feed_url: feed_url.to_string(),
        })?;

    check_podcast(storage, fetcher, &podcast, options.fetch_timeout, reporter).await
}

/// Fetch, normalize, diff and save one podcast
async fn check_podcast<S, F>(
    storage: &S,
    fetcher: &F,
    podcast: &Podcast,
    fetch_timeout: Option<Duration>,
    reporter: &dyn ProgressReporter,
) -> Result<Option<UpdateSummary>, SyncError>
where
    S: Storage + ?Sized,
    F: FeedFetcher + ?Sized,
{
    let podcast_id = podcast.id.ok_or_else(|| SyncError::NotSubscribed {
        feed_url: podcast.feed_url.clone(),
    })?;

    reporter.report(ProgressEvent::FetchingFeed {
        url: podcast.feed_url.clone(),
    });

    let raw = fetch_with_timeout(fetcher, &podcast.feed_url, fetch_timeout).await?;
    let remote = normalize(&podcast.feed_url, &podcast.image_url, raw)?;

    let local = storage.load_episodes(podcast_id).await?;
    let diff = diff_episodes(&local, &remote.episodes);

    reporter.report(ProgressEvent::FeedChecked {
        feed_url: podcast.feed_url.clone(),
        podcast_title: podcast.title.clone(),
        total_episodes: diff.total_episodes,
        new_episodes: diff.new_episodes.len(),
    });

    if diff.new_episodes.is_empty() {
        return Ok(None);
    }

    let saved = save_new_episodes(storage, podcast_id, diff.new_episodes).await?;

    reporter.report(ProgressEvent::PodcastUpdated {
        feed_url: podcast.feed_url.clone(),
        podcast_title: podcast.title.clone(),
        new_episodes: saved,
    });

    Ok(Some(UpdateSummary {
        feed_url: podcast.feed_url.clone(),
        title: podcast.title.clone(),
        new_episode_count: saved,
    }))
}

async fn fetch_with_timeout<F: FeedFetcher + ?Sized>(
    fetcher: &F,
    feed_url: &str,
    fetch_timeout: Option<Duration>,
) -> Result<RawFeed, FeedError> {
    let Some(limit) = fetch_timeout else {
        return fetcher.fetch(feed_url).await;
    };

    tokio::time::timeout(limit, fetcher.fetch(feed_url))
        .await
        .map_err(|_| FeedError::Timeout {
            url: feed_url.to_string(),
            seconds: limit.as_secs(),
        })?
}

/// Attach episodes to a stored podcast and upsert them as one batch.
///
/// Returns how many episodes were written.
pub(crate) async fn save_new_episodes<S: Storage + ?Sized>(
    storage: &S,
    podcast_id: PodcastId,
    mut episodes: Vec<Episode>,
) -> Result<usize, StorageError> {
    for episode in &mut episodes {
        episode.podcast_id = Some(podcast_id);
    }
    Ok(storage.upsert_episodes(&episodes).await?.len())
}
