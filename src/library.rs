// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use url::Url;

use crate::error::{FeedError, SyncError};
use crate::feed::{FeedFetcher, normalize};
use crate::model::{Episode, Podcast};
use crate::progress::{ProgressReporter, SharedProgressReporter};
use crate::storage::Storage;
use crate::sync::{
    SyncOptions, SyncReport, UpdateSummary, save_new_episodes, update_all, update_podcast,
};

/// Subscription management over a storage backend and a feed fetcher.
///
/// Constructed once at startup and shared; cloning is cheap.
pub struct Library<S: ?Sized, F: ?Sized> {
    storage: Arc<S>,
    fetcher: Arc<F>,
}

impl<S: ?Sized, F: ?Sized> Clone for Library<S, F> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            fetcher: self.fetcher.clone(),
        }
    }
}

impl<S, F> Library<S, F>
where
    S: Storage + ?Sized + 'static,
    F: FeedFetcher + ?Sized + 'static,
{
    pub fn new(storage: Arc<S>, fetcher: Arc<F>) -> Self {
        Self { storage, fetcher }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Load a podcast for display.
    ///
    /// A subscribed podcast comes from storage together with its stored
    /// episodes. Anything else is fetched and normalized but not saved;
    /// `image_url` is used as its artwork.
    pub async fn get_podcast(&self, feed_url: &str, image_url: &str) -> Result<Podcast, SyncError> {
        if let Some(mut podcast) = self.storage.load_podcast_by_feed_url(feed_url).await? {
            if let Some(id) = podcast.id {
                podcast.episodes = self.storage.load_episodes(id).await?;
            }
            return Ok(podcast);
        }

        let raw = self.fetcher.fetch(feed_url).await?;
        Ok(normalize(feed_url, image_url, raw)?)
    }

    /// Save a podcast and all its episodes, returning the stored version
    pub async fn subscribe(&self, mut podcast: Podcast) -> Result<Podcast, SyncError> {
        Url::parse(&podcast.feed_url).map_err(FeedError::InvalidUrl)?;

        let id = self.storage.upsert_podcast(&podcast).await?;
        let episodes = std::mem::take(&mut podcast.episodes);
        let saved = save_new_episodes(self.storage.as_ref(), id, episodes).await?;

        tracing::info!(feed_url = %podcast.feed_url, episodes = saved, "Subscribed");

        podcast.id = Some(id);
        podcast.episodes = self.storage.load_episodes(id).await?;
        Ok(podcast)
    }

    /// Remove a subscription and its episodes. Returns false if there was none.
    pub async fn unsubscribe(&self, feed_url: &str) -> Result<bool, SyncError> {
        let Some(podcast) = self.storage.load_podcast_by_feed_url(feed_url).await? else {
            return Ok(false);
        };

        let removed = self.storage.delete_podcast(&podcast).await?;
        if removed {
            tracing::info!(%feed_url, "Unsubscribed");
        }
        Ok(removed)
    }

    /// All subscribed podcasts, ordered by title, without episodes
    pub async fn subscriptions(&self) -> Result<Vec<Podcast>, SyncError> {
        Ok(self.storage.load_subscribed_podcasts().await?)
    }

    /// Stored episodes of a subscribed podcast, newest first
    pub async fn episodes(&self, feed_url: &str) -> Result<Vec<Episode>, SyncError> {
        let id = self
            .storage
            .load_podcast_by_feed_url(feed_url)
            .await?
            .and_then(|p| p.id)
            .ok_or_else(|| SyncError::NotSubscribed {
                feed_url: feed_url.to_string(),
            })?;

        Ok(self.storage.load_episodes(id).await?)
    }

    /// Check every subscription for new episodes, see [`update_all`]
    pub async fn update_all(
        &self,
        options: &SyncOptions,
        reporter: SharedProgressReporter,
    ) -> Result<SyncReport, SyncError> {
        update_all(self.storage.clone(), self.fetcher.clone(), options, reporter).await
    }

    /// Check one subscription for new episodes, see [`update_podcast`]
    pub async fn update_podcast(
        &self,
        feed_url: &str,
        options: &SyncOptions,
        reporter: &dyn ProgressReporter,
    ) -> Result<Option<UpdateSummary>, SyncError> {
        update_podcast(
            self.storage.as_ref(),
            self.fetcher.as_ref(),
            feed_url,
            options,
            reporter,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::feed::{RawEpisode, RawFeed};
    use crate::progress::NoopReporter;
    use crate::storage::MemoryStorage;

    const FEED_URL: &str = "https://example.com/feed.xml";

    struct StaticFetcher {
        guids: Vec<&'static str>,
    }

    #[async_trait]
    impl FeedFetcher for StaticFetcher {
        async fn fetch(&self, feed_url: &str) -> Result<RawFeed, FeedError> {
            if feed_url != FEED_URL {
                return Err(FeedError::HttpStatus {
                    url: feed_url.to_string(),
                    status: 404,
                });
            }

            Ok(RawFeed {
                title: "Test Podcast".to_string(),
                description: String::new(),
                summary: "Short desc".to_string(),
                last_updated: None,
                episodes: Some(
                    self.guids
                        .iter()
                        .map(|guid| RawEpisode {
                            guid: Some(guid.to_string()),
                            ..Default::default()
                        })
                        .collect(),
                ),
            })
        }
    }

    fn library(guids: Vec<&'static str>) -> Library<MemoryStorage, StaticFetcher> {
        Library::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(StaticFetcher { guids }),
        )
    }

    #[tokio::test]
    async fn unsubscribed_podcast_is_fetched_but_not_saved() {
        let library = library(vec!["a", "b"]);

        let podcast = library
            .get_podcast(FEED_URL, "https://example.com/art.jpg")
            .await
            .unwrap();

        assert!(!podcast.is_subscribed());
        assert_eq!(podcast.description, "Short desc");
        assert_eq!(podcast.image_url, "https://example.com/art.jpg");
        assert_eq!(podcast.episodes.len(), 2);
        assert!(library.subscriptions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscribe_persists_podcast_and_episodes() {
        let library = library(vec!["a", "b"]);
        let podcast = library.get_podcast(FEED_URL, "").await.unwrap();

        let saved = library.subscribe(podcast).await.unwrap();

        assert!(saved.is_subscribed());
        assert_eq!(saved.episodes.len(), 2);
        assert!(saved.episodes.iter().all(|e| e.podcast_id == saved.id));

        let loaded = library.get_podcast(FEED_URL, "").await.unwrap();
        assert_eq!(loaded.id, saved.id);
        assert_eq!(loaded.episodes.len(), 2);
    }

    #[tokio::test]
    async fn subscribing_twice_does_not_duplicate() {
        let library = library(vec!["a"]);

        let first = library
            .subscribe(library.get_podcast(FEED_URL, "").await.unwrap())
            .await
            .unwrap();
        let refetched = normalize(
            FEED_URL,
            "",
            StaticFetcher { guids: vec!["a"] }.fetch(FEED_URL).await.unwrap(),
        )
        .unwrap();
        let second = library.subscribe(refetched).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(library.subscriptions().await.unwrap().len(), 1);
        assert_eq!(library.episodes(FEED_URL).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn subscribe_rejects_invalid_url() {
        let library = library(vec![]);
        let mut podcast = library.get_podcast(FEED_URL, "").await.unwrap();
        podcast.feed_url = "not a url".to_string();

        let result = library.subscribe(podcast).await;
        assert!(matches!(result, Err(SyncError::Feed(FeedError::InvalidUrl(_)))));
    }

    #[tokio::test]
    async fn unsubscribe_removes_podcast_and_episodes() {
        let library = library(vec!["a"]);
        library
            .subscribe(library.get_podcast(FEED_URL, "").await.unwrap())
            .await
            .unwrap();

        assert!(library.unsubscribe(FEED_URL).await.unwrap());
        assert!(!library.unsubscribe(FEED_URL).await.unwrap());
        assert!(library.subscriptions().await.unwrap().is_empty());
        assert!(matches!(
            library.episodes(FEED_URL).await,
            Err(SyncError::NotSubscribed { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_feed_propagates_fetch_error() {
        let library = library(vec![]);

        let result = library.get_podcast("https://example.com/other.xml", "").await;
        assert!(matches!(result, Err(SyncError::Feed(FeedError::HttpStatus { .. }))));
    }

    #[tokio::test]
    async fn update_through_library_handle() {
        let library = library(vec!["a", "b"]);
        let mut podcast = library.get_podcast(FEED_URL, "").await.unwrap();
        podcast.episodes.truncate(1);
        library.subscribe(podcast).await.unwrap();

        let report = library
            .update_all(&SyncOptions::default(), NoopReporter::shared())
            .await
            .unwrap();
        assert_eq!(report.new_episode_count(), 1);

        let again = library
            .update_podcast(FEED_URL, &SyncOptions::default(), &NoopReporter)
            .await
            .unwrap();
        assert!(again.is_none());
    }
}
