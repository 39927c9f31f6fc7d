// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::model::{Episode, EpisodeId, Podcast, PodcastId};

use super::Storage;
use super::catalog::Catalog;

/// In-process storage that forgets everything when dropped
#[derive(Debug, Default)]
pub struct MemoryStorage {
    catalog: RwLock<Catalog>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn load_podcast_by_feed_url(
        &self,
        feed_url: &str,
    ) -> Result<Option<Podcast>, StorageError> {
        Ok(self.catalog.read().await.podcast_by_feed_url(feed_url))
    }

    async fn load_subscribed_podcasts(&self) -> Result<Vec<Podcast>, StorageError> {
        Ok(self.catalog.read().await.podcasts())
    }

    async fn load_episodes(&self, podcast_id: PodcastId) -> Result<Vec<Episode>, StorageError> {
        Ok(self.catalog.read().await.episodes(podcast_id))
    }

    async fn upsert_podcast(&self, podcast: &Podcast) -> Result<PodcastId, StorageError> {
        Ok(self.catalog.write().await.upsert_podcast(podcast))
    }

    async fn upsert_episode(&self, episode: &Episode) -> Result<EpisodeId, StorageError> {
        self.catalog.write().await.upsert_episode(episode)
    }

    async fn upsert_episodes(&self, episodes: &[Episode]) -> Result<Vec<EpisodeId>, StorageError> {
        self.catalog.write().await.upsert_episodes(episodes)
    }

    async fn delete_podcast(&self, podcast: &Podcast) -> Result<bool, StorageError> {
        Ok(self.catalog.write().await.delete_podcast(podcast))
    }
}
