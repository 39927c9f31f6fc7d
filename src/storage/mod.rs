// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod catalog;
mod json;
mod memory;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::model::{Episode, EpisodeId, Podcast, PodcastId};

pub use json::JsonStorage;
pub use memory::MemoryStorage;

/// Durable keyed storage for podcasts and their episodes.
///
/// Podcasts are keyed by feed URL and episodes by (podcast id, guid). Both
/// upserts replace on conflict, so writing the same episode twice is harmless.
/// Loaded podcasts never carry episodes; use [`Storage::load_episodes`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Look up a stored podcast by its feed URL
    async fn load_podcast_by_feed_url(&self, feed_url: &str)
    -> Result<Option<Podcast>, StorageError>;

    /// Snapshot of all stored podcasts, ordered by title
    async fn load_subscribed_podcasts(&self) -> Result<Vec<Podcast>, StorageError>;

    /// Episodes stored under a podcast, newest release first
    async fn load_episodes(&self, podcast_id: PodcastId) -> Result<Vec<Episode>, StorageError>;

    /// Insert or replace a podcast, returning its identifier
    async fn upsert_podcast(&self, podcast: &Podcast) -> Result<PodcastId, StorageError>;

    /// Insert or replace an episode. Its `podcast_id` must refer to a stored podcast.
    async fn upsert_episode(&self, episode: &Episode) -> Result<EpisodeId, StorageError>;

    /// Insert or replace several episodes, returning their identifiers in order.
    ///
    /// Backends that pay per write should override this to store the batch at once.
    async fn upsert_episodes(&self, episodes: &[Episode]) -> Result<Vec<EpisodeId>, StorageError> {
        let mut ids = Vec::with_capacity(episodes.len());
        for episode in episodes {
            ids.push(self.upsert_episode(episode).await?);
        }
        Ok(ids)
    }

    /// Remove a podcast and its episodes. Returns false if it was not stored.
    async fn delete_podcast(&self, podcast: &Podcast) -> Result<bool, StorageError>;
}
