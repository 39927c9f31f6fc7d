// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::model::{Episode, EpisodeId, Podcast, PodcastId};

/// The complete set of stored podcasts and episodes.
///
/// Shared by the storage backends; the JSON backend serializes it as-is.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct Catalog {
    next_podcast_id: i64,
    next_episode_id: i64,
    podcasts: Vec<StoredPodcast>,
    episodes: Vec<StoredEpisode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPodcast {
    id: PodcastId,
    podcast: Podcast,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEpisode {
    id: EpisodeId,
    episode: Episode,
}

impl Catalog {
    pub(crate) fn podcast_by_feed_url(&self, feed_url: &str) -> Option<Podcast> {
        self.podcasts
            .iter()
            .find(|stored| stored.podcast.feed_url == feed_url)
            .map(|stored| stored.podcast.clone())
    }

    fn contains_podcast(&self, id: PodcastId) -> bool {
        self.podcasts.iter().any(|stored| stored.id == id)
    }

    pub(crate) fn podcasts(&self) -> Vec<Podcast> {
        let mut podcasts: Vec<Podcast> = self
            .podcasts
            .iter()
            .map(|stored| stored.podcast.clone())
            .collect();
        podcasts.sort_by(|a, b| {
            a.title
                .cmp(&b.title)
                .then_with(|| a.feed_url.cmp(&b.feed_url))
        });
        podcasts
    }

    pub(crate) fn episodes(&self, podcast_id: PodcastId) -> Vec<Episode> {
        let mut episodes: Vec<Episode> = self
            .episodes
            .iter()
            .filter(|stored| stored.episode.podcast_id == Some(podcast_id))
            .map(|stored| stored.episode.clone())
            .collect();
        episodes.sort_by(|a, b| b.release_date.cmp(&a.release_date));
        episodes
    }

    pub(crate) fn upsert_podcast(&mut self, podcast: &Podcast) -> PodcastId {
        let mut record = podcast.clone();
        record.episodes = Vec::new();

        if let Some(existing) = self
            .podcasts
            .iter_mut()
            .find(|stored| stored.podcast.feed_url == podcast.feed_url)
        {
            record.id = Some(existing.id);
            existing.podcast = record;
            return existing.id;
        }

        self.next_podcast_id += 1;
        let id = PodcastId(self.next_podcast_id);
        record.id = Some(id);
        self.podcasts.push(StoredPodcast {
            id,
            podcast: record,
        });
        id
    }

    pub(crate) fn upsert_episode(&mut self, episode: &Episode) -> Result<EpisodeId, StorageError> {
        let podcast_id = episode
            .podcast_id
            .filter(|id| self.contains_podcast(*id))
            .ok_or_else(|| StorageError::NotPersisted {
                guid: episode.guid.clone(),
            })?;

        if let Some(existing) = self.episodes.iter_mut().find(|stored| {
            stored.episode.podcast_id == Some(podcast_id) && stored.episode.guid == episode.guid
        }) {
            existing.episode = episode.clone();
            return Ok(existing.id);
        }

        self.next_episode_id += 1;
        let id = EpisodeId(self.next_episode_id);
        self.episodes.push(StoredEpisode {
            id,
            episode: episode.clone(),
        });
        Ok(id)
    }

    /// Upsert a batch of episodes. Nothing is written unless every episode
    /// belongs to a stored podcast.
    pub(crate) fn upsert_episodes(
        &mut self,
        episodes: &[Episode],
    ) -> Result<Vec<EpisodeId>, StorageError> {
        if let Some(orphan) = episodes
            .iter()
            .find(|e| !e.podcast_id.is_some_and(|id| self.contains_podcast(id)))
        {
            return Err(StorageError::NotPersisted {
                guid: orphan.guid.clone(),
            });
        }

        episodes.iter().map(|e| self.upsert_episode(e)).collect()
    }

    pub(crate) fn delete_podcast(&mut self, podcast: &Podcast) -> bool {
        let position = self.podcasts.iter().position(|stored| match podcast.id {
            Some(id) => stored.id == id,
            None => stored.podcast.feed_url == podcast.feed_url,
        });

        let Some(position) = position else {
            return false;
        };

        let removed = self.podcasts.remove(position);
        self.episodes
            .retain(|stored| stored.episode.podcast_id != Some(removed.id));
        true
    }
}
