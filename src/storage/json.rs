// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::model::{Episode, EpisodeId, Podcast, PodcastId};

use super::Storage;
use super::catalog::Catalog;

/// Storage persisted to a single JSON file.
///
/// The whole catalog is held in memory and rewritten after every change.
/// Writes go to a temporary file that is renamed over the library file, so
/// an interrupted write never leaves a truncated library behind.
#[derive(Debug)]
pub struct JsonStorage {
    path: PathBuf,
    catalog: Mutex<Catalog>,
}

impl JsonStorage {
    /// Open the library at `path`, starting empty if the file does not exist yet
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::WriteFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let existing = tokio::fs::read(&path).await;
        let catalog = match existing {
            Ok(content) => {
                serde_json::from_slice(&content).map_err(|e| StorageError::JsonParseFailed {
                    path: path.clone(),
                    source: e,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Catalog::default(),
            Err(e) => return Err(StorageError::ReadFailed { path, source: e }),
        };

        tracing::debug!(path = %path.display(), "Opened library");

        Ok(Self {
            path,
            catalog: Mutex::new(catalog),
        })
    }

    /// Path of the library file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush the library to disk and release it
    pub async fn close(self) -> Result<(), StorageError> {
        let catalog = self.catalog.into_inner();
        write_catalog(&self.path, &catalog).await?;
        tracing::debug!(path = %self.path.display(), "Closed library");
        Ok(())
    }

    /// Apply `change` to a copy of the catalog and keep it only once it is on disk
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut Catalog) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut catalog = self.catalog.lock().await;
        let mut staged = catalog.clone();
        let value = change(&mut staged)?;
        write_catalog(&self.path, &staged).await?;
        *catalog = staged;
        Ok(value)
    }
}

/// `library.json` is staged as `library.json.tmp`, next to it
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

async fn write_catalog(path: &Path, catalog: &Catalog) -> Result<(), StorageError> {
    let json = serde_json::to_vec_pretty(catalog)?;
    let temp_path = temp_path(path);

    tokio::fs::write(&temp_path, json)
        .await
        .map_err(|e| StorageError::WriteFailed {
            path: temp_path.clone(),
            source: e,
        })?;

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| StorageError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

#[async_trait]
impl Storage for JsonStorage {
    async fn load_podcast_by_feed_url(
        &self,
        feed_url: &str,
    ) -> Result<Option<Podcast>, StorageError> {
        Ok(self.catalog.lock().await.podcast_by_feed_url(feed_url))
    }

    async fn load_subscribed_podcasts(&self) -> Result<Vec<Podcast>, StorageError> {
        Ok(self.catalog.lock().await.podcasts())
    }

    async fn load_episodes(&self, podcast_id: PodcastId) -> Result<Vec<Episode>, StorageError> {
        Ok(self.catalog.lock().await.episodes(podcast_id))
    }

    async fn upsert_podcast(&self, podcast: &Podcast) -> Result<PodcastId, StorageError> {
        self.commit(|catalog| Ok(catalog.upsert_podcast(podcast))).await
    }

    async fn upsert_episode(&self, episode: &Episode) -> Result<EpisodeId, StorageError> {
        self.commit(|catalog| catalog.upsert_episode(episode)).await
    }

    async fn upsert_episodes(&self, episodes: &[Episode]) -> Result<Vec<EpisodeId>, StorageError> {
        self.commit(|catalog| catalog.upsert_episodes(episodes)).await
    }

    async fn delete_podcast(&self, podcast: &Podcast) -> Result<bool, StorageError> {
        let mut catalog = self.catalog.lock().await;
        let mut staged = catalog.clone();
        if !staged.delete_podcast(podcast) {
            return Ok(false);
        }
        write_catalog(&self.path, &staged).await?;
        *catalog = staged;
        Ok(true)
    }
}
