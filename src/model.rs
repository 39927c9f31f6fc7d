// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a podcast by storage on first persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PodcastId(pub i64);

/// Identifier assigned to a stored episode row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(pub i64);

impl fmt::Display for PodcastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A podcast, either freshly normalized from its feed or loaded from storage.
///
/// The feed URL is the stable external identity. `id` is only present once
/// the podcast has been persisted, which is what marks it as subscribed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Podcast {
    pub id: Option<PodcastId>,
    pub feed_url: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episodes: Vec<Episode>,
}

impl Podcast {
    /// Whether this podcast has been saved to storage
    pub fn is_subscribed(&self) -> bool {
        self.id.is_some()
    }
}

/// A single podcast episode.
///
/// Two episodes are the same entity iff their guids are equal. Guids are
/// only unique within one podcast's feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub guid: String,
    pub podcast_id: Option<PodcastId>,
    pub title: String,
    pub description: String,
    pub media_url: String,
    pub media_type: String,
    pub release_date: DateTime<Utc>,
    /// Free text as published by the feed, e.g. "30:00" or "1800"
    pub duration: String,
}

impl Episode {
    /// Identity comparison by guid, ignoring every other field
    pub fn is_same_as(&self, other: &Episode) -> bool {
        self.guid == other.guid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_episode(guid: &str, title: &str) -> Episode {
        Episode {
            guid: guid.to_string(),
            podcast_id: None,
            title: title.to_string(),
            description: String::new(),
            media_url: format!("https://example.com/{guid}.mp3"),
            media_type: "audio/mpeg".to_string(),
            release_date: Utc::now(),
            duration: String::new(),
        }
    }

    #[test]
    fn episodes_with_same_guid_are_same_entity() {
        let a = make_episode("ep-1", "Original title");
        let b = make_episode("ep-1", "Edited title");
        let c = make_episode("ep-2", "Original title");

        assert!(a.is_same_as(&b));
        assert!(!a.is_same_as(&c));
    }

    #[test]
    fn podcast_without_id_is_not_subscribed() {
        let mut podcast = Podcast {
            id: None,
            feed_url: "https://example.com/feed.xml".to_string(),
            title: "Test".to_string(),
            description: String::new(),
            image_url: String::new(),
            last_updated: Utc::now(),
            episodes: vec![],
        };
        assert!(!podcast.is_subscribed());

        podcast.id = Some(PodcastId(7));
        assert!(podcast.is_subscribed());
    }

    #[test]
    fn podcast_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PodcastId(42)).unwrap();
        assert_eq!(json, "42");
    }
}
