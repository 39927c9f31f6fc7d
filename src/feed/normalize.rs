// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset, Utc};

use crate::error::FeedError;
use crate::model::{Episode, Podcast};

use super::parse::{RawEpisode, RawFeed};

/// Map a raw feed into a Podcast and its episodes.
///
/// Fails with [`FeedError::MissingEpisodes`] when the feed carries no episode
/// list at all; an empty list yields a podcast without episodes. Dates that
/// cannot be parsed fall back to the current time.
pub fn normalize(feed_url: &str, image_url: &str, raw: RawFeed) -> Result<Podcast, FeedError> {
    normalize_at(feed_url, image_url, raw, Utc::now())
}

/// Same as [`normalize`], with `now` used as the fallback for unparsable dates
pub fn normalize_at(
    feed_url: &str,
    image_url: &str,
    raw: RawFeed,
    now: DateTime<Utc>,
) -> Result<Podcast, FeedError> {
    let items = raw.episodes.ok_or_else(|| FeedError::MissingEpisodes {
        url: feed_url.to_string(),
    })?;

    let description = if raw.description.is_empty() {
        raw.summary
    } else {
        raw.description
    };

    let episodes = items
        .into_iter()
        .map(|item| normalize_episode(item, now))
        .collect();

    Ok(Podcast {
        id: None,
        feed_url: feed_url.to_string(),
        title: raw.title,
        description,
        image_url: image_url.to_string(),
        last_updated: date_or(raw.last_updated.as_deref(), now),
        episodes,
    })
}

fn normalize_episode(item: RawEpisode, now: DateTime<Utc>) -> Episode {
    Episode {
        guid: item.guid.unwrap_or_default(),
        podcast_id: None,
        title: item.title.unwrap_or_default(),
        description: item.description.unwrap_or_default(),
        media_url: item.url.unwrap_or_default(),
        media_type: item.media_type.unwrap_or_default(),
        release_date: date_or(item.pub_date.as_deref(), now),
        duration: item.duration.unwrap_or_default(),
    }
}

// Episodes with unusable dates sort as newest; existing callers rely on that.
fn date_or(date_str: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(date_str) = date_str else {
        return now;
    };

    match parse_release_date(date_str) {
        Ok(date) => date.with_timezone(&Utc),
        Err(e) => {
            tracing::debug!(error = %e, "Substituting current time for unparsable date");
            now
        }
    }
}

/// Parse an RFC 822 style feed date such as `Mon, 02 Jan 2006 15:04:05 MST`
pub fn parse_release_date(date_str: &str) -> Result<DateTime<FixedOffset>, FeedError> {
    let trimmed = date_str.trim();

    if let Ok(date) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(date);
    }

    // Common alternative formats seen in the wild
    let formats = [
        "%a, %d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S %z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S %z",
    ];

    for format in formats {
        if let Ok(date) = DateTime::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }

    Err(FeedError::InvalidDate {
        date_str: date_str.to_string(),
        reason: "not an RFC 822 date".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    const FEED_URL: &str = "https://example.com/feed.xml";

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    fn raw_feed(episodes: Option<Vec<RawEpisode>>) -> RawFeed {
        RawFeed {
            title: "Test Podcast".to_string(),
            description: "Long description".to_string(),
            summary: "Short desc".to_string(),
            last_updated: Some("Mon, 01 Jan 2024 12:00:00 +0000".to_string()),
            episodes,
        }
    }

    fn full_item(guid: &str) -> RawEpisode {
        RawEpisode {
            guid: Some(guid.to_string()),
            title: Some(format!("Episode {guid}")),
            description: Some("About things".to_string()),
            url: Some(format!("https://example.com/{guid}.mp3")),
            media_type: Some("audio/mpeg".to_string()),
            pub_date: Some("Mon, 02 Jan 2006 15:04:05 GMT".to_string()),
            duration: Some("42:00".to_string()),
        }
    }

    #[test]
    fn missing_episode_list_yields_no_podcast() {
        let result = normalize(FEED_URL, "", raw_feed(None));
        assert!(matches!(result, Err(FeedError::MissingEpisodes { url }) if url == FEED_URL));
    }

    #[test]
    fn empty_episode_list_is_valid() {
        let podcast = normalize(FEED_URL, "", raw_feed(Some(vec![]))).unwrap();
        assert!(podcast.episodes.is_empty());
        assert_eq!(podcast.title, "Test Podcast");
    }

    #[test]
    fn empty_description_falls_back_to_summary() {
        let mut raw = raw_feed(Some(vec![]));
        raw.description = String::new();

        let podcast = normalize(FEED_URL, "", raw).unwrap();
        assert_eq!(podcast.description, "Short desc");
    }

    #[test]
    fn non_empty_description_is_used_verbatim() {
        let podcast = normalize(FEED_URL, "", raw_feed(Some(vec![]))).unwrap();
        assert_eq!(podcast.description, "Long description");
    }

    #[test]
    fn normalized_podcast_is_not_persisted() {
        let podcast = normalize(
            FEED_URL,
            "https://example.com/art.jpg",
            raw_feed(Some(vec![full_item("a")])),
        )
        .unwrap();

        assert!(podcast.id.is_none());
        assert_eq!(podcast.feed_url, FEED_URL);
        assert_eq!(podcast.image_url, "https://example.com/art.jpg");
        assert!(podcast.episodes[0].podcast_id.is_none());
    }

    #[test]
    fn episode_fields_are_mapped() {
        let podcast = normalize(FEED_URL, "", raw_feed(Some(vec![full_item("a")]))).unwrap();
        let episode = &podcast.episodes[0];

        assert_eq!(episode.guid, "a");
        assert_eq!(episode.title, "Episode a");
        assert_eq!(episode.description, "About things");
        assert_eq!(episode.media_url, "https://example.com/a.mp3");
        assert_eq!(episode.media_type, "audio/mpeg");
        assert_eq!(episode.duration, "42:00");
        assert_eq!(
            episode.release_date,
            Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap()
        );
    }

    #[test]
    fn missing_text_fields_default_to_empty() {
        let podcast = normalize_at(
            FEED_URL,
            "",
            raw_feed(Some(vec![RawEpisode::default()])),
            fixed_now(),
        )
        .unwrap();
        let episode = &podcast.episodes[0];

        assert_eq!(episode.guid, "");
        assert_eq!(episode.title, "");
        assert_eq!(episode.description, "");
        assert_eq!(episode.media_url, "");
        assert_eq!(episode.media_type, "");
        assert_eq!(episode.duration, "");
        assert_eq!(episode.release_date, fixed_now());
    }

    #[test]
    fn unparsable_date_uses_current_time() {
        let mut item = full_item("a");
        item.pub_date = Some("sometime last week".to_string());

        let podcast = normalize_at(FEED_URL, "", raw_feed(Some(vec![item])), fixed_now()).unwrap();
        assert_eq!(podcast.episodes[0].release_date, fixed_now());
    }

    #[test]
    fn episode_order_follows_feed() {
        let items = vec![full_item("c"), full_item("a"), full_item("b")];
        let podcast = normalize(FEED_URL, "", raw_feed(Some(items))).unwrap();

        let guids: Vec<_> = podcast.episodes.iter().map(|e| e.guid.as_str()).collect();
        assert_eq!(guids, vec!["c", "a", "b"]);
    }

    #[test]
    fn last_updated_is_parsed() {
        let podcast = normalize_at(FEED_URL, "", raw_feed(Some(vec![])), fixed_now()).unwrap();
        assert_eq!(
            podcast.last_updated,
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn parse_release_date_accepts_named_zones() {
        let date = parse_release_date("Mon, 02 Jan 2006 15:04:05 EST").unwrap();
        assert_eq!(
            date.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2006, 1, 2, 20, 4, 5).unwrap()
        );
    }

    #[test]
    fn parse_release_date_accepts_iso_format() {
        assert!(parse_release_date("2024-01-15T10:00:00+02:00").is_ok());
    }

    #[test]
    fn parse_release_date_rejects_garbage() {
        let result = parse_release_date("not a date");
        assert!(matches!(result, Err(FeedError::InvalidDate { .. })));
    }
}
