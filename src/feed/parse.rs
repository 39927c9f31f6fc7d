// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::FeedError;

/// Feed data as delivered by a fetcher, before normalization.
///
/// Every field mirrors what the document actually contained, so absence is
/// preserved. `episodes` is `None` when the source had no episode list at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeed {
    pub title: String,
    pub description: String,
    pub summary: String,
    pub last_updated: Option<String>,
    pub episodes: Option<Vec<RawEpisode>>,
}

/// A single feed item as delivered by a fetcher
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEpisode {
    pub guid: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub media_type: Option<String>,
    pub pub_date: Option<String>,
    pub duration: Option<String>,
}

/// Parse RSS feed XML bytes into a RawFeed
pub fn parse_raw_feed(xml_bytes: &[u8]) -> Result<RawFeed, FeedError> {
    let channel = rss::Channel::read_from(xml_bytes)?;

    let episodes = channel.items().iter().map(parse_item).collect();

    let summary = channel
        .itunes_ext()
        .and_then(|ext| ext.summary())
        .unwrap_or_default()
        .to_string();

    let last_updated = channel
        .last_build_date()
        .or_else(|| channel.pub_date())
        .map(String::from);

    Ok(RawFeed {
        title: channel.title().to_string(),
        description: channel.description().to_string(),
        summary,
        last_updated,
        episodes: Some(episodes),
    })
}

fn parse_item(item: &rss::Item) -> RawEpisode {
    let enclosure = item.enclosure();
    let itunes = item.itunes_ext();

    RawEpisode {
        guid: item.guid().map(|g| g.value().to_string()),
        title: item.title().map(String::from),
        description: item
            .description()
            .or_else(|| itunes.and_then(|ext| ext.summary()))
            .map(String::from),
        url: enclosure.map(|e| e.url().to_string()),
        media_type: enclosure
            .map(|e| e.mime_type().to_string())
            .filter(|s| !s.is_empty()),
        pub_date: item.pub_date().map(String::from),
        duration: itunes.and_then(|ext| ext.duration().map(String::from)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
  <channel>
    <title>Test Podcast</title>
    <description></description>
    <link>https://example.com</link>
    <lastBuildDate>Tue, 02 Jan 2024 08:00:00 GMT</lastBuildDate>
    <itunes:summary>Summary from iTunes</itunes:summary>
    <item>
      <title>Episode 1</title>
      <description>First episode</description>
      <pubDate>Mon, 01 Jan 2024 12:00:00 +0000</pubDate>
      <guid>ep1-guid</guid>
      <enclosure url="https://example.com/ep1.mp3" length="1234567" type="audio/mpeg"/>
      <itunes:duration>30:00</itunes:duration>
    </item>
    <item>
      <title>Episode 2</title>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parse_extracts_channel_fields() {
        let raw = parse_raw_feed(SAMPLE_FEED.as_bytes()).unwrap();

        assert_eq!(raw.title, "Test Podcast");
        assert_eq!(raw.description, "");
        assert_eq!(raw.summary, "Summary from iTunes");
        assert_eq!(
            raw.last_updated.as_deref(),
            Some("Tue, 02 Jan 2024 08:00:00 GMT")
        );
    }

    #[test]
    fn parse_extracts_items() {
        let raw = parse_raw_feed(SAMPLE_FEED.as_bytes()).unwrap();
        let episodes = raw.episodes.unwrap();

        assert_eq!(episodes.len(), 2);

        let ep1 = &episodes[0];
        assert_eq!(ep1.guid.as_deref(), Some("ep1-guid"));
        assert_eq!(ep1.title.as_deref(), Some("Episode 1"));
        assert_eq!(ep1.url.as_deref(), Some("https://example.com/ep1.mp3"));
        assert_eq!(ep1.media_type.as_deref(), Some("audio/mpeg"));
        assert_eq!(ep1.duration.as_deref(), Some("30:00"));
    }

    #[test]
    fn parse_keeps_missing_item_fields_absent() {
        let raw = parse_raw_feed(SAMPLE_FEED.as_bytes()).unwrap();
        let ep2 = &raw.episodes.unwrap()[1];

        assert!(ep2.guid.is_none());
        assert!(ep2.url.is_none());
        assert!(ep2.pub_date.is_none());
        assert!(ep2.duration.is_none());
    }

    #[test]
    fn channel_without_items_has_empty_list() {
        let feed = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Empty</title>
    <description>Nothing yet</description>
  </channel>
</rss>"#;

        let raw = parse_raw_feed(feed.as_bytes()).unwrap();
        assert_eq!(raw.episodes, Some(vec![]));
    }

    #[test]
    fn non_rss_document_fails() {
        let result = parse_raw_feed(b"<html><body>not a feed</body></html>");
        assert!(matches!(result, Err(FeedError::ParseFailed(_))));
    }
}
