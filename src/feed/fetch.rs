// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FeedError;
use crate::http::HttpClient;

use super::parse::{RawFeed, parse_raw_feed};

/// Retrieves a feed by URL and hands back its raw contents.
///
/// Implementations own transport concerns such as timeouts and retries.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, feed_url: &str) -> Result<RawFeed, FeedError>;
}

/// Fetches RSS feeds over HTTP
#[derive(Clone)]
pub struct RssFetcher<C> {
    client: C,
}

impl<C: HttpClient> RssFetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

/// Fetch raw feed bytes from a URL (without parsing)
pub async fn fetch_feed_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes, FeedError> {
    let response = client
        .get(url)
        .await
        .map_err(|e| FeedError::FetchFailed {
            url: url.to_string(),
            source: e,
        })?;

    if !response.is_success() {
        return Err(FeedError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    Ok(response.body)
}

#[async_trait]
impl<C: HttpClient> FeedFetcher for RssFetcher<C> {
    async fn fetch(&self, feed_url: &str) -> Result<RawFeed, FeedError> {
        let bytes = fetch_feed_bytes(&self.client, feed_url).await?;
        parse_raw_feed(&bytes)
    }
}
