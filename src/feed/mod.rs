mod fetch;
mod normalize;
mod parse;

pub use fetch::{FeedFetcher, RssFetcher, fetch_feed_bytes};
pub use normalize::{normalize, normalize_at, parse_release_date};
pub use parse::{RawEpisode, RawFeed, parse_raw_feed};
