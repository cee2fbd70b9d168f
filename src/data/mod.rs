//! Core data models for the news fetcher
//!
//! This module contains the record types exchanged with the upstream news API
//! and the fetch outcome handed back to callers, plus the HTTP transport,
//! backoff helpers, and the resilient fetcher built on top of them.

pub mod backoff;
pub mod fetcher;
pub mod transport;

pub use backoff::{backoff_delay, rate_limit_delay, Pause, TokioPause};
pub use fetcher::NewsFetcher;
pub use transport::{HttpTransport, NewsTransport, TransportError, UpstreamResponse};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// A single news record as returned by the upstream API
///
/// Records are kept opaque: the fetcher never enforces a schema beyond
/// "is a JSON object", so unknown fields survive a cache round trip untouched.
pub type NewsItem = Map<String, Value>;

/// The most recent successful payload read back from the cache file
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSnapshot {
    /// The `results` list of the cached payload
    pub results: Vec<NewsItem>,
    /// When the cache file was last written, if the filesystem reports it
    pub written_at: Option<DateTime<Utc>>,
}

/// Where the items of a fetch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum NewsOrigin {
    /// Fresh response from the upstream API using the token at `token_index`
    Live { token_index: usize },
    /// Every token failed (or none were configured) and a cache snapshot was used
    Cache,
    /// Nothing could be fetched and there was no usable cache
    Empty,
}

/// Result of a fetch, including where the items came from
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    /// The news items, in upstream order
    pub items: Vec<NewsItem>,
    /// Source of `items`
    pub origin: NewsOrigin,
}

impl FetchOutcome {
    /// An outcome with no items and no usable source
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            origin: NewsOrigin::Empty,
        }
    }
}

/// Extracts the `results` list from an API payload.
///
/// Returns `None` unless the payload is an object whose `results` field is an
/// array made up entirely of objects.
pub fn parse_results(payload: &Value) -> Option<Vec<NewsItem>> {
    payload
        .get("results")?
        .as_array()?
        .iter()
        .map(|item| item.as_object().cloned())
        .collect()
}

/// Returns the display title of a news item, if it has a string `title`
pub fn item_title(item: &NewsItem) -> Option<&str> {
    item.get("title").and_then(Value::as_str)
}
