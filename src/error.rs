//! Failure classes of a news fetch
//!
//! None of these escape `NewsFetcher::fetch_news`; they classify each attempt
//! so the fetcher can decide between retrying, rotating to the next token, or
//! falling back to the cache, and they are what ends up in the logs.

use thiserror::Error;

use crate::cache::CacheError;
use crate::data::TransportError;

/// Why an attempt (or the whole fetch) did not produce live news
#[derive(Debug, Error)]
pub enum FetchError {
    /// No credential tokens are configured
    #[error("No CryptoPanic tokens configured")]
    NoCredentialsConfigured,

    /// The upstream rejected the credential or the request (400, 401, 403)
    #[error("Token rejected with HTTP {status}")]
    AuthRejected { status: u16 },

    /// HTTP 429, possibly with a numeric retry hint in seconds
    #[error("Rate limited (retry after: {retry_after:?}s)")]
    RateLimited { retry_after: Option<f64> },

    /// Timeouts, connection failures, and unexpected statuses
    #[error("Transient failure: {0}")]
    Transient(String),

    /// HTTP 200 whose body is not a payload with a `results` list
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The cache file exists but could not be read
    #[error("Cache unreadable: {0}")]
    CacheUnreadable(String),

    /// The cache file was read but does not hold a valid payload
    #[error("Cache malformed: {0}")]
    CacheMalformed(String),
}

impl FetchError {
    /// Whether the same token must not be tried again
    pub fn abandons_token(&self) -> bool {
        matches!(
            self,
            FetchError::AuthRejected { .. } | FetchError::MalformedResponse(_)
        )
    }
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        FetchError::Transient(err.to_string())
    }
}

impl From<CacheError> for FetchError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Io(e) => FetchError::CacheUnreadable(e.to_string()),
            CacheError::Json(e) => FetchError::CacheMalformed(e.to_string()),
            CacheError::MissingResults => {
                FetchError::CacheMalformed("missing or invalid `results` list".to_string())
            }
        }
    }
}
