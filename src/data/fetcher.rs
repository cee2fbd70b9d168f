//! Resilient CryptoPanic news fetcher
//!
//! Tries each configured token in order, retrying rate-limited and transient
//! failures with exponential backoff, and falls back to the last cached
//! payload when every token is exhausted. No failure is surfaced to the
//! caller; the worst case is an empty list.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::backoff::{backoff_delay, rate_limit_delay, Pause, TokioPause};
use super::transport::{HttpTransport, NewsTransport, TransportError, UpstreamResponse};
use super::{item_title, parse_results, FetchOutcome, NewsItem, NewsOrigin};
use crate::cache::CacheStore;
use crate::config::NewsConfig;
use crate::error::FetchError;
use crate::logging::mask_token;

/// Number of titles logged at debug level after a successful fetch
const LOGGED_TITLES: usize = 3;

/// Fetches news with per-token retries and cache fallback
#[derive(Debug)]
pub struct NewsFetcher<T = HttpTransport, P = TokioPause> {
    /// Credential tokens, tried in order
    tokens: Vec<String>,
    /// Store for the last successful payload
    cache: CacheStore,
    /// Upstream transport
    transport: T,
    /// Sleeps between attempts
    pause: P,
}

impl NewsFetcher {
    /// Creates a fetcher that talks to the configured endpoint over HTTP
    pub fn from_config(config: &NewsConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(config.base_url.clone(), config.request_timeout)?;
        Ok(Self::with_parts(
            config.tokens.clone(),
            CacheStore::new(config.cache_path.clone()),
            transport,
            TokioPause,
        ))
    }
}

impl<T: NewsTransport, P: Pause> NewsFetcher<T, P> {
    /// Creates a fetcher from its parts
    ///
    /// Used by tests to substitute a scripted transport and a recording pause.
    pub fn with_parts(tokens: Vec<String>, cache: CacheStore, transport: T, pause: P) -> Self {
        Self {
            tokens,
            cache,
            transport,
            pause,
        }
    }

    /// Returns the cache store backing this fetcher
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Fetches the latest news, degrading to cached or empty results
    ///
    /// # Arguments
    /// * `max_retries_per_token` - Attempts per token before moving to the next (0 is treated as 1)
    /// * `initial_pause` - Base delay for exponential backoff
    /// * `limit` - Requested page size
    ///
    /// # Returns
    /// The upstream `results` list on success, otherwise the cached list,
    /// otherwise an empty list.
    pub async fn fetch_news(
        &self,
        max_retries_per_token: u32,
        initial_pause: Duration,
        limit: u32,
    ) -> Vec<NewsItem> {
        self.fetch_news_detailed(max_retries_per_token, initial_pause, limit)
            .await
            .items
    }

    /// Same as [`fetch_news`](Self::fetch_news), also reporting where the items came from
    pub async fn fetch_news_detailed(
        &self,
        max_retries_per_token: u32,
        initial_pause: Duration,
        limit: u32,
    ) -> FetchOutcome {
        if self.tokens.is_empty() {
            error!(error = %FetchError::NoCredentialsConfigured, "Skipping news fetch, using cache");
            return self.cached_outcome();
        }

        let attempts = max_retries_per_token.max(1);

        for (token_index, token) in self.tokens.iter().enumerate() {
            match self
                .fetch_with_token(token, attempts, initial_pause, limit)
                .await
            {
                Ok(items) => {
                    info!(
                        token = %mask_token(token),
                        count = items.len(),
                        "Fetched news"
                    );
                    for title in items.iter().take(LOGGED_TITLES).filter_map(item_title) {
                        debug!(title, "News item");
                    }
                    return FetchOutcome {
                        items,
                        origin: NewsOrigin::Live { token_index },
                    };
                }
                Err(err) => {
                    warn!(
                        token = %mask_token(token),
                        error = %err,
                        "Giving up on token"
                    );
                }
            }
        }

        warn!(tokens = self.tokens.len(), "All tokens exhausted, falling back to cache");
        self.cached_outcome()
    }

    /// Reads the cache snapshot, treating any cache problem as "no cache"
    pub fn cached_outcome(&self) -> FetchOutcome {
        match self.cache.read_snapshot() {
            Ok(Some(snapshot)) => {
                info!(
                    path = %self.cache.path().display(),
                    count = snapshot.results.len(),
                    written_at = ?snapshot.written_at,
                    "Using cached news"
                );
                FetchOutcome {
                    items: snapshot.results,
                    origin: NewsOrigin::Cache,
                }
            }
            Ok(None) => {
                debug!(path = %self.cache.path().display(), "No news cache yet");
                FetchOutcome::empty()
            }
            Err(err) => {
                let err = FetchError::from(err);
                warn!(
                    path = %self.cache.path().display(),
                    error = %err,
                    "Ignoring unusable news cache"
                );
                FetchOutcome::empty()
            }
        }
    }

    /// Runs the attempt loop for one token
    ///
    /// Returns the items on success, or the error that made the fetcher give
    /// up on this token.
    async fn fetch_with_token(
        &self,
        token: &str,
        attempts: u32,
        initial_pause: Duration,
        limit: u32,
    ) -> Result<Vec<NewsItem>, FetchError> {
        let mut attempt = 0;

        loop {
            let err = match self.attempt(token, limit).await {
                Ok(items) => return Ok(items),
                Err(err) => err,
            };

            if err.abandons_token() {
                return Err(err);
            }

            // Attempts are 0-based. A 429 is always waited out, even on the
            // last attempt; other failures skip the sleep after the last one.
            let exhausted = attempt + 1 >= attempts;
            if exhausted && !matches!(err, FetchError::RateLimited { .. }) {
                return Err(err);
            }

            let delay = match &err {
                FetchError::RateLimited { retry_after } => {
                    rate_limit_delay(initial_pause, attempt, *retry_after)
                }
                _ => backoff_delay(initial_pause, attempt),
            };

            if exhausted {
                warn!(
                    token = %mask_token(token),
                    attempts,
                    delay_secs = delay.as_secs_f64(),
                    error = %err,
                    "Rate limited on last attempt, waiting before next token"
                );
                self.pause.pause(delay).await;
                return Err(err);
            }

            warn!(
                token = %mask_token(token),
                attempt = attempt + 1,
                attempts,
                delay_secs = delay.as_secs_f64(),
                error = %err,
                "Retrying news fetch"
            );

            self.pause.pause(delay).await;
            attempt += 1;
        }
    }

    /// Performs a single request and persists the payload on success
    async fn attempt(&self, token: &str, limit: u32) -> Result<Vec<NewsItem>, FetchError> {
        let response = self.transport.get_posts(token, limit).await?;
        let (payload, items) = classify(response)?;

        if let Err(err) = self.cache.write_payload(&payload) {
            warn!(
                path = %self.cache.path().display(),
                error = %err,
                "Failed to update news cache"
            );
        }

        Ok(items)
    }
}

/// Maps an upstream response to its payload and items, or a failure class
fn classify(response: UpstreamResponse) -> Result<(Value, Vec<NewsItem>), FetchError> {
    match response.status {
        200 => {
            let payload: Value = serde_json::from_str(&response.body)
                .map_err(|e| FetchError::MalformedResponse(format!("invalid JSON body: {e}")))?;
            let items = parse_results(&payload).ok_or_else(|| {
                FetchError::MalformedResponse("missing or invalid `results` list".to_string())
            })?;
            Ok((payload, items))
        }
        400 | 401 | 403 => Err(FetchError::AuthRejected {
            status: response.status,
        }),
        429 => Err(FetchError::RateLimited {
            retry_after: response.retry_after,
        }),
        status => Err(FetchError::Transient(format!("unexpected HTTP status {status}"))),
    }
}
