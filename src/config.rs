//! Configuration for the news fetcher
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file) and are collected into an explicit [`NewsConfig`] that is handed to
//! the fetcher. Nothing is read from the environment at fetch time.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Default CryptoPanic posts endpoint
pub const DEFAULT_BASE_URL: &str = "https://cryptopanic.com/api/v1/posts/";

/// Default location of the cache file, relative to the working directory
pub const DEFAULT_CACHE_PATH: &str = "cache/cryptopanic_news.json";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_INITIAL_PAUSE_SECS: f64 = 2.0;
const DEFAULT_LIMIT: u32 = 20;

/// Errors that can occur when reading configuration values
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric setting could not be parsed or is out of range
    #[error("Invalid value for {key}: '{value}' is not a valid positive number")]
    InvalidNumber { key: &'static str, value: String },

    /// The base URL does not use http or https
    #[error("Invalid value for {key}: '{value}' must start with http:// or https://")]
    InvalidUrl { key: &'static str, value: String },
}

/// Settings for one news fetcher
#[derive(Debug, Clone, PartialEq)]
pub struct NewsConfig {
    /// Credential tokens, tried in order
    pub tokens: Vec<String>,
    /// Posts endpoint
    pub base_url: String,
    /// Cache file location
    pub cache_path: PathBuf,
    /// Per-request network timeout
    pub request_timeout: Duration,
    /// Attempts per token before moving on
    pub max_retries_per_token: u32,
    /// Base delay for exponential backoff
    pub initial_pause: Duration,
    /// Requested page size
    pub limit: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            tokens: Vec::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_retries_per_token: DEFAULT_MAX_RETRIES,
            initial_pause: Duration::from_secs_f64(DEFAULT_INITIAL_PAUSE_SECS),
            limit: DEFAULT_LIMIT,
        }
    }
}

impl NewsConfig {
    /// Builds a config from the process environment
    ///
    /// Call [`load_dotenv`] first if `.env` files should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup
    ///
    /// Unset keys fall back to their defaults; set but invalid keys are errors.
    ///
    /// # Arguments
    /// * `lookup` - Returns the raw value for an environment key, if set
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let tokens = lookup("CRYPTOPANIC_TOKENS")
            .map(|raw| parse_tokens(&raw))
            .unwrap_or_default();

        let base_url = match lookup("CRYPTOPANIC_BASE_URL") {
            Some(raw) => normalize_base_url("CRYPTOPANIC_BASE_URL", &raw)?,
            None => defaults.base_url,
        };

        let cache_path = lookup("NEWS_CACHE_PATH")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_path);

        let request_timeout = match lookup("NEWS_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_seconds("NEWS_REQUEST_TIMEOUT_SECS", &raw)?,
            None => defaults.request_timeout,
        };

        let initial_pause = match lookup("NEWS_INITIAL_PAUSE_SECS") {
            Some(raw) => parse_seconds("NEWS_INITIAL_PAUSE_SECS", &raw)?,
            None => defaults.initial_pause,
        };

        let max_retries_per_token = match lookup("NEWS_MAX_RETRIES") {
            Some(raw) => parse_positive("NEWS_MAX_RETRIES", &raw)?,
            None => defaults.max_retries_per_token,
        };

        let limit = match lookup("NEWS_LIMIT") {
            Some(raw) => parse_positive("NEWS_LIMIT", &raw)?,
            None => defaults.limit,
        };

        Ok(Self {
            tokens,
            base_url,
            cache_path,
            request_timeout,
            max_retries_per_token,
            initial_pause,
            limit,
        })
    }

    /// Replaces the token list
    pub fn with_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the cache file location
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    /// Replaces the posts endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Loads a `.env` file from the working directory or its parents, if present
///
/// Variables already set in the process environment take precedence.
///
/// # Returns
/// * `Ok(Some(path))` with the file that was loaded
/// * `Ok(None)` if no `.env` file exists
/// * `Err` if a file was found but could not be parsed
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Splits a comma-separated token list, trimming entries and dropping blanks
pub fn parse_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

/// Validates a base URL and normalises it to end with exactly one `/`
fn normalize_base_url(key: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ConfigError::InvalidUrl {
            key,
            value: raw.to_string(),
        });
    }
    Ok(format!("{}/", trimmed.trim_end_matches('/')))
}

fn parse_positive<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    raw.trim()
        .parse::<T>()
        .ok()
        .filter(|value| *value > T::default())
        .ok_or_else(|| ConfigError::InvalidNumber {
            key,
            value: raw.to_string(),
        })
}

fn parse_seconds(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: f64 = parse_positive(key, raw)?;
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidNumber {
        key,
        value: raw.to_string(),
    })
}
