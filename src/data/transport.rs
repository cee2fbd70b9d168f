//! HTTP transport for the CryptoPanic posts endpoint
//!
//! The fetcher talks to the upstream API through the [`NewsTransport`] trait so
//! that retry behaviour can be exercised without a network. [`HttpTransport`]
//! is the real implementation on top of `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use thiserror::Error;

/// Errors raised before an HTTP status could be read
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request or the body read exceeded the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The connection could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Any other request failure (client build, body decode, redirect loop)
    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// The parts of an upstream response the fetcher acts on
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    /// HTTP status code
    pub status: u16,
    /// Numeric `Retry-After` hint in seconds, if present
    pub retry_after: Option<f64>,
    /// Raw response body
    pub body: String,
}

/// Performs one GET against the news endpoint for a given credential
#[async_trait]
pub trait NewsTransport: Send + Sync {
    async fn get_posts(&self, token: &str, limit: u32) -> Result<UpstreamResponse, TransportError>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for `base_url` with a per-request timeout
    ///
    /// # Arguments
    /// * `base_url` - Endpoint that receives the `auth_token`/`kind`/`public`/`limit` query
    /// * `timeout` - Applied to each request, including reading the body
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Creates a transport around an existing HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// The endpoint this transport requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl NewsTransport for HttpTransport {
    async fn get_posts(&self, token: &str, limit: u32) -> Result<UpstreamResponse, TransportError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("auth_token", token),
                ("kind", "news"),
                ("public", "true"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_retry_after);
        let body = response.text().await?;

        Ok(UpstreamResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// Parses a `Retry-After` value given in seconds.
///
/// HTTP-date hints and negative numbers yield `None`.
pub fn parse_retry_after(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
}
