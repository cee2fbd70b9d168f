//! Backoff delays and the pause seam used between retries

use std::time::Duration;

use async_trait::async_trait;

/// Exponential backoff delay: `initial * 2^attempt` (attempt is 0-based).
///
/// Saturates instead of overflowing for absurd attempt counts.
pub fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    initial.saturating_mul(factor)
}

/// Delay after a rate-limited (HTTP 429) response.
///
/// Uses the exponential backoff delay, raised to `retry_after + 1` seconds when
/// the server sent a usable numeric hint. Hints too large for a `Duration`
/// saturate to `Duration::MAX`.
pub fn rate_limit_delay(initial: Duration, attempt: u32, retry_after: Option<f64>) -> Duration {
    let computed = backoff_delay(initial, attempt);

    let hinted = retry_after
        .filter(|hint| hint.is_finite() && *hint >= 0.0)
        .map(|hint| Duration::try_from_secs_f64(hint + 1.0).unwrap_or(Duration::MAX));

    match hinted {
        Some(hinted) => computed.max(hinted),
        None => computed,
    }
}

/// Suspends the fetch between attempts
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Real pause backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
