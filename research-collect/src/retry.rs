//! Exponential back-off for the scrape transport
//!
//! [`retry_with_backoff`] repeats an operation while it fails with a
//! retriable [`CollectError`] (429/5xx from [`RETRYABLE_STATUSES`],
//! connect failures, timeouts).
//!
//! Wall-clock ceiling: retries are clamped to [`MAX_RETRIES_CEILING`] and
//! each sleep to [`MAX_DELAY`], so a call waits at most
//! `(retries + 1) * request_timeout + retries * 30 s`.
//!
//! [`RETRYABLE_STATUSES`]: crate::RETRYABLE_STATUSES

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::CollectError;

/// Hard cap on configured retries
pub const MAX_RETRIES_CEILING: u32 = 5;

/// Hard cap on a single back-off sleep
pub const MAX_DELAY: Duration = Duration::from_secs(30);

/// Sleep before retry number `attempt` (1-based): `base * 2^(attempt-1)`, capped
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(10);
    base.saturating_mul(factor).min(MAX_DELAY)
}

/// Jittered back-off, never shorter than a provider-requested delay
fn retry_delay(base: Duration, attempt: u32, retry_after: Option<Duration>, jitter: f64) -> Duration {
    let delay = backoff_delay(base, attempt).mul_f64(jitter);
    match retry_after {
        Some(requested) => delay.max(requested.min(MAX_DELAY)),
        None => delay,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Each sleep is jittered by ±25 % and honors `Retry-After` up to [`MAX_DELAY`].
/// Non-retriable errors are returned at once.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    mut operation: F,
) -> Result<T, CollectError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CollectError>>,
{
    let max_retries = max_retries.min(MAX_RETRIES_CEILING);
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retriable() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;

                let jitter = rand::random::<f64>() * 0.5 + 0.75;
                let delay = retry_delay(base_delay, attempt, err.retry_after(), jitter);
                warn!(
                    attempt,
                    max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient scrape error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
