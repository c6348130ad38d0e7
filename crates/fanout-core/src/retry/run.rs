//! Retry loop: run an operation until success or the policy says stop.

use std::future::Future;

use super::error::ApiError;
use super::policy::{BackoffPolicy, RetryDecision};

/// Runs `f` until it succeeds or the backoff policy says to stop.
/// On retryable failure, sleeps for the policy's delay then tries again.
///
/// Retry is scoped to this one operation; a caller holding a concurrency
/// slot keeps it through the sleeps.
pub async fn run_with_retry<T, F, Fut>(policy: &dyn BackoffPolicy, mut f: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 1u32;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) => match policy.decide(attempt, &e) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(delay) => {
                    tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying: {}", e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            },
        }
    }
}
