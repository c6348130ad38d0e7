use std::time::Duration;

use super::error::{ApiError, ErrorKind};

/// Decision returned by a backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Policy deciding whether a failed attempt should be retried and how long
/// to wait first.
///
/// Implementations must be total: after a bounded number of attempts the
/// decision is always `NoRetry`, so no operation retries indefinitely.
pub trait BackoffPolicy: Send + Sync {
    /// `attempt` is 1-based (1 = the first attempt just failed).
    fn decide(&self, attempt: u32, error: &ApiError) -> RetryDecision;
}

/// Exponential backoff with caps.
///
/// Rate-limited failures carry a server wait hint, which is applied as a
/// floor on the computed delay.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on the computed exponential delay.
    pub max_delay: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn decide(&self, attempt: u32, error: &ApiError) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }

        match error.kind {
            ErrorKind::Client | ErrorKind::RequestConstruction => RetryDecision::NoRetry,
            ErrorKind::RateLimited | ErrorKind::Server | ErrorKind::NoResponse => {
                // base * 2^(attempt-1), capped, with the 429 hint as a floor.
                let exp = 1u32 << attempt.saturating_sub(1).min(16);
                let mut delay = self.base_delay.saturating_mul(exp).min(self.max_delay);
                if let Some(secs) = error.retry_after_secs {
                    delay = delay.max(Duration::from_secs(secs));
                }
                RetryDecision::RetryAfter(delay)
            }
        }
    }
}
