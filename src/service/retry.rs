//! Retry policy for snapshot loads.
//!
//! Doubling backoff with a hard per-delay ceiling. There is no external
//! cancellation; a load attempt either succeeds, fails retryably, or exhausts
//! its attempts.

use std::time::Duration;

use crate::error::CatalogError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts in total, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    /// Cap for a single delay, not for the sum of delays.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before the given retry (0 = first retry after the initial
    /// failure). Doubles each time, capped at `max_backoff`.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let doubled = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(retry_count));
        doubled.min(self.max_backoff)
    }

    pub fn should_retry(&self, error: &CatalogError, retry_count: u32) -> bool {
        error.retryable() && retry_count + 1 < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
        }
    }
}
