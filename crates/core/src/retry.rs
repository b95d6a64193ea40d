//! Exponential retry backoff.

use std::time::Duration;

/// Default delay before the first retry.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Default multiplier applied per prior retry.
pub const DEFAULT_BACKOFF_BASE: u32 = 2;

/// Backoff schedule: `base_delay * backoff_base ^ retry_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub backoff_base: u32,
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, backoff_base: u32) -> Self {
        Self {
            base_delay,
            backoff_base,
        }
    }

    /// Delay before re-running a job that has already been retried
    /// `retry_count` times. Saturates instead of overflowing.
    pub fn delay_for(&self, retry_count: i32) -> Duration {
        let exponent = u32::try_from(retry_count.max(0)).unwrap_or(0);
        let factor = self.backoff_base.saturating_pow(exponent);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAY, DEFAULT_BACKOFF_BASE)
    }
}
