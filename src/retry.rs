use std::time::Duration;

use reqwest::StatusCode;

/// Bounded retry policy applied by [`ResilientClient`](crate::ResilientClient).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Total number of calls allowed, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for every later one.
    pub base_delay: Duration,
    /// Status codes that are retried after a backoff delay.
    pub retryable_statuses: Vec<u16>,
    /// Sleep the backoff delay after transport failures too.
    pub backoff_on_transport_error: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1_000),
            retryable_statuses: vec![StatusCode::TOO_MANY_REQUESTS.as_u16()],
            backoff_on_transport_error: true,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the attempt with the given 0-indexed ordinal.
    ///
    /// `2^attempt * base_delay`, saturating at [`Duration::MAX`].
    pub fn delay(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .map_or(Duration::MAX, |multiplier| self.base_delay.saturating_mul(multiplier))
    }

    pub fn is_retryable(&self, status: StatusCode) -> bool {
        self.retryable_statuses.contains(&status.as_u16())
    }

    /// Whether another attempt may follow the one with this ordinal.
    pub fn has_attempts_after(&self, attempt: u32) -> bool {
        attempt.saturating_add(1) < self.max_attempts
    }
}
