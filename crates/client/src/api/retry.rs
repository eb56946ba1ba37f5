//! Retry policy for idempotent catalog reads.

use std::time::Duration;

use super::ApiError;

/// Retry configuration: how many extra attempts and how long to wait between them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
    /// Upper bound for the delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Policy with `max_retries` retries and the default backoff.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }

    /// Policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0)
    }

    /// Set the backoff delays.
    #[must_use]
    pub const fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_delay = base;
        self.max_delay = max;
        self
    }

    /// Delay before retry number `attempt` (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt);
        self.base_delay
            .saturating_mul(multiplier)
            .min(self.max_delay)
    }

    /// Whether a failed attempt should be retried.
    ///
    /// Only transport failures and 5xx responses are retried; a 4xx answer
    /// will not change on a second try.
    #[must_use]
    pub fn should_retry(&self, error: &ApiError, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        match error {
            ApiError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ApiError::Status { status, .. } => (500..600).contains(status),
            ApiError::Decode { .. } | ApiError::Storage(_) => false,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ApiError {
        ApiError::Status {
            status: code,
            message: None,
        }
    }

    #[test]
    fn test_retries_server_errors_until_budget_is_spent() {
        let policy = RetryPolicy::new(2);
        assert!(policy.should_retry(&status(503), 0));
        assert!(policy.should_retry(&status(500), 1));
        assert!(!policy.should_retry(&status(500), 2));
    }

    #[test]
    fn test_client_errors_are_not_retried() {
        let policy = RetryPolicy::new(2);
        assert!(!policy.should_retry(&status(404), 0));
        assert!(!policy.should_retry(&status(401), 0));
    }

    #[test]
    fn test_none_never_retries() {
        assert!(!RetryPolicy::none().should_retry(&status(502), 0));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(5)
            .with_backoff(Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(350));
    }
}
