//! Retry logic for bridge requests.
//!
//! # Responsibilities
//! - Decide whether a transport outcome is worth another attempt
//! - Compute the (linear) delay before the next attempt
//!
//! # Design Decisions
//! - Connection errors and timeouts always retryable
//! - 5xx retryable; 4xx terminal
//! - 401 is retryable: every attempt is re-signed with a fresh timestamp,
//!   so a skew rejection can clear on the next try
//! - Small fixed budget; the submission queue retries on top of this

use std::time::Duration;

use crate::config::BridgeConfig;

/// HTTP status the bridge uses for signature rejection.
pub const SIGNATURE_REJECTED: u16 = 401;

/// What happened on one transport attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The request never produced a response (connect, reset, timeout).
    ConnectionFailed,
    /// The bridge answered with this status.
    Status(u16),
}

/// Bounded retry policy for a single bridge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay; retry `n` waits `n * delay`.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.max_retries, Duration::from_millis(config.retry_delay_ms))
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Whether `attempt` (1-based, already performed) may be followed by another.
    pub fn should_retry(&self, attempt: u32, outcome: AttemptOutcome) -> bool {
        attempt <= self.max_retries && is_retryable(outcome)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.delay.saturating_mul(retry)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(200))
    }
}

/// Transient outcomes worth retrying.
pub fn is_retryable(outcome: AttemptOutcome) -> bool {
    match outcome {
        AttemptOutcome::ConnectionFailed => true,
        AttemptOutcome::Status(status) => status >= 500 || status == SIGNATURE_REJECTED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_outcomes() {
        assert!(is_retryable(AttemptOutcome::ConnectionFailed));
        assert!(is_retryable(AttemptOutcome::Status(500)));
        assert!(is_retryable(AttemptOutcome::Status(503)));
        assert!(is_retryable(AttemptOutcome::Status(401)));
        assert!(!is_retryable(AttemptOutcome::Status(400)));
        assert!(!is_retryable(AttemptOutcome::Status(404)));
        assert!(!is_retryable(AttemptOutcome::Status(422)));
    }

    #[test]
    fn test_budget() {
        let policy = RetryPolicy::new(2, Duration::from_millis(100));
        assert!(policy.should_retry(1, AttemptOutcome::ConnectionFailed));
        assert!(policy.should_retry(2, AttemptOutcome::Status(502)));
        assert!(!policy.should_retry(3, AttemptOutcome::Status(502)));
        assert!(!policy.should_retry(1, AttemptOutcome::Status(404)));
        assert!(!RetryPolicy::none().should_retry(1, AttemptOutcome::ConnectionFailed));
    }

    #[test]
    fn test_linear_delay() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(300));
    }
}
