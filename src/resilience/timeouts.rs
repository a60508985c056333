//! Timeout enforcement.
//!
//! Every call that leaves the process has a deadline. A job attempt is
//! bounded by the transport timeout times a small multiplier, since one
//! attempt may chain proof generation and submission.

use std::future::Future;
use std::time::Duration;

use crate::bridge::types::{BridgeError, BridgeResult};

/// Run `fut` with a deadline; elapsing becomes a network error.
pub async fn with_deadline<T, F>(deadline: Duration, operation: &str, fut: F) -> BridgeResult<T>
where
    F: Future<Output = BridgeResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(BridgeError::network(format!(
            "{} timed out after {}ms",
            operation,
            deadline.as_millis()
        ))),
    }
}

/// Deadline for one submission attempt.
pub fn job_deadline(transport_timeout: Duration, multiplier: u32) -> Duration {
    transport_timeout.saturating_mul(multiplier.max(1))
}
