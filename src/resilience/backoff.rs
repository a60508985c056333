//! Geometric backoff schedules for submission retries.

use std::time::Duration;

/// Delay before retry `attempt` (1-based): `base * multiplier^(attempt - 1)`.
pub fn calculate_backoff(attempt: u32, base_ms: u64, multiplier: f64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let factor = multiplier.powi(attempt as i32 - 1);
    let delay_ms = (base_ms as f64 * factor).round();
    if !delay_ms.is_finite() || delay_ms >= u64::MAX as f64 {
        return Duration::from_millis(u64::MAX);
    }

    Duration::from_millis(delay_ms as u64)
}

/// The gaps between `max_attempts` attempts, i.e. `max_attempts - 1` delays.
///
/// `schedule[i] = base * multiplier^i`.
pub fn backoff_schedule(max_attempts: u32, base_ms: u64, multiplier: f64) -> Vec<Duration> {
    (1..max_attempts)
        .map(|attempt| calculate_backoff(attempt, base_ms, multiplier))
        .collect()
}
