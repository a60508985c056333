//! Submission job state.

use std::time::Duration;
use uuid::Uuid;

use crate::contract::ContractCall;

/// Where a job is in its lifecycle.
///
/// ```text
/// Pending → Submitting → Confirmed
///               ↓
///           Retrying → Submitting → … → Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Submitting,
    Retrying,
    Confirmed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Confirmed | JobState::Failed)
    }
}

/// One logical state-changing call travelling through the queue.
#[derive(Debug, Clone)]
pub struct SubmissionJob {
    /// Unique per dispatch; also the lease owner token.
    pub id: Uuid,
    pub call: ContractCall,
    pub uniqueness_key: String,
    /// Attempts performed so far.
    pub attempts: u32,
    pub max_attempts: u32,
    /// `backoff_schedule[n - 1]` is the wait after failed attempt `n`.
    pub backoff_schedule: Vec<Duration>,
    pub state: JobState,
    /// Selectors to invalidate on confirmation; `None` means the whole address.
    pub invalidates: Option<Vec<String>>,
}

impl SubmissionJob {
    pub fn new(call: ContractCall, max_attempts: u32, backoff_schedule: Vec<Duration>) -> Self {
        let uniqueness_key = call.uniqueness_key();
        Self {
            id: Uuid::new_v4(),
            call,
            uniqueness_key,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            backoff_schedule,
            state: JobState::Pending,
            invalidates: None,
        }
    }

    pub fn with_invalidation(mut self, selectors: Vec<String>) -> Self {
        self.invalidates = Some(selectors);
        self
    }

    /// Key under which the uniqueness lease is held.
    pub fn lease_key(&self) -> String {
        format!("submission:{}", self.uniqueness_key)
    }

    pub fn has_attempts_left(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Wait before the next attempt, given `attempts` already made.
    pub fn next_delay(&self) -> Duration {
        self.attempts
            .checked_sub(1)
            .and_then(|i| self.backoff_schedule.get(i as usize))
            .copied()
            .or_else(|| self.backoff_schedule.last().copied())
            .unwrap_or_default()
    }
}
