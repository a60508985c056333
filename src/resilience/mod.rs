//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Bridge request:
//!     → retries.rs (retryable? linear delay, small budget)
//!
//! Submission job:
//!     → timeouts.rs (deadline per attempt)
//!     → On failure: backoff.rs (geometric schedule between attempts)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Two separately bounded retry layers: transport and job
//! - No jitter: schedules are reproducible

pub mod backoff;
pub mod retries;
pub mod timeouts;
