//! Submission subsystem.
//!
//! # Data Flow
//! ```text
//! dispatch(call)
//!     → job.rs (uniqueness key, backoff schedule)
//!     → lease.rs (acquire; held → dropped as duplicate)
//!     → channel.rs (enqueue)
//!
//! worker (× N)
//!     → channel.rs (receive)
//!     → submission.rs (prove? → submit, bounded by deadline)
//!         ├─ ok        → events.rs Confirmed → release lease → ack
//!         ├─ err, left → channel.rs nack(backoff[attempts-1])
//!         └─ err, none → events.rs Failed → release lease → ack
//! ```
//!
//! # Design Decisions
//! - The lease, not queue delivery, decides whether a call already ran
//! - Duplicates are dropped, not queued behind the live job
//! - No mid-flight cancellation; shutdown only stops new work

pub mod channel;
pub mod events;
pub mod job;
pub mod lease;
pub mod submission;

pub use channel::{JobQueue, MemoryJobQueue};
pub use events::{OutcomeBus, OutcomeListener, SubmissionOutcome, TransactionConfirmed, TransactionFailed};
pub use job::{JobState, SubmissionJob};
pub use lease::{LeaseStore, MemoryLeaseStore};
pub use submission::{Dispatch, SubmissionQueue};
