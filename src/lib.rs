//! Midnight bridge client library.
//!
//! Talks to a Midnight bridge service over signed HTTP, submits
//! state-changing contract calls through an idempotent retrying queue, and
//! caches contract reads with outcome-driven invalidation.
//!
//! # Architecture Overview
//!
//! ```text
//!   read(address, selector)                      dispatch(call)
//!          │                                           │
//!          ▼                                           ▼
//!   ┌──────────────┐   TransactionConfirmed    ┌────────────────┐
//!   │    cache     │◀──────────────────────────│     queue      │
//!   │ coordinator  │                           │ lease + workers│
//!   └──────┬───────┘                           └───────┬────────┘
//!          │ call_contract                prove/submit │
//!          ▼                                           ▼
//!   ┌──────────────────────────────────────────────────────────┐
//!   │                bridge client (reqwest)                    │
//!   │        signing (HMAC-SHA256) · retries · timeouts         │
//!   └──────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//!                        Midnight bridge
//! ```

// Core subsystems
pub mod bridge;
pub mod contract;
pub mod signing;

// Submission and caching
pub mod cache;
pub mod queue;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use bridge::{BridgeClient, BridgeError, BridgeResult, BridgeTransport};
pub use cache::CacheCoordinator;
pub use config::BridgeSettings;
pub use contract::{Address, ContractCall, TxHash};
pub use lifecycle::{BridgeStack, Shutdown};
pub use queue::{Dispatch, SubmissionOutcome, SubmissionQueue};
pub use signing::RequestSigner;
