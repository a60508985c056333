//! Bridge integration subsystem.
//!
//! # Data Flow
//! ```text
//! Caller (queue job, cache miss, CLI)
//!     → client.rs (verb → URL, body bytes)
//!     → signing (fresh X-Midnight-* headers per attempt)
//!     → reqwest (timeouts) → bridge
//!     → response.rs (snake/camel normalization, required fields)
//!     → types.rs (typed result or BridgeError)
//! ```
//!
//! # Constraints
//! - Signing key never logged
//! - Every request has a timeout
//! - Error category follows the operation, not the cause

pub mod client;
pub mod response;
pub mod transport;
pub mod types;

pub use client::BridgeClient;
pub use transport::BridgeTransport;
pub use types::{BridgeConfig, BridgeError, BridgeResult};
