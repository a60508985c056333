//! Request authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing request (method, path?query, body)
//!     → signer.rs (canonical string → HMAC-SHA256)
//!     → X-Midnight-Timestamp / X-Midnight-Signature headers
//!
//! Incoming request (bridge side, tests)
//!     → signer.rs verify (skew window → recompute → constant-time compare)
//! ```
//!
//! # Security Constraints
//! - Signing key ONLY from config or environment variable
//! - Never log the signing key
//! - No I/O in this module

pub mod signer;

pub use signer::{RequestSigner, SignableRequest, SignedEnvelope, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Environment variable that overrides the configured signing key.
pub const SIGNING_KEY_ENV_VAR: &str = "MIDNIGHT_BRIDGE_SIGNING_KEY";
