//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - Structured fields, never interpolated secrets
//! - Job ID and uniqueness key flow through submission logs
//! - Metrics are cheap (no-op without a recorder)

pub mod logging;
pub mod metrics;
