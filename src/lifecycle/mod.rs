//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Settings → Signer → Client → Stores → Queue → Cache (subscribed to queue)
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Workers stop receiving → In-flight job finishes → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_shutdown_signal;
pub use startup::BridgeStack;
