//! Contract read cache.
//!
//! # Data Flow
//! ```text
//! read(address, selector)
//!     → store.rs (hit → return)
//!     → bridge call_contract (read-only) → store.rs put(ttl from policy.rs)
//!
//! TransactionConfirmed
//!     → coordinator.rs
//!         ├─ no selectors declared → forget every indexed key of the address
//!         └─ selectors declared    → forget those → refresh (optional)
//! ```

pub mod coordinator;
pub mod policy;
pub mod store;

pub use coordinator::{CacheCoordinator, RefreshReport};
pub use policy::{TtlPolicy, Volatility};
pub use store::{CacheStore, MemoryCacheStore};
