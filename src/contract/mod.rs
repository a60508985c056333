//! Contract call domain types.
//!
//! A `ContractCall` is the unit everything else moves around: read-only
//! calls go straight through the cache and transport, writes go through the
//! submission queue keyed by `ContractCall::uniqueness_key`.

pub mod call;
pub mod types;

pub use call::{Args, ContractCall};
pub use types::{Address, TxHash};
