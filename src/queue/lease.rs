//! Uniqueness leases.
//!
//! A lease is a time-bounded exclusive claim on a key. Acquisition is the
//! single atomic decision point for "has this logical transaction already
//! been dispatched"; the job queue's own delivery semantics play no part.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::bridge::types::BridgeResult;

/// Atomic set-if-absent-with-TTL store.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Claim `key` for `owner` unless a live lease exists.
    async fn acquire(&self, key: &str, owner: &str, ttl: Duration) -> BridgeResult<bool>;

    /// Drop the lease if `owner` still holds it. Returns whether it did.
    async fn release(&self, key: &str, owner: &str) -> BridgeResult<bool>;
}

#[derive(Debug, Clone)]
struct Lease {
    owner: String,
    expires_at: Instant,
}

impl Lease {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Process-local lease store.
///
/// Single-process only: workers sharing this store must live in the same
/// process. Expired leases are replaced on the next acquisition.
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaseStore {
    leases: Arc<DashMap<String, Lease>>,
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a live lease exists for `key`.
    pub fn is_held(&self, key: &str) -> bool {
        self.leases.get(key).map(|l| !l.is_expired()).unwrap_or(false)
    }

    /// Drop expired leases. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.leases.len();
        self.leases.retain(|_, lease| !lease.is_expired());
        before - self.leases.len()
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn acquire(&self, key: &str, owner: &str, ttl: Duration) -> BridgeResult<bool> {
        let lease = Lease {
            owner: owner.to_string(),
            expires_at: Instant::now() + ttl,
        };

        // The entry guard holds the shard lock, so check-and-set is atomic
        match self.leases.entry(key.to_string()) {
            Entry::Occupied(mut existing) => {
                if !existing.get().is_expired() {
                    return Ok(false);
                }
                tracing::debug!(key, previous_owner = %existing.get().owner, "Replacing expired lease");
                existing.insert(lease);
                Ok(true)
            }
            Entry::Vacant(slot) => {
                slot.insert(lease);
                Ok(true)
            }
        }
    }

    async fn release(&self, key: &str, owner: &str) -> BridgeResult<bool> {
        Ok(self.leases.remove_if(key, |_, lease| lease.owner == owner).is_some())
    }
}
