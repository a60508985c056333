//! Key/value cache storage with per-entry TTL.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cache backend used by the coordinator.
///
/// Stores have no notion of tags or addresses; grouping lives in the
/// coordinator's index.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Live value for `key`, if any.
    async fn get(&self, key: &str) -> Option<Value>;

    async fn put(&self, key: &str, value: Value, ttl: Duration);

    /// Remove `key`. Returns whether a live entry was removed.
    async fn forget(&self, key: &str) -> bool;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process cache on a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    inner: Arc<DashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, entry| !entry.is_expired());
        before - self.inner.len()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Option<Value> {
        let entry = self.inner.get(key)?;
        if !entry.is_expired() {
            return Some(entry.value.clone());
        }
        drop(entry);
        self.inner.remove_if(key, |_, e| e.is_expired());
        None
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration) {
        self.inner.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    async fn forget(&self, key: &str) -> bool {
        self.inner
            .remove(key)
            .map(|(_, entry)| !entry.is_expired())
            .unwrap_or(false)
    }
}
