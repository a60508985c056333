//! Read-through cache over contract reads, kept fresh by submission outcomes.
//!
//! # Responsibilities
//! - Serve `read(address, selector)` from the store, falling back to the bridge
//! - Pick each entry's TTL from the selector's volatility
//! - Invalidate a whole address, or only declared selectors, on confirmation
//! - Optionally re-read selectors right after selective invalidation
//!
//! Each address carries a generation counter bumped on every invalidation.
//! A read that started before an invalidation never writes its (possibly
//! stale) value back.

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::future::join_all;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use crate::bridge::transport::BridgeTransport;
use crate::bridge::types::{BridgeError, BridgeResult};
use crate::cache::policy::TtlPolicy;
use crate::cache::store::CacheStore;
use crate::config::CacheConfig;
use crate::contract::{Address, ContractCall};
use crate::observability::metrics;
use crate::queue::events::{OutcomeListener, SubmissionOutcome};

/// Result of a proactive refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub refreshed: Vec<String>,
    pub failed: Vec<(String, BridgeError)>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct CacheCoordinator {
    transport: Arc<dyn BridgeTransport>,
    store: Arc<dyn CacheStore>,
    policy: TtlPolicy,
    key_prefix: String,
    refresh_on_invalidate: bool,
    /// address → selectors currently cached
    index: DashMap<String, HashSet<String>>,
    generations: DashMap<String, u64>,
}

impl CacheCoordinator {
    pub fn new(transport: Arc<dyn BridgeTransport>, store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            transport,
            store,
            policy: TtlPolicy::from_config(config),
            key_prefix: config.key_prefix.clone(),
            refresh_on_invalidate: config.refresh_on_invalidate,
            index: DashMap::new(),
            generations: DashMap::new(),
        }
    }

    pub fn policy(&self) -> &TtlPolicy {
        &self.policy
    }

    /// `prefix:address:selector`, with `%` and `:` escaped inside the address
    /// and selector so distinct pairs never share a key.
    pub fn cache_key(&self, address: &Address, selector: &str) -> String {
        format!(
            "{}:{}:{}",
            self.key_prefix,
            escape_key_part(address.as_str()),
            escape_key_part(selector)
        )
    }

    /// Selectors currently tracked for `address`.
    pub fn cached_selectors(&self, address: &Address) -> Vec<String> {
        let mut selectors: Vec<String> = self
            .index
            .get(address.as_str())
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        selectors.sort();
        selectors
    }

    /// Read a contract selector, from cache when possible.
    pub async fn read(&self, address: &Address, selector: &str) -> BridgeResult<Value> {
        let key = self.cache_key(address, selector);

        if let Some(value) = self.store.get(&key).await {
            metrics::record_cache_lookup(true);
            tracing::trace!(key = %key, "Cache hit");
            return Ok(value);
        }
        metrics::record_cache_lookup(false);

        self.fetch_and_store(address, selector, &key).await
    }

    async fn fetch_and_store(&self, address: &Address, selector: &str, key: &str) -> BridgeResult<Value> {
        let generation = self.generation(address);

        let call = ContractCall::read(address.as_str(), selector)?;
        let result = self.transport.call_contract(&call).await?;
        let value = result.value;

        if self.generation(address) != generation {
            tracing::debug!(key, "Invalidated during read; not caching");
            return Ok(value);
        }

        let ttl = self.policy.ttl_for(selector);
        self.store.put(key, value.clone(), ttl).await;
        self.index
            .entry(address.as_str().to_string())
            .or_default()
            .insert(selector.to_string());

        // An invalidation may have slipped in while the store write was pending
        if self.generation(address) != generation {
            self.store.forget(key).await;
        } else {
            tracing::debug!(key, ttl_secs = ttl.as_secs(), "Cached contract read");
        }

        Ok(value)
    }

    /// Forget every cached selector of `address`. Returns the number of keys cleared.
    pub async fn invalidate_address(&self, address: &Address) -> usize {
        self.bump_generation(address);

        let selectors = self
            .index
            .remove(address.as_str())
            .map(|(_, set)| set)
            .unwrap_or_default();

        for selector in &selectors {
            self.store.forget(&self.cache_key(address, selector)).await;
        }

        metrics::record_cache_invalidation("full", selectors.len());
        tracing::info!(address = %address, keys = selectors.len(), "Invalidated contract cache");
        selectors.len()
    }

    /// Forget only `selectors` of `address`. Returns the number of keys cleared.
    pub async fn invalidate_selectors(&self, address: &Address, selectors: &[String]) -> usize {
        self.bump_generation(address);

        if let Some(mut tracked) = self.index.get_mut(address.as_str()) {
            for selector in selectors {
                tracked.remove(selector);
            }
        }
        self.index.remove_if(address.as_str(), |_, set| set.is_empty());

        let mut cleared = 0;
        for selector in selectors {
            if self.store.forget(&self.cache_key(address, selector)).await {
                cleared += 1;
            }
        }

        metrics::record_cache_invalidation("selective", cleared);
        tracing::info!(address = %address, selectors = ?selectors, cleared, "Invalidated selectors");
        cleared
    }

    /// Re-read each selector from the bridge independently.
    ///
    /// A failing selector is logged and reported; the others still refresh.
    pub async fn refresh_selectors(&self, address: &Address, selectors: &[String]) -> RefreshReport {
        let reads = selectors.iter().map(|selector| async move {
            let key = self.cache_key(address, selector);
            (selector.clone(), self.fetch_and_store(address, selector, &key).await)
        });

        let mut report = RefreshReport::default();
        for (selector, result) in join_all(reads).await {
            match result {
                Ok(_) => report.refreshed.push(selector),
                Err(e) => {
                    tracing::warn!(address = %address, selector = %selector, error = %e, "Cache refresh failed");
                    report.failed.push((selector, e));
                }
            }
        }
        report
    }

    fn generation(&self, address: &Address) -> u64 {
        self.generations.get(address.as_str()).map(|g| *g).unwrap_or(0)
    }

    fn bump_generation(&self, address: &Address) {
        *self.generations.entry(address.as_str().to_string()).or_insert(0) += 1;
    }
}

fn escape_key_part(part: &str) -> String {
    part.replace('%', "%25").replace(':', "%3A")
}

#[async_trait]
impl OutcomeListener for CacheCoordinator {
    async fn on_outcome(&self, outcome: &SubmissionOutcome) {
        let confirmed = match outcome {
            SubmissionOutcome::Confirmed(confirmed) => confirmed,
            SubmissionOutcome::Failed(_) => return,
        };
        let address = confirmed.call.contract_address();

        match &confirmed.invalidates {
            None => {
                self.invalidate_address(address).await;
            }
            Some(selectors) => {
                self.invalidate_selectors(address, selectors).await;
                if self.refresh_on_invalidate {
                    self.refresh_selectors(address, selectors).await;
                }
            }
        }
    }
}

impl std::fmt::Debug for CacheCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheCoordinator")
            .field("key_prefix", &self.key_prefix)
            .field("refresh_on_invalidate", &self.refresh_on_invalidate)
            .field("addresses", &self.index.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::types::{ContractCallResult, HealthStatus, ProofResult, TransactionStatus};
    use crate::cache::store::MemoryCacheStore;
    use crate::contract::TxHash;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every read with the number of reads served so far.
    struct CountingReads(AtomicUsize);

    #[async_trait]
    impl BridgeTransport for CountingReads {
        async fn submit_transaction(&self, _payload: &Value) -> BridgeResult<TxHash> {
            unreachable!()
        }

        async fn get_transaction_status(&self, _tx_hash: &TxHash) -> BridgeResult<TransactionStatus> {
            unreachable!()
        }

        async fn call_contract(&self, call: &ContractCall) -> BridgeResult<ContractCallResult> {
            if call.entrypoint() == "broken" {
                return Err(BridgeError::Contract("reverted".to_string()));
            }
            let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ContractCallResult { success: true, value: json!(n), error: None })
        }

        async fn generate_proof(&self, _call: &ContractCall) -> BridgeResult<ProofResult> {
            unreachable!()
        }

        async fn get_health(&self) -> BridgeResult<HealthStatus> {
            unreachable!()
        }
    }

    fn coordinator() -> (CacheCoordinator, Arc<CountingReads>) {
        let transport = Arc::new(CountingReads(AtomicUsize::new(0)));
        let coordinator = CacheCoordinator::new(
            transport.clone(),
            Arc::new(MemoryCacheStore::new()),
            &CacheConfig::default(),
        );
        (coordinator, transport)
    }

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_read_through() {
        let (cache, transport) = coordinator();
        let a = addr("0xA");

        assert_eq!(cache.read(&a, "totalSupply").await.unwrap(), json!(1));
        assert_eq!(cache.read(&a, "totalSupply").await.unwrap(), json!(1));
        assert_eq!(transport.0.load(Ordering::SeqCst), 1);
        assert_eq!(cache.cached_selectors(&a), vec!["totalSupply".to_string()]);
    }

    #[tokio::test]
    async fn test_invalidate_address_only_touches_that_address() {
        let (cache, _) = coordinator();
        let (a, b) = (addr("0xA"), addr("0xB"));

        cache.read(&a, "balance").await.unwrap();
        cache.read(&a, "name").await.unwrap();
        cache.read(&b, "balance").await.unwrap();

        assert_eq!(cache.invalidate_address(&a).await, 2);
        assert!(cache.cached_selectors(&a).is_empty());
        assert_eq!(cache.cached_selectors(&b), vec!["balance".to_string()]);

        // Fresh read after invalidation
        assert_eq!(cache.read(&a, "balance").await.unwrap(), json!(4));
        assert_eq!(cache.read(&b, "balance").await.unwrap(), json!(3));
    }

    #[tokio::test]
    async fn test_invalidate_selectors_keeps_the_rest() {
        let (cache, _) = coordinator();
        let a = addr("0xA");

        cache.read(&a, "balance").await.unwrap();
        cache.read(&a, "name").await.unwrap();

        let cleared = cache.invalidate_selectors(&a, &["balance".to_string()]).await;
        assert_eq!(cleared, 1);
        assert_eq!(cache.cached_selectors(&a), vec!["name".to_string()]);
        assert_eq!(cache.read(&a, "name").await.unwrap(), json!(2));
    }

    #[tokio::test]
    async fn test_refresh_reports_failures_separately() {
        let (cache, _) = coordinator();
        let a = addr("0xA");

        let report = cache
            .refresh_selectors(&a, &["balance".to_string(), "broken".to_string()])
            .await;

        assert_eq!(report.refreshed, vec!["balance".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");
        assert!(!report.is_complete());
        assert_eq!(cache.cached_selectors(&a), vec!["balance".to_string()]);
    }

    #[test]
    fn test_cache_key_layout() {
        let (cache, _) = coordinator();
        assert_eq!(cache.cache_key(&addr("0xA"), "balance"), "midnight:0xA:balance");
    }

    #[tokio::test]
    async fn test_delimiters_do_not_collide() {
        let (cache, transport) = coordinator();
        let (a, a_b) = (addr("0xA"), addr("0xA:b"));

        assert_ne!(cache.cache_key(&a, "b:c"), cache.cache_key(&a_b, "c"));
        assert_ne!(cache.cache_key(&a, "%3A"), cache.cache_key(&a, ":"));

        assert_eq!(cache.read(&a, "b:c").await.unwrap(), json!(1));
        assert_eq!(cache.read(&a_b, "c").await.unwrap(), json!(2));
        assert_eq!(transport.0.load(Ordering::SeqCst), 2);

        cache.invalidate_address(&a_b).await;
        assert_eq!(cache.read(&a, "b:c").await.unwrap(), json!(1));
    }
}
