//! Startup orchestration.
//!
//! `BridgeStack::build` is the one place collaborators are constructed and
//! wired together. Everything else receives its dependencies explicitly.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::bridge::client::BridgeClient;
use crate::bridge::transport::BridgeTransport;
use crate::bridge::types::BridgeResult;
use crate::cache::{CacheCoordinator, CacheStore, MemoryCacheStore};
use crate::config::BridgeSettings;
use crate::lifecycle::shutdown::Shutdown;
use crate::queue::{JobQueue, LeaseStore, MemoryJobQueue, MemoryLeaseStore, SubmissionQueue};
use crate::signing::RequestSigner;

/// Fully wired bridge subsystems.
pub struct BridgeStack {
    pub settings: BridgeSettings,
    pub client: Arc<BridgeClient>,
    pub queue: Arc<SubmissionQueue>,
    pub cache: Arc<CacheCoordinator>,
    pub shutdown: Shutdown,
}

impl BridgeStack {
    /// Build every subsystem from validated settings, in dependency order:
    /// signer, client, stores, queue, cache. The cache is subscribed to
    /// queue outcomes.
    pub fn build(settings: BridgeSettings) -> BridgeResult<Self> {
        let signer = match settings.bridge.signing_key.as_deref() {
            Some(key) => Some(RequestSigner::new(key, settings.signer.max_skew_secs)?),
            None => {
                tracing::warn!("No signing key configured; bridge requests will be unsigned");
                None
            }
        };

        let client = Arc::new(BridgeClient::new(settings.bridge.clone(), signer)?);
        let transport: Arc<dyn BridgeTransport> = client.clone();

        let leases: Arc<dyn LeaseStore> = Arc::new(MemoryLeaseStore::new());
        let jobs: Arc<dyn JobQueue> = Arc::new(MemoryJobQueue::new());
        let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());

        let queue = Arc::new(SubmissionQueue::new(
            transport.clone(),
            leases,
            jobs,
            settings.queue.clone(),
            settings.bridge.timeout(),
        ));
        let cache = Arc::new(CacheCoordinator::new(transport, store, &settings.cache));
        queue.subscribe(cache.clone());

        tracing::info!(
            base_url = %settings.bridge.base_url,
            workers = settings.queue.workers,
            "Bridge stack ready"
        );

        Ok(Self {
            settings,
            client,
            queue,
            cache,
            shutdown: Shutdown::new(),
        })
    }

    /// Spawn the submission workers.
    pub fn start_workers(&self) -> Vec<JoinHandle<()>> {
        self.queue.start(&self.shutdown)
    }

    /// Stop workers, giving in-flight jobs one attempt deadline to finish.
    ///
    /// Returns whether every worker stopped in time. Jobs still unfinished
    /// afterwards (typically waiting out a retry backoff) are logged; they
    /// produce no outcome and keep their lease until it expires.
    pub async fn stop_workers(&self, handles: Vec<JoinHandle<()>>) -> bool {
        let grace = self
            .settings
            .bridge
            .timeout()
            .saturating_mul(self.settings.queue.job_timeout_multiplier)
            .max(Duration::from_secs(1));
        let stopped = self.shutdown.drain(handles, grace).await;

        let abandoned = self.queue.outstanding();
        if abandoned > 0 {
            tracing::warn!(abandoned, "Stopped with unfinished submissions; their leases stay held until expiry");
        }
        stopped
    }
}
