//! Idempotent submission of state-changing contract calls.
//!
//! # Responsibilities
//! - Fingerprint each call and claim a uniqueness lease on dispatch
//! - Run jobs on a pool of workers sharing one job queue
//! - Prove (when needed) and submit, retrying on a geometric schedule
//! - Emit exactly one outcome per job, then release the lease
//!
//! # Known Edge Case
//! The lease TTL is independent of how long a job may keep retrying. If
//! `max_attempts` attempts plus the backoff gaps outlast `unique_for`, the
//! lease can expire while the job is still in flight and a duplicate
//! dispatch would be accepted. Construction logs a warning for such
//! configurations; semantics are left unchanged.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::bridge::transport::BridgeTransport;
use crate::bridge::types::{BridgeError, BridgeResult};
use crate::config::QueueConfig;
use crate::contract::{ContractCall, TxHash};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::queue::channel::JobQueue;
use crate::queue::events::{
    OutcomeBus, OutcomeListener, SubmissionOutcome, TransactionConfirmed, TransactionFailed,
};
use crate::queue::job::{JobState, SubmissionJob};
use crate::queue::lease::LeaseStore;
use crate::resilience::backoff::backoff_schedule;
use crate::resilience::timeouts::{job_deadline, with_deadline};

/// What `dispatch` did with a call. Never the submission outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A new job was queued under a fresh lease.
    Queued { job_id: Uuid, uniqueness_key: String },
    /// A lease for the same call is live; nothing was queued.
    Duplicate { uniqueness_key: String },
}

impl Dispatch {
    pub fn is_queued(&self) -> bool {
        matches!(self, Dispatch::Queued { .. })
    }
}

/// Exactly-effectively-once submission queue.
pub struct SubmissionQueue {
    transport: Arc<dyn BridgeTransport>,
    leases: Arc<dyn LeaseStore>,
    jobs: Arc<dyn JobQueue>,
    outcomes: OutcomeBus,
    config: QueueConfig,
    attempt_timeout: Duration,
}

impl SubmissionQueue {
    /// Create a queue.
    ///
    /// # Arguments
    /// * `transport` - Bridge operations used to prove and submit
    /// * `leases` - Uniqueness lease store shared by all dispatchers
    /// * `jobs` - Job queue shared by all workers
    /// * `config` - Attempts, backoff and lease settings
    /// * `transport_timeout` - Bridge request timeout; one attempt may take
    ///   `transport_timeout * job_timeout_multiplier`
    pub fn new(
        transport: Arc<dyn BridgeTransport>,
        leases: Arc<dyn LeaseStore>,
        jobs: Arc<dyn JobQueue>,
        config: QueueConfig,
        transport_timeout: Duration,
    ) -> Self {
        let attempt_timeout = job_deadline(transport_timeout, config.job_timeout_multiplier);

        let queue = Self {
            transport,
            leases,
            jobs,
            outcomes: OutcomeBus::new(),
            config,
            attempt_timeout,
        };
        queue.warn_if_lease_too_short();
        queue
    }

    /// Register a listener for submission outcomes.
    pub fn subscribe(&self, listener: Arc<dyn OutcomeListener>) {
        self.outcomes.subscribe(listener);
    }

    pub fn outcomes(&self) -> &OutcomeBus {
        &self.outcomes
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Jobs accepted and not yet finished, delayed retries included.
    pub fn outstanding(&self) -> usize {
        self.jobs.outstanding()
    }

    /// Whether a job's worst-case retry window (every attempt hitting its
    /// deadline plus every backoff) is longer than the uniqueness lease.
    ///
    /// When it is, the lease can expire while the job is still retrying and
    /// an identical dispatch is accepted as new.
    pub fn lease_can_expire_mid_retry(&self) -> bool {
        self.worst_case_retry_window() > self.config.unique_for()
    }

    fn worst_case_retry_window(&self) -> Duration {
        let backoff: Duration = self.backoff_schedule().iter().sum();
        self.attempt_timeout
            .saturating_mul(self.config.max_attempts)
            .saturating_add(backoff)
    }

    /// Gaps between attempts for the configured policy.
    pub fn backoff_schedule(&self) -> Vec<Duration> {
        backoff_schedule(self.config.max_attempts, self.config.base_delay_ms, self.config.multiplier)
    }

    /// Queue a state-changing call unless an identical one is in flight.
    ///
    /// On confirmation every cached entry for the contract is invalidated.
    pub async fn dispatch(&self, call: ContractCall) -> BridgeResult<Dispatch> {
        let job = SubmissionJob::new(call, self.config.max_attempts, self.backoff_schedule());
        self.dispatch_job(job).await
    }

    /// Like `dispatch`, but confirmation only invalidates `selectors`.
    ///
    /// The caller must list every state key the entrypoint touches; nothing
    /// is inferred from the call.
    pub async fn dispatch_with_invalidation(
        &self,
        call: ContractCall,
        selectors: Vec<String>,
    ) -> BridgeResult<Dispatch> {
        let job = SubmissionJob::new(call, self.config.max_attempts, self.backoff_schedule())
            .with_invalidation(selectors);
        self.dispatch_job(job).await
    }

    async fn dispatch_job(&self, job: SubmissionJob) -> BridgeResult<Dispatch> {
        if job.call.is_read_only() {
            return Err(BridgeError::Contract(format!(
                "Read-only call {}.{} cannot be submitted",
                job.call.contract_address(),
                job.call.entrypoint()
            )));
        }

        let lease_key = job.lease_key();
        let owner = job.id.to_string();
        let uniqueness_key = job.uniqueness_key.clone();

        if !self
            .leases
            .acquire(&lease_key, &owner, self.config.unique_for())
            .await?
        {
            tracing::info!(
                uniqueness_key = %uniqueness_key,
                contract = %job.call.contract_address(),
                entrypoint = job.call.entrypoint(),
                "Duplicate dispatch dropped; submission already in flight"
            );
            metrics::record_duplicate_dispatch();
            return Ok(Dispatch::Duplicate { uniqueness_key });
        }

        let job_id = job.id;
        tracing::info!(
            job_id = %job_id,
            uniqueness_key = %uniqueness_key,
            contract = %job.call.contract_address(),
            entrypoint = job.call.entrypoint(),
            "Submission queued"
        );

        if let Err(e) = self.jobs.enqueue(job).await {
            // Nothing will ever run under this lease
            let _ = self.leases.release(&lease_key, &owner).await;
            return Err(e);
        }

        Ok(Dispatch::Queued { job_id, uniqueness_key })
    }

    /// Spawn the worker pool. Workers stop taking new jobs on shutdown;
    /// a job already being processed runs to completion.
    pub fn start(self: &Arc<Self>, shutdown: &Shutdown) -> Vec<JoinHandle<()>> {
        let workers = self.config.workers.max(1);
        tracing::info!(workers, "Starting submission workers");

        (0..workers)
            .map(|worker_id| {
                let queue = Arc::clone(self);
                let shutdown = shutdown.subscribe();
                tokio::spawn(async move { queue.run_worker(worker_id, shutdown).await })
            })
            .collect()
    }

    async fn run_worker(self: Arc<Self>, worker_id: usize, mut shutdown: broadcast::Receiver<()>) {
        tracing::debug!(worker_id, "Submission worker started");
        loop {
            tokio::select! {
                job = self.jobs.receive() => match job {
                    Some(job) => self.process(job).await,
                    None => break,
                },
                _ = shutdown.recv() => {
                    tracing::info!(worker_id, "Submission worker received shutdown signal");
                    break;
                }
            }
        }
        tracing::debug!(worker_id, "Submission worker stopped");
    }

    /// Perform one attempt of `job` and decide what happens next.
    pub async fn process(&self, mut job: SubmissionJob) {
        job.attempts += 1;
        job.state = JobState::Submitting;

        tracing::info!(
            job_id = %job.id,
            attempt = job.attempts,
            max_attempts = job.max_attempts,
            contract = %job.call.contract_address(),
            entrypoint = job.call.entrypoint(),
            "Submitting transaction"
        );

        let result = with_deadline(self.attempt_timeout, "Submission attempt", self.execute(&job.call)).await;

        match result {
            Ok(tx_hash) => {
                job.state = JobState::Confirmed;
                tracing::info!(job_id = %job.id, tx_hash = %tx_hash, attempts = job.attempts, "Transaction confirmed");
                metrics::record_submission_outcome("confirmed");

                let outcome = SubmissionOutcome::Confirmed(TransactionConfirmed {
                    tx_hash,
                    call: job.call.clone(),
                    attempts: job.attempts,
                    submitted_at: unix_now(),
                    invalidates: job.invalidates.clone(),
                });
                self.finish(&job, outcome).await;
            }
            Err(error) if job.has_attempts_left() => {
                let delay = job.next_delay();
                job.state = JobState::Retrying;
                tracing::warn!(
                    job_id = %job.id,
                    attempt = job.attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Submission attempt failed; retrying"
                );
                metrics::record_submission_outcome("retried");

                if let Err(e) = self.jobs.nack(job.clone(), delay).await {
                    tracing::error!(job_id = %job.id, error = %e, "Could not schedule retry");
                    self.fail(job, e).await;
                }
            }
            Err(error) => self.fail(job, error).await,
        }
    }

    async fn fail(&self, mut job: SubmissionJob, error: BridgeError) {
        job.state = JobState::Failed;
        let failure_reason = format!(
            "Submission of {}.{} failed after {} attempt(s): {}",
            job.call.contract_address(),
            job.call.entrypoint(),
            job.attempts,
            error
        );
        tracing::error!(job_id = %job.id, attempts = job.attempts, reason = %failure_reason, "Transaction failed");
        metrics::record_submission_outcome("failed");

        let outcome = SubmissionOutcome::Failed(TransactionFailed {
            call: job.call.clone(),
            error,
            failure_reason,
            attempts: job.attempts,
            failed_at: unix_now(),
        });
        self.finish(&job, outcome).await;
    }

    /// Emit, then release the lease, then ack.
    async fn finish(&self, job: &SubmissionJob, outcome: SubmissionOutcome) {
        self.outcomes.publish(&outcome).await;

        match self.leases.release(&job.lease_key(), &job.id.to_string()).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                job_id = %job.id,
                uniqueness_key = %job.uniqueness_key,
                "Lease expired before the job finished"
            ),
            Err(e) => tracing::error!(job_id = %job.id, error = %e, "Failed to release lease"),
        }

        self.jobs.ack(job).await;
    }

    /// Prove if required, then submit.
    async fn execute(&self, call: &ContractCall) -> BridgeResult<TxHash> {
        let mut payload = json!({
            "contract_address": call.contract_address(),
            "entrypoint": call.entrypoint(),
            "public_args": call.public_args(),
            "metadata": call.metadata(),
        });

        if call.requires_proof() {
            let proof = self.transport.generate_proof(call).await?;
            payload["proof"] = Value::String(proof.proof);
            payload["public_outputs"] = proof.public_outputs;
        }

        self.transport.submit_transaction(&payload).await
    }

    fn warn_if_lease_too_short(&self) {
        if self.lease_can_expire_mid_retry() {
            tracing::warn!(
                unique_for_secs = self.config.unique_for_secs,
                worst_case_secs = self.worst_case_retry_window().as_secs(),
                "Retry window can outlast the uniqueness lease; duplicate submissions become possible"
            );
        }
    }
}

impl std::fmt::Debug for SubmissionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionQueue")
            .field("config", &self.config)
            .field("attempt_timeout", &self.attempt_timeout)
            .field("listeners", &self.outcomes.listener_count())
            .finish()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
