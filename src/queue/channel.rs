//! Job delivery.
//!
//! The queue only moves jobs between dispatchers and workers; it makes no
//! uniqueness promises. Redelivery with a delay (`nack`) is how workers
//! schedule a retry without blocking while the backoff elapses.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

use crate::bridge::types::{BridgeError, BridgeResult};
use crate::queue::job::SubmissionJob;

/// Task-queue dispatch interface.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: SubmissionJob) -> BridgeResult<()>;

    /// Next job, or `None` once the queue is closed and drained.
    async fn receive(&self) -> Option<SubmissionJob>;

    /// The job reached a terminal state.
    async fn ack(&self, job: &SubmissionJob);

    /// Hand the job back for redelivery after `delay`.
    async fn nack(&self, job: SubmissionJob, delay: Duration) -> BridgeResult<()>;

    /// Jobs enqueued and not yet acked, including ones waiting out a backoff.
    fn outstanding(&self) -> usize;
}

/// In-process queue on a tokio channel, shared by all workers.
///
/// Delayed redelivery lives in a detached timer task. A job still waiting out
/// its backoff when the process stops is lost: it emits no outcome and its
/// uniqueness lease stays held until it expires. `outstanding` counts such
/// jobs so shutdown can report them.
#[derive(Clone)]
pub struct MemoryJobQueue {
    sender: mpsc::UnboundedSender<SubmissionJob>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<SubmissionJob>>>,
    /// Jobs enqueued and not yet acked, delayed ones included.
    outstanding: Arc<AtomicUsize>,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

}

impl Default for MemoryJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, job: SubmissionJob) -> BridgeResult<()> {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        self.sender.send(job).map_err(|_| {
            self.outstanding.fetch_sub(1, Ordering::SeqCst);
            BridgeError::network("Job queue is closed")
        })
    }

    async fn receive(&self) -> Option<SubmissionJob> {
        // One worker waits on the channel at a time; the others queue on the lock
        self.receiver.lock().await.recv().await
    }

    async fn ack(&self, job: &SubmissionJob) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(job_id = %job.id, "Job acknowledged");
    }

    fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    async fn nack(&self, job: SubmissionJob, delay: Duration) -> BridgeResult<()> {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = sender.send(job) {
                tracing::error!(job_id = %e.0.id, "Job queue closed before redelivery");
            }
        });
        Ok(())
    }
}
