//! Shutdown coordination for submission workers.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Coordinator for graceful shutdown.
///
/// Workers subscribe before they start; triggering stops them from taking
/// new jobs. A job already in flight is allowed to finish.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Trigger shutdown and wait up to `grace` for `handles` to finish.
    ///
    /// Returns `false` if the deadline passed with workers still running;
    /// those are aborted.
    pub async fn drain(&self, handles: Vec<JoinHandle<()>>, grace: Duration) -> bool {
        self.trigger();

        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();
        let joined = tokio::time::timeout(grace, futures_util::future::join_all(handles)).await;

        match joined {
            Ok(_) => {
                tracing::info!("All submission workers stopped");
                true
            }
            Err(_) => {
                tracing::warn!(grace_ms = grace.as_millis() as u64, "Workers still busy at deadline; aborting");
                for abort in aborts {
                    abort.abort();
                }
                false
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
