//! Submission outcomes and their listeners.
//!
//! Dispatch is fire-and-forget: the only way to learn how a submission
//! ended is to subscribe a listener. Exactly one outcome is emitted per job.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::bridge::types::BridgeError;
use crate::contract::{ContractCall, TxHash};

/// A submission was accepted by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionConfirmed {
    pub tx_hash: TxHash,
    pub call: ContractCall,
    pub attempts: u32,
    /// Unix seconds.
    pub submitted_at: u64,
    /// Selectors the caller declared as touched; `None` means all of them.
    pub invalidates: Option<Vec<String>>,
}

/// A submission exhausted its attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFailed {
    pub call: ContractCall,
    /// The error from the last attempt.
    pub error: BridgeError,
    pub failure_reason: String,
    pub attempts: u32,
    /// Unix seconds.
    pub failed_at: u64,
}

/// Terminal result of one submission job.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Confirmed(TransactionConfirmed),
    Failed(TransactionFailed),
}

impl SubmissionOutcome {
    pub fn call(&self) -> &ContractCall {
        match self {
            SubmissionOutcome::Confirmed(c) => &c.call,
            SubmissionOutcome::Failed(f) => &f.call,
        }
    }

    pub fn tx_hash(&self) -> Option<&TxHash> {
        match self {
            SubmissionOutcome::Confirmed(c) => Some(&c.tx_hash),
            SubmissionOutcome::Failed(_) => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            SubmissionOutcome::Confirmed(c) => c.attempts,
            SubmissionOutcome::Failed(f) => f.attempts,
        }
    }
}

/// Receives submission outcomes.
#[async_trait]
pub trait OutcomeListener: Send + Sync {
    async fn on_outcome(&self, outcome: &SubmissionOutcome);
}

/// Fan-out of outcomes to subscribed listeners.
#[derive(Clone, Default)]
pub struct OutcomeBus {
    listeners: Arc<RwLock<Vec<Arc<dyn OutcomeListener>>>>,
}

impl OutcomeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn OutcomeListener>) {
        self.listeners
            .write()
            .expect("outcome listener lock poisoned")
            .push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().expect("outcome listener lock poisoned").len()
    }

    /// Deliver to every listener, in subscription order.
    pub async fn publish(&self, outcome: &SubmissionOutcome) {
        // Snapshot so no lock is held across listener awaits
        let listeners = self
            .listeners
            .read()
            .expect("outcome listener lock poisoned")
            .clone();
        for listener in listeners {
            listener.on_outcome(outcome).await;
        }
    }
}
