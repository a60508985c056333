//! The transport seam used by the queue and the cache.

use async_trait::async_trait;
use serde_json::Value;

use crate::bridge::types::{BridgeResult, ContractCallResult, HealthStatus, ProofResult, TransactionStatus};
use crate::contract::{ContractCall, TxHash};

/// Operations the submission queue and cache coordinator depend on.
///
/// `BridgeClient` is the production implementation; tests substitute
/// counting doubles.
#[async_trait]
pub trait BridgeTransport: Send + Sync {
    /// Submit a transaction payload. Failures are network errors.
    async fn submit_transaction(&self, payload: &Value) -> BridgeResult<TxHash>;

    async fn get_transaction_status(&self, tx_hash: &TxHash) -> BridgeResult<TransactionStatus>;

    /// Execute a call. Failures are contract errors.
    async fn call_contract(&self, call: &ContractCall) -> BridgeResult<ContractCallResult>;

    /// Prove a call's private inputs. Failures are proof errors.
    async fn generate_proof(&self, call: &ContractCall) -> BridgeResult<ProofResult>;

    async fn get_health(&self) -> BridgeResult<HealthStatus>;
}
