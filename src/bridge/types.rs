//! Bridge response types and the error taxonomy.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::contract::{Address, TxHash};

// Re-export BridgeConfig from config module to avoid duplication
pub use crate::config::schema::BridgeConfig;

/// Errors that can occur while talking to the bridge.
///
/// The variant is chosen by the operation being performed, not by the
/// underlying cause: a connection failure during `call_contract` is a
/// `Contract` error, the same failure during `submit_transaction` is a
/// `Network` error.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BridgeError {
    /// Connectivity, timeout, malformed response or signature rejection.
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// HTTP status, when the bridge answered at all.
        status: Option<u16>,
    },

    /// Contract call, deploy or join failure.
    #[error("Contract error: {0}")]
    Contract(String),

    /// Proof generation failed or returned an unusable proof.
    #[error("Proof generation failed: {0}")]
    ProofFailed(String),

    /// Invalid or missing settings, raised at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BridgeError {
    /// Network error without an HTTP status.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status: None,
        }
    }

    /// Network error carrying the status code returned by the bridge.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status: Some(status),
        }
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            _ => None,
        }
    }

    /// The bare message, without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Network { message, .. } => message,
            Self::Contract(m) | Self::ProofFailed(m) | Self::Configuration(m) => m,
        }
    }

    /// Short label used in metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Contract(_) => "contract",
            Self::ProofFailed(_) => "proof",
            Self::Configuration(_) => "configuration",
        }
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Transaction lifecycle as reported by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxState {
    Pending,
    Confirmed,
    Failed,
}

/// Response of `get_transaction_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub status: TxState,
    pub block_height: Option<u64>,
}

impl TransactionStatus {
    /// Confirmed or failed; no further polling is useful.
    pub fn is_final(&self) -> bool {
        matches!(self.status, TxState::Confirmed | TxState::Failed)
    }
}

/// Response of a contract call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractCallResult {
    pub success: bool,
    pub value: Value,
    pub error: Option<String>,
}

/// Response of proof generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofResult {
    pub proof: String,
    pub public_outputs: Value,
    /// Seconds spent by the proof server.
    pub generation_time: Option<f64>,
}

/// Response of a contract deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployResult {
    pub contract_address: Address,
    pub tx_hash: Option<TxHash>,
}

/// Response of the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: Option<String>,
}
