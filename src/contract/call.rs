//! Description of a read or write against a deployed contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::bridge::types::{BridgeError, BridgeResult};
use crate::contract::types::Address;

/// Argument map. `canonicalize` fixes key order before hashing.
pub type Args = Map<String, Value>;

/// An immutable call against a contract entrypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractCall {
    contract_address: Address,
    entrypoint: String,
    public_args: Args,
    private_args: Args,
    read_only: bool,
    metadata: Args,
}

impl ContractCall {
    /// Create a call with empty argument maps.
    pub fn new(
        contract_address: impl Into<String>,
        entrypoint: impl Into<String>,
        read_only: bool,
    ) -> BridgeResult<Self> {
        let contract_address = Address::new(contract_address)
            .map_err(|_| BridgeError::Contract("Contract address must not be empty".to_string()))?;
        let entrypoint = entrypoint.into();
        if entrypoint.trim().is_empty() {
            return Err(BridgeError::Contract("Entrypoint must not be empty".to_string()));
        }

        Ok(Self {
            contract_address,
            entrypoint,
            public_args: Args::new(),
            private_args: Args::new(),
            read_only,
            metadata: Args::new(),
        })
    }

    /// A read-only query.
    pub fn read(contract_address: impl Into<String>, entrypoint: impl Into<String>) -> BridgeResult<Self> {
        Self::new(contract_address, entrypoint, true)
    }

    /// A state-changing call.
    pub fn write(contract_address: impl Into<String>, entrypoint: impl Into<String>) -> BridgeResult<Self> {
        Self::new(contract_address, entrypoint, false)
    }

    pub fn with_public_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.public_args.insert(key.into(), value.into());
        self
    }

    pub fn with_private_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.private_args.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn contract_address(&self) -> &Address {
        &self.contract_address
    }

    pub fn entrypoint(&self) -> &str {
        &self.entrypoint
    }

    pub fn public_args(&self) -> &Args {
        &self.public_args
    }

    pub fn private_args(&self) -> &Args {
        &self.private_args
    }

    pub fn metadata(&self) -> &Args {
        &self.metadata
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// A write with private inputs must be proven before submission.
    pub fn requires_proof(&self) -> bool {
        !self.read_only && !self.private_args.is_empty()
    }

    /// Deterministic fingerprint of the logical operation.
    ///
    /// Metadata and the read-only flag do not take part: two dispatches
    /// that differ only in metadata are the same transaction.
    pub fn uniqueness_key(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [
            self.contract_address.as_str(),
            self.entrypoint.as_str(),
            &canonicalize(&self.public_args),
            &canonicalize(&self.private_args),
        ] {
            // Length prefix keeps field boundaries unambiguous
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Canonical JSON for an argument map: sorted keys at every depth, no
/// insignificant whitespace.
pub fn canonicalize(args: &Args) -> String {
    sorted(&Value::Object(args.clone())).to_string()
}

// Rebuilds objects in key order so the output does not depend on whether
// serde_json was compiled with `preserve_order`.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&map[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
