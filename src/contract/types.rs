//! Value objects identifying on-chain things.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bridge::types::{BridgeError, BridgeResult};

/// Address of a deployed contract or wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Wrap a non-empty address string.
    pub fn new(value: impl Into<String>) -> BridgeResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(BridgeError::Contract("Address must not be empty".to_string()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = BridgeError;

    fn try_from(value: String) -> BridgeResult<Self> {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(String);

impl TxHash {
    /// Wrap a non-empty transaction hash.
    pub fn new(value: impl Into<String>) -> BridgeResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(BridgeError::Contract("Transaction hash must not be empty".to_string()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TxHash {
    type Error = BridgeError;

    fn try_from(value: String) -> BridgeResult<Self> {
        Self::new(value)
    }
}

impl From<TxHash> for String {
    fn from(value: TxHash) -> Self {
        value.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
