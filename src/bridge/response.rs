//! Response decoding.
//!
//! Bridge deployments disagree on field casing, so every lookup accepts both
//! `snake_case` and `camelCase` and prefers `snake_case` when both are
//! present. Missing required fields are errors naming the field; nothing
//! here returns a placeholder value.

use serde_json::Value;

use crate::bridge::types::{
    BridgeError, ContractCallResult, DeployResult, HealthStatus, ProofResult, TransactionStatus, TxState,
};
use crate::contract::{Address, TxHash};

/// Look up `snake` then its camelCase spelling. JSON `null` counts as absent.
pub fn field<'a>(body: &'a Value, snake: &str) -> Option<&'a Value> {
    body.get(snake)
        .filter(|v| !v.is_null())
        .or_else(|| body.get(camel_case(snake).as_str()).filter(|v| !v.is_null()))
}

/// A required string field; empty strings count as missing.
pub fn require_str(body: &Value, snake: &str) -> Result<String, String> {
    match field(body, snake) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(missing(snake)),
    }
}

fn optional_str(body: &Value, snake: &str) -> Option<String> {
    match field(body, snake) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn missing(snake: &str) -> String {
    format!("Missing {} in response", snake)
}

/// `tx_hash` → `txHash`.
pub fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Error message for a non-2xx response.
///
/// Prefers the JSON `message`, then `error`; an unparsable body is reported
/// as an invalid response with the status code.
pub fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => optional_str(&json, "message")
            .or_else(|| optional_str(&json, "error"))
            .unwrap_or_else(|| format!("Bridge request failed with status {}", status)),
        Err(_) => invalid_response(status),
    }
}

pub fn invalid_response(status: u16) -> String {
    format!("Invalid response from bridge (status {})", status)
}

pub fn tx_hash(body: &Value) -> Result<TxHash, BridgeError> {
    let hash = require_str(body, "tx_hash").map_err(BridgeError::network)?;
    TxHash::new(hash)
}

pub fn transaction_status(body: &Value) -> Result<TransactionStatus, BridgeError> {
    let status = match require_str(body, "status").map_err(BridgeError::network)?.as_str() {
        "pending" => TxState::Pending,
        "confirmed" => TxState::Confirmed,
        "failed" => TxState::Failed,
        other => {
            return Err(BridgeError::network(format!(
                "Unknown transaction status '{}' in response",
                other
            )))
        }
    };
    let block_height = field(body, "block_height").and_then(Value::as_u64);

    Ok(TransactionStatus { status, block_height })
}

/// A call result; `success: false` becomes a contract error.
pub fn contract_call(body: &Value) -> Result<ContractCallResult, BridgeError> {
    let success = field(body, "success")
        .and_then(Value::as_bool)
        .ok_or_else(|| BridgeError::Contract(missing("success")))?;
    let error = optional_str(body, "error");

    if !success {
        return Err(BridgeError::Contract(
            error.unwrap_or_else(|| "Contract call failed".to_string()),
        ));
    }

    Ok(ContractCallResult {
        success,
        value: field(body, "value").cloned().unwrap_or(Value::Null),
        error,
    })
}

pub fn proof(body: &Value) -> Result<ProofResult, BridgeError> {
    let proof = require_str(body, "proof").map_err(BridgeError::ProofFailed)?;

    Ok(ProofResult {
        proof,
        public_outputs: field(body, "public_outputs")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default())),
        generation_time: field(body, "generation_time").and_then(Value::as_f64),
    })
}

pub fn deploy(body: &Value) -> Result<DeployResult, BridgeError> {
    let address = require_str(body, "contract_address").map_err(BridgeError::Contract)?;

    Ok(DeployResult {
        contract_address: Address::new(address)?,
        tx_hash: optional_str(body, "tx_hash").map(TxHash::new).transpose()?,
    })
}

/// Join responses only signal success.
pub fn join(body: &Value) -> Result<(), BridgeError> {
    match field(body, "success").and_then(Value::as_bool) {
        Some(true) => Ok(()),
        Some(false) => Err(BridgeError::Contract(
            optional_str(body, "error").unwrap_or_else(|| "Failed to join contract".to_string()),
        )),
        None => Err(BridgeError::Contract(missing("success"))),
    }
}

pub fn health(body: &Value) -> Result<HealthStatus, BridgeError> {
    let status = require_str(body, "status").map_err(BridgeError::network)?;
    let message = optional_str(body, "message");

    if status != "ok" {
        return Err(BridgeError::network(format!(
            "Bridge unhealthy ({}): {}",
            status,
            message.as_deref().unwrap_or("no message")
        )));
    }

    Ok(HealthStatus { status, message })
}

pub fn wallet_address(body: &Value) -> Result<Address, BridgeError> {
    let address = require_str(body, "address").map_err(BridgeError::network)?;
    Address::new(address)
}

/// Balances may arrive as numbers or decimal strings; both are kept as text.
pub fn wallet_balance(body: &Value) -> Result<String, BridgeError> {
    match field(body, "balance") {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(BridgeError::network(missing("balance"))),
    }
}
