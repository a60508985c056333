//! Bridge HTTP client with signing, retries and error mapping.
//!
//! # Responsibilities
//! - Sign every outgoing request when a key is configured
//! - Retry connection failures and 5xx a small number of times
//! - Map transport outcomes to the error taxonomy per operation
//! - Decode operation-specific response shapes

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::time::{interval, timeout};
use url::Url;

use crate::bridge::response;
use crate::bridge::transport::BridgeTransport;
use crate::bridge::types::{
    BridgeConfig, BridgeError, BridgeResult, ContractCallResult, DeployResult, HealthStatus, ProofResult,
    TransactionStatus,
};
use crate::contract::{Address, Args, ContractCall, TxHash};
use crate::observability::metrics;
use crate::resilience::retries::{AttemptOutcome, RetryPolicy, SIGNATURE_REJECTED};
use crate::signing::{RequestSigner, SignableRequest};

/// HTTP client for the bridge service.
#[derive(Clone)]
pub struct BridgeClient {
    http: reqwest::Client,
    base_url: Url,
    signer: Option<RequestSigner>,
    retry: RetryPolicy,
    config: BridgeConfig,
}

impl BridgeClient {
    /// Create a new bridge client.
    ///
    /// # Arguments
    /// * `config` - Bridge configuration
    /// * `signer` - Request signer; `None` sends requests unsigned
    pub fn new(config: BridgeConfig, signer: Option<RequestSigner>) -> BridgeResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            BridgeError::Configuration(format!("Invalid bridge URL '{}': {}", config.base_url, e))
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| BridgeError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            base_url = %base_url,
            signed = signer.is_some(),
            max_retries = config.max_retries,
            "Bridge client initialized"
        );

        Ok(Self {
            http,
            base_url,
            signer,
            retry: RetryPolicy::from_config(&config),
            config,
        })
    }

    /// Replace the transport retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn is_signing(&self) -> bool {
        self.signer.is_some()
    }

    // ==================== Verbs ====================

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> BridgeResult<Value> {
        self.send("get", Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> BridgeResult<Value> {
        self.send("post", Method::POST, path, &[], Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> BridgeResult<Value> {
        self.send("put", Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> BridgeResult<Value> {
        self.send("delete", Method::DELETE, path, &[], None).await
    }

    // ==================== Operations ====================

    /// Submit a (proven) transaction payload.
    pub async fn submit_transaction(&self, payload: &Value) -> BridgeResult<TxHash> {
        let body = self
            .send("submit_transaction", Method::POST, "/transactions", &[], Some(payload))
            .await?;
        response::tx_hash(&body)
    }

    pub async fn get_transaction_status(&self, tx_hash: &TxHash) -> BridgeResult<TransactionStatus> {
        let path = format!("/transactions/{}/status", tx_hash);
        let body = self
            .send("get_transaction_status", Method::GET, &path, &[], None)
            .await?;
        response::transaction_status(&body)
    }

    /// Execute a call directly, bypassing the submission queue.
    pub async fn call_contract(&self, call: &ContractCall) -> BridgeResult<ContractCallResult> {
        let mut payload = json!({
            "contract_address": call.contract_address(),
            "entrypoint": call.entrypoint(),
            "public_args": call.public_args(),
            "read_only": call.is_read_only(),
        });
        if !call.private_args().is_empty() {
            payload["private_args"] = Value::Object(call.private_args().clone());
        }

        let body = self
            .send("call_contract", Method::POST, "/contracts/call", &[], Some(&payload))
            .await
            .map_err(into_contract)?;
        response::contract_call(&body)
    }

    pub async fn generate_proof(&self, call: &ContractCall) -> BridgeResult<ProofResult> {
        let payload = json!({
            "contract_address": call.contract_address(),
            "entrypoint": call.entrypoint(),
            "public_args": call.public_args(),
            "private_args": call.private_args(),
        });

        let started = Instant::now();
        let body = self
            .send("generate_proof", Method::POST, "/proofs/generate", &[], Some(&payload))
            .await
            .map_err(into_proof)?;
        let proof = response::proof(&body)?;

        tracing::debug!(
            contract = %call.contract_address(),
            entrypoint = call.entrypoint(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            server_secs = ?proof.generation_time,
            "Proof generated"
        );
        Ok(proof)
    }

    pub async fn deploy_contract(&self, contract: &str, args: &Args) -> BridgeResult<DeployResult> {
        let payload = json!({ "contract": contract, "args": args });
        let body = self
            .send("deploy_contract", Method::POST, "/contracts/deploy", &[], Some(&payload))
            .await
            .map_err(into_contract)?;
        response::deploy(&body)
    }

    pub async fn join_contract(&self, address: &Address) -> BridgeResult<()> {
        let payload = json!({ "contract_address": address });
        let body = self
            .send("join_contract", Method::POST, "/contracts/join", &[], Some(&payload))
            .await
            .map_err(into_contract)?;
        response::join(&body)
    }

    pub async fn get_wallet_address(&self) -> BridgeResult<Address> {
        let body = self
            .send("get_wallet_address", Method::GET, "/wallet/address", &[], None)
            .await?;
        response::wallet_address(&body)
    }

    pub async fn get_wallet_balance(&self) -> BridgeResult<String> {
        let body = self
            .send("get_wallet_balance", Method::GET, "/wallet/balance", &[], None)
            .await?;
        response::wallet_balance(&body)
    }

    pub async fn wallet_transfer(&self, to: &Address, amount: &str) -> BridgeResult<TxHash> {
        let payload = json!({ "to": to, "amount": amount });
        let body = self
            .send("wallet_transfer", Method::POST, "/wallet/transfer", &[], Some(&payload))
            .await?;
        response::tx_hash(&body)
    }

    pub async fn get_health(&self) -> BridgeResult<HealthStatus> {
        let body = self.send("get_health", Method::GET, "/health", &[], None).await?;
        response::health(&body)
    }

    pub async fn get_network_metadata(&self) -> BridgeResult<Value> {
        let body = self.send("get_network_metadata", Method::GET, "/network", &[], None).await?;
        if !body.is_object() {
            return Err(BridgeError::network("Network metadata must be a JSON object"));
        }
        Ok(body)
    }

    /// Poll the status endpoint until the transaction is final.
    ///
    /// # Arguments
    /// * `tx_hash` - Transaction hash to monitor
    /// * `max_wait` - Maximum time to wait for a final status
    /// * `poll_interval` - Time between status queries
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: &TxHash,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> BridgeResult<TransactionStatus> {
        let result = timeout(max_wait, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                let status = self.get_transaction_status(tx_hash).await?;
                if status.is_final() {
                    return Ok(status);
                }

                tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Err(BridgeError::network(format!(
                "Transaction {} not final after {}s",
                tx_hash,
                max_wait.as_secs()
            ))),
        }
    }

    // ==================== Transport ====================

    fn url_for(&self, path: &str, query: &[(&str, &str)]) -> BridgeResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/{}", base, path.trim_start_matches('/')))
            .map_err(|e| BridgeError::network(format!("Invalid request path '{}': {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Send one logical request, retrying per policy. Every attempt is
    /// signed afresh.
    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> BridgeResult<Value> {
        let url = self.url_for(path, query)?;
        let path_and_query = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };
        let bytes = match body {
            Some(value) => serde_json::to_vec(value)
                .map_err(|e| BridgeError::network(format!("Failed to encode request body: {}", e)))?,
            None => Vec::new(),
        };

        let started = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let mut signable = SignableRequest::new(method.as_str(), path_and_query.clone(), bytes.clone());
            if let Some(signer) = &self.signer {
                signer.sign(&mut signable);
            }

            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .headers(signable.headers);
            if body.is_some() {
                request = request
                    .header(CONTENT_TYPE, "application/json")
                    .body(signable.body);
            }

            let (outcome, detail) = match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    match response.text().await {
                        Ok(text) if (200..300).contains(&status) => {
                            metrics::record_bridge_request(operation, "success", started);
                            return decode_success(status, &text);
                        }
                        Ok(text) => (AttemptOutcome::Status(status), text),
                        Err(e) => (AttemptOutcome::ConnectionFailed, e.to_string()),
                    }
                }
                Err(e) => (AttemptOutcome::ConnectionFailed, e.to_string()),
            };

            if self.retry.should_retry(attempt, outcome) {
                let delay = self.retry.delay_for(attempt);
                tracing::warn!(
                    operation,
                    path = %path,
                    attempt,
                    outcome = ?outcome,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying bridge request"
                );
                metrics::record_bridge_retry(operation);
                tokio::time::sleep(delay).await;
                continue;
            }

            metrics::record_bridge_request(operation, "failure", started);
            return Err(match outcome {
                AttemptOutcome::ConnectionFailed => {
                    tracing::error!(operation, path = %path, attempts = attempt, error = %detail, "Bridge unreachable");
                    BridgeError::network(format!("Request to {} failed: {}", path, detail))
                }
                AttemptOutcome::Status(status) => {
                    let message = response::error_message(status, &detail);
                    tracing::warn!(operation, path = %path, status, attempts = attempt, message = %message, "Bridge rejected request");
                    if status == SIGNATURE_REJECTED {
                        BridgeError::http(status, format!("Signature rejected by bridge: {}", message))
                    } else {
                        BridgeError::http(status, message)
                    }
                }
            });
        }
    }
}

fn decode_success(status: u16, text: &str) -> BridgeResult<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|_| BridgeError::http(status, response::invalid_response(status)))
}

/// Contract operations report every failure as a contract error.
fn into_contract(err: BridgeError) -> BridgeError {
    match err {
        BridgeError::Network { message, .. } => BridgeError::Contract(message),
        other => other,
    }
}

/// Proof operations report every failure as a proof failure.
fn into_proof(err: BridgeError) -> BridgeError {
    match err {
        BridgeError::Network { message, .. } => BridgeError::ProofFailed(message),
        other => other,
    }
}

#[async_trait]
impl BridgeTransport for BridgeClient {
    async fn submit_transaction(&self, payload: &Value) -> BridgeResult<TxHash> {
        BridgeClient::submit_transaction(self, payload).await
    }

    async fn get_transaction_status(&self, tx_hash: &TxHash) -> BridgeResult<TransactionStatus> {
        BridgeClient::get_transaction_status(self, tx_hash).await
    }

    async fn call_contract(&self, call: &ContractCall) -> BridgeResult<ContractCallResult> {
        BridgeClient::call_contract(self, call).await
    }

    async fn generate_proof(&self, call: &ContractCall) -> BridgeResult<ProofResult> {
        BridgeClient::generate_proof(self, call).await
    }

    async fn get_health(&self) -> BridgeResult<HealthStatus> {
        BridgeClient::get_health(self).await
    }
}

impl std::fmt::Debug for BridgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeClient")
            .field("base_url", &self.base_url.as_str())
            .field("signed", &self.signer.is_some())
            .field("timeout_secs", &self.config.timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}
