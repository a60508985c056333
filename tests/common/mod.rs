//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use midnight_bridge::bridge::types::{
    BridgeError, BridgeResult, ContractCallResult, HealthStatus, ProofResult, TransactionStatus, TxState,
};
use midnight_bridge::config::BridgeConfig;
use midnight_bridge::{BridgeTransport, ContractCall, TxHash};

/// A request as the mock bridge saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string.
    pub path: String,
    /// Header names are lower-cased.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// What the mock does with a request.
pub enum Reply {
    Respond(u16, String),
    /// Close the connection without answering.
    Drop,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Reply::Respond(status, body.to_string())
    }
}

/// Programmable HTTP/1.1 bridge on an ephemeral port.
///
/// The handler receives each request together with how many requests came
/// before it.
pub struct MockBridge {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBridge {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest, usize) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let handler = handler.clone();
                        let recorded = recorded.clone();
                        tokio::spawn(async move { serve(socket, handler, recorded).await });
                    }
                    Err(_) => break,
                }
            }
        });

        Self { addr, requests }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client config pointing at this mock with fast retries.
    pub fn config(&self) -> BridgeConfig {
        BridgeConfig {
            base_url: self.url(),
            timeout_secs: 5,
            retry_delay_ms: 10,
            ..BridgeConfig::default()
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn serve<F>(mut socket: TcpStream, handler: Arc<F>, recorded: Arc<Mutex<Vec<RecordedRequest>>>)
where
    F: Fn(&RecordedRequest, usize) -> Reply + Send + Sync + 'static,
{
    let request = match read_request(&mut socket).await {
        Some(request) => request,
        None => return,
    };

    let reply = {
        let mut log = recorded.lock().unwrap();
        let reply = handler(&request, log.len());
        log.push(request);
        reply
    };

    match reply {
        Reply::Respond(status, body) => {
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason(status),
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        Reply::Drop => drop(socket),
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(RecordedRequest { method, path, headers, body })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// In-process `BridgeTransport` double that counts calls and fails on demand.
#[derive(Default)]
pub struct MockTransport {
    pub submits: AtomicUsize,
    pub proofs: AtomicUsize,
    pub reads: AtomicUsize,
    /// The first `fail_submits` submissions return a network error.
    pub fail_submits: AtomicUsize,
    /// Every proof request fails.
    pub fail_proofs: bool,
    /// Delay inside each submission, to keep jobs in flight.
    pub submit_delay: Duration,
    /// Ordered log of operations, e.g. `["proof", "submit"]`.
    pub log: Mutex<Vec<&'static str>>,
    /// Payloads passed to `submit_transaction`.
    pub payloads: Mutex<Vec<Value>>,
    /// Values served by `call_contract`, keyed by entrypoint.
    pub state: Mutex<HashMap<String, Value>>,
    /// Entrypoints whose reads fail.
    pub broken_reads: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_submits(n: usize) -> Arc<Self> {
        let transport = Self::default();
        transport.fail_submits.store(n, Ordering::SeqCst);
        Arc::new(transport)
    }

    pub fn with_submit_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            submit_delay: delay,
            ..Self::default()
        })
    }

    pub fn set_state(&self, selector: &str, value: Value) {
        self.state.lock().unwrap().insert(selector.to_string(), value);
    }

    pub fn break_read(&self, selector: &str) {
        self.broken_reads.lock().unwrap().push(selector.to_string());
    }

    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl BridgeTransport for MockTransport {
    async fn submit_transaction(&self, payload: &Value) -> BridgeResult<TxHash> {
        self.log.lock().unwrap().push("submit");
        self.payloads.lock().unwrap().push(payload.clone());
        let n = self.submits.fetch_add(1, Ordering::SeqCst);

        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }

        if n < self.fail_submits.load(Ordering::SeqCst) {
            return Err(BridgeError::http(503, "bridge overloaded"));
        }
        TxHash::new("0xdeadbeef")
    }

    async fn get_transaction_status(&self, _tx_hash: &TxHash) -> BridgeResult<TransactionStatus> {
        Ok(TransactionStatus {
            status: TxState::Confirmed,
            block_height: Some(1),
        })
    }

    async fn call_contract(&self, call: &ContractCall) -> BridgeResult<ContractCallResult> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.broken_reads.lock().unwrap().iter().any(|s| s == call.entrypoint()) {
            return Err(BridgeError::Contract(format!("{} reverted", call.entrypoint())));
        }
        let value = self
            .state
            .lock()
            .unwrap()
            .get(call.entrypoint())
            .cloned()
            .unwrap_or(Value::Null);
        Ok(ContractCallResult {
            success: true,
            value,
            error: None,
        })
    }

    async fn generate_proof(&self, _call: &ContractCall) -> BridgeResult<ProofResult> {
        self.log.lock().unwrap().push("proof");
        self.proofs.fetch_add(1, Ordering::SeqCst);
        if self.fail_proofs {
            return Err(BridgeError::ProofFailed("prover unavailable".to_string()));
        }
        Ok(ProofResult {
            proof: "0xproof".to_string(),
            public_outputs: json!({ "ok": true }),
            generation_time: Some(0.01),
        })
    }

    async fn get_health(&self) -> BridgeResult<HealthStatus> {
        Ok(HealthStatus {
            status: "ok".to_string(),
            message: None,
        })
    }
}

/// Wait until `condition` holds or `timeout` passes.
pub async fn eventually<F>(timeout: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Listener that forwards every outcome to a channel.
pub struct OutcomeChannel(tokio::sync::mpsc::UnboundedSender<midnight_bridge::SubmissionOutcome>);

impl OutcomeChannel {
    pub fn new() -> (Arc<Self>, tokio::sync::mpsc::UnboundedReceiver<midnight_bridge::SubmissionOutcome>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Arc::new(Self(tx)), rx)
    }
}

#[async_trait]
impl midnight_bridge::queue::OutcomeListener for OutcomeChannel {
    async fn on_outcome(&self, outcome: &midnight_bridge::SubmissionOutcome) {
        let _ = self.0.send(outcome.clone());
    }
}

/// Next outcome, failing the test after five seconds.
pub async fn next_outcome(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<midnight_bridge::SubmissionOutcome>,
) -> midnight_bridge::SubmissionOutcome {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a submission outcome")
        .expect("outcome channel closed")
}
