use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use midnight_bridge::config::loader::finalize;
use midnight_bridge::config::{load_config, BridgeSettings};
use midnight_bridge::lifecycle::{wait_for_shutdown_signal, BridgeStack};
use midnight_bridge::observability::{logging, metrics};
use midnight_bridge::queue::{Dispatch, OutcomeListener, SubmissionOutcome};
use midnight_bridge::signing::{RequestSigner, SignableRequest};
use midnight_bridge::{Address, BridgeError, ContractCall, TxHash};

#[derive(Parser)]
#[command(name = "midnight-bridge")]
#[command(about = "Client for a Midnight bridge service", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check bridge health
    Health,
    /// Show network metadata
    Network,
    /// Show a transaction's status
    Status {
        tx_hash: String,
        /// Poll until the transaction is final, up to this many seconds
        #[arg(long)]
        wait: Option<u64>,
    },
    /// Show the bridge wallet address
    WalletAddress,
    /// Show the bridge wallet balance
    WalletBalance,
    /// Run a read-only contract call (cached when it takes no arguments)
    Call {
        address: String,
        entrypoint: String,
        /// Public argument as key=value; repeatable
        #[arg(long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, Value)>,
    },
    /// Submit a state-changing call and wait for its outcome
    Submit {
        address: String,
        entrypoint: String,
        #[arg(long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, Value)>,
        /// Private (proved) argument as key=value; repeatable
        #[arg(long = "private", value_parser = parse_key_value)]
        private: Vec<(String, Value)>,
    },
    /// Print the authentication headers for a request
    Sign {
        method: String,
        path: String,
        #[arg(long, default_value = "")]
        body: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => load_config(path)?,
        None => finalize(BridgeSettings::default())?,
    };

    logging::init_logging(&settings.observability);

    if settings.observability.metrics_enabled {
        if let Ok(addr) = settings.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let stack = BridgeStack::build(settings)?;

    match cli.command {
        Commands::Health => print_json(&stack.client.get_health().await?)?,
        Commands::Network => print_json(&stack.client.get_network_metadata().await?)?,
        Commands::Status { tx_hash, wait } => {
            let tx_hash = TxHash::new(tx_hash)?;
            let status = match wait {
                Some(secs) => {
                    stack
                        .client
                        .wait_for_confirmation(&tx_hash, Duration::from_secs(secs), Duration::from_secs(2))
                        .await?
                }
                None => stack.client.get_transaction_status(&tx_hash).await?,
            };
            print_json(&status)?;
        }
        Commands::WalletAddress => print_json(&json!({ "address": stack.client.get_wallet_address().await? }))?,
        Commands::WalletBalance => print_json(&json!({ "balance": stack.client.get_wallet_balance().await? }))?,
        Commands::Call { address, entrypoint, args } => {
            let address = Address::new(address)?;
            let value = if args.is_empty() {
                stack.cache.read(&address, &entrypoint).await?
            } else {
                let call = args
                    .into_iter()
                    .fold(ContractCall::read(address.as_str(), entrypoint)?, |call, (k, v)| {
                        call.with_public_arg(k, v)
                    });
                stack.client.call_contract(&call).await?.value
            };
            print_json(&value)?;
        }
        Commands::Submit { address, entrypoint, args, private } => {
            let mut call = ContractCall::write(address, entrypoint)?;
            for (k, v) in args {
                call = call.with_public_arg(k, v);
            }
            for (k, v) in private {
                call = call.with_private_arg(k, v);
            }
            submit(&stack, call).await?;
        }
        Commands::Sign { method, path, body } => sign(&stack.settings, &method, &path, &body)?,
    }

    Ok(())
}

/// Forwards outcomes to the waiting command.
struct OutcomeForwarder(mpsc::UnboundedSender<SubmissionOutcome>);

#[async_trait]
impl OutcomeListener for OutcomeForwarder {
    async fn on_outcome(&self, outcome: &SubmissionOutcome) {
        let _ = self.0.send(outcome.clone());
    }
}

async fn submit(stack: &BridgeStack, call: ContractCall) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    stack.queue.subscribe(Arc::new(OutcomeForwarder(tx)));
    let workers = stack.start_workers();

    match stack.queue.dispatch(call).await? {
        Dispatch::Duplicate { uniqueness_key } => {
            print_json(&json!({ "status": "duplicate", "uniqueness_key": uniqueness_key }))?;
        }
        Dispatch::Queued { job_id, uniqueness_key } => {
            tracing::info!(job_id = %job_id, "Waiting for submission outcome");
            tokio::select! {
                outcome = rx.recv() => {
                    if let Some(outcome) = outcome {
                        print_json(&outcome_json(&outcome, &uniqueness_key))?;
                    }
                }
                _ = wait_for_shutdown_signal() => {
                    tracing::warn!(job_id = %job_id, "Interrupted before the submission finished");
                }
            }
        }
    }

    stack.stop_workers(workers).await;
    Ok(())
}

fn outcome_json(outcome: &SubmissionOutcome, uniqueness_key: &str) -> Value {
    match outcome {
        SubmissionOutcome::Confirmed(c) => json!({
            "status": "confirmed",
            "tx_hash": c.tx_hash,
            "attempts": c.attempts,
            "submitted_at": c.submitted_at,
            "uniqueness_key": uniqueness_key,
        }),
        SubmissionOutcome::Failed(f) => json!({
            "status": "failed",
            "error": f.error.to_string(),
            "failure_reason": f.failure_reason,
            "attempts": f.attempts,
            "failed_at": f.failed_at,
            "uniqueness_key": uniqueness_key,
        }),
    }
}

fn sign(settings: &BridgeSettings, method: &str, path: &str, body: &str) -> Result<(), Box<dyn std::error::Error>> {
    let key = settings
        .bridge
        .signing_key
        .as_deref()
        .ok_or_else(|| BridgeError::Configuration("No signing key configured".to_string()))?;
    let signer = RequestSigner::new(key, settings.signer.max_skew_secs)?;

    let mut request = SignableRequest::new(method, path, body.as_bytes().to_vec());
    let envelope = signer.sign(&mut request);

    let mut headers = Map::new();
    for (name, value) in request.headers.iter() {
        headers.insert(name.as_str().to_string(), Value::String(value.to_str()?.to_string()));
    }
    print_json(&json!({
        "method": envelope.method,
        "path": envelope.path,
        "body_hash": envelope.body_hash,
        "headers": headers,
    }))
}

fn parse_key_value(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    // JSON literals (numbers, booleans, objects) pass through; anything else is a string
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
