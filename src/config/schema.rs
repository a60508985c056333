//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge
//! layer. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeSettings {
    /// Bridge endpoint, credentials and transport retry policy.
    pub bridge: BridgeConfig,

    /// Signature verification settings.
    pub signer: SignerConfig,

    /// Submission worker pool and job retry policy.
    pub queue: QueueConfig,

    /// Contract read cache.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Bridge transport configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base URL of the bridge service (e.g., "http://localhost:4000").
    pub base_url: String,

    /// Shared HMAC secret. When absent, requests go out unsigned.
    pub signing_key: Option<String>,

    /// Total request timeout in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Retries after the first attempt for connection failures and 5xx.
    pub max_retries: u32,

    /// Delay before the first retry; grows linearly per retry.
    pub retry_delay_ms: u64,
}

impl BridgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            signing_key: None,
            timeout_secs: 30,
            connect_timeout_secs: 5,
            max_retries: 2,
            retry_delay_ms: 200,
        }
    }
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("base_url", &self.base_url)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .finish()
    }
}

/// Signature verification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Maximum tolerated difference between a request timestamp and now.
    pub max_skew_secs: u64,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            max_skew_secs: crate::signing::signer::DEFAULT_MAX_SKEW_SECS,
        }
    }
}

/// Submission queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Number of concurrent workers pulling from the job queue.
    pub workers: usize,

    /// Total attempts per job, the first one included.
    pub max_attempts: u32,

    /// Delay before the first job retry in milliseconds.
    pub base_delay_ms: u64,

    /// Geometric growth factor between job retries.
    pub multiplier: f64,

    /// Lease TTL on the uniqueness key in seconds.
    pub unique_for_secs: u64,

    /// One attempt may take `bridge.timeout_secs * job_timeout_multiplier`.
    pub job_timeout_multiplier: u32,
}

impl QueueConfig {
    pub fn unique_for(&self) -> Duration {
        Duration::from_secs(self.unique_for_secs)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_attempts: 3,
            base_delay_ms: 1000,
            multiplier: 2.0,
            unique_for_secs: 3600,
            job_timeout_multiplier: 2,
        }
    }
}

/// Contract read cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Prefix for every cache key.
    pub key_prefix: String,

    /// TTL for selectors that are neither volatile nor static.
    pub default_ttl_secs: u64,

    /// TTL for fast-changing state such as balances.
    pub volatile_ttl_secs: u64,

    /// TTL for metadata that practically never changes.
    pub static_ttl_secs: u64,

    /// Selector substrings classified as volatile (case-insensitive).
    pub volatile_selectors: Vec<String>,

    /// Selector substrings classified as static (case-insensitive).
    pub static_selectors: Vec<String>,

    /// Re-read selectively invalidated selectors right away.
    pub refresh_on_invalidate: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: "midnight".to_string(),
            default_ttl_secs: 60,
            volatile_ttl_secs: 10,
            static_ttl_secs: 3600,
            volatile_selectors: vec!["balance".to_string(), "nonce".to_string()],
            static_selectors: vec![
                "name".to_string(),
                "symbol".to_string(),
                "decimals".to_string(),
                "metadata".to_string(),
            ],
            refresh_on_invalidate: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
