//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempts >= 1)
//! - Check the bridge URL is usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeSettings → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::BridgeSettings;

/// A single rejected setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Check every semantic constraint and report all violations.
pub fn validate_config(config: &BridgeSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.bridge.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "bridge.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("bridge.base_url", e.to_string())),
    }

    if matches!(&config.bridge.signing_key, Some(key) if key.is_empty()) {
        errors.push(ValidationError::new("bridge.signing_key", "must not be empty when set"));
    }
    if config.bridge.timeout_secs == 0 {
        errors.push(ValidationError::new("bridge.timeout_secs", "must be greater than 0"));
    }
    if config.bridge.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("bridge.connect_timeout_secs", "must be greater than 0"));
    }
    if config.bridge.max_retries > 5 {
        errors.push(ValidationError::new("bridge.max_retries", "must be at most 5"));
    }

    if config.signer.max_skew_secs == 0 {
        errors.push(ValidationError::new("signer.max_skew_secs", "must be greater than 0"));
    }

    if config.queue.workers == 0 {
        errors.push(ValidationError::new("queue.workers", "must be at least 1"));
    }
    if config.queue.max_attempts == 0 {
        errors.push(ValidationError::new("queue.max_attempts", "must be at least 1"));
    }
    if !config.queue.multiplier.is_finite() || config.queue.multiplier < 1.0 {
        errors.push(ValidationError::new("queue.multiplier", "must be a finite number >= 1.0"));
    }
    if config.queue.unique_for_secs == 0 {
        errors.push(ValidationError::new("queue.unique_for_secs", "must be greater than 0"));
    }
    if config.queue.job_timeout_multiplier == 0 {
        errors.push(ValidationError::new("queue.job_timeout_multiplier", "must be at least 1"));
    }

    if config.cache.key_prefix.is_empty() {
        errors.push(ValidationError::new("cache.key_prefix", "must not be empty"));
    }
    for (field, ttl) in [
        ("cache.default_ttl_secs", config.cache.default_ttl_secs),
        ("cache.volatile_ttl_secs", config.cache.volatile_ttl_secs),
        ("cache.static_ttl_secs", config.cache.static_ttl_secs),
    ] {
        if ttl == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("expected 'pretty' or 'json', got '{}'", config.observability.log_format),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new("observability.metrics_address", "not a socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
