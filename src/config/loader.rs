//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::bridge::types::BridgeError;
use crate::config::schema::BridgeSettings;
use crate::config::validation::{validate_config, ValidationError};
use crate::signing::SIGNING_KEY_ENV_VAR;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ConfigError> for BridgeError {
    fn from(err: ConfigError) -> Self {
        BridgeError::Configuration(err.to_string())
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BridgeSettings, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: BridgeSettings = toml::from_str(&content)?;
    finalize(config)
}

/// Apply environment overrides to `config` and validate the result.
pub fn finalize(mut config: BridgeSettings) -> Result<BridgeSettings, ConfigError> {
    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// The signing key from the environment wins over the file.
fn apply_env_overrides(config: &mut BridgeSettings) {
    if let Ok(key) = std::env::var(SIGNING_KEY_ENV_VAR) {
        if !key.is_empty() {
            tracing::debug!(env = SIGNING_KEY_ENV_VAR, "Using signing key from environment");
            config.bridge.signing_key = Some(key);
        }
    }
}
