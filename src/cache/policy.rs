//! Selector volatility and TTL selection.

use std::time::Duration;

use crate::config::CacheConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volatility {
    /// Changes with almost every transaction (balances, nonces).
    Volatile,
    /// Effectively immutable once deployed (name, decimals).
    Static,
    Default,
}

/// Maps a selector to how long its value may be cached.
///
/// Configured patterns are lower-cased substrings; `balanceOf` and
/// `getBalance` both match `balance`. Volatile patterns win over static ones.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    volatile: Vec<String>,
    static_: Vec<String>,
    volatile_ttl: Duration,
    static_ttl: Duration,
    default_ttl: Duration,
}

impl TtlPolicy {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            volatile: lowercase_patterns(&config.volatile_selectors),
            static_: lowercase_patterns(&config.static_selectors),
            volatile_ttl: Duration::from_secs(config.volatile_ttl_secs),
            static_ttl: Duration::from_secs(config.static_ttl_secs),
            default_ttl: Duration::from_secs(config.default_ttl_secs),
        }
    }

    pub fn volatility(&self, selector: &str) -> Volatility {
        let selector = selector.to_lowercase();
        if self.volatile.iter().any(|p| selector.contains(p.as_str())) {
            Volatility::Volatile
        } else if self.static_.iter().any(|p| selector.contains(p.as_str())) {
            Volatility::Static
        } else {
            Volatility::Default
        }
    }

    pub fn ttl_for(&self, selector: &str) -> Duration {
        match self.volatility(selector) {
            Volatility::Volatile => self.volatile_ttl,
            Volatility::Static => self.static_ttl,
            Volatility::Default => self.default_ttl,
        }
    }
}

fn lowercase_patterns(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}
