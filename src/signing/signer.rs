//! HMAC request signing and verification.
//!
//! # Security
//! - The signing key is never logged, serialized or returned
//! - Verification compares digests in constant time
//! - Timestamps outside the skew window are rejected in both directions

use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::bridge::types::{BridgeError, BridgeResult};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signing timestamp (decimal unix seconds).
pub const TIMESTAMP_HEADER: &str = "X-Midnight-Timestamp";

/// Header carrying the lowercase hex HMAC-SHA256 digest.
pub const SIGNATURE_HEADER: &str = "X-Midnight-Signature";

/// Default tolerated clock skew in seconds.
pub const DEFAULT_MAX_SKEW_SECS: u64 = 300;

/// The parts of an HTTP request that take part in the signature.
#[derive(Debug, Clone, Default)]
pub struct SignableRequest {
    /// HTTP method; normalized to upper case when signing.
    pub method: String,
    /// Path including the query string, e.g. `/transactions?limit=5`.
    pub path_and_query: String,
    /// Raw body bytes.
    pub body: Vec<u8>,
    /// Transport headers. Signing writes the two auth headers here.
    pub headers: HeaderMap,
}

impl SignableRequest {
    pub fn new(method: impl Into<String>, path_and_query: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: method.into(),
            path_and_query: path_and_query.into(),
            body: body.into(),
            headers: HeaderMap::new(),
        }
    }
}

/// Authentication material derived for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub timestamp: i64,
    pub method: String,
    pub path: String,
    pub body_hash: String,
    pub signature: String,
}

/// Signs outgoing bridge requests and verifies incoming ones.
#[derive(Clone)]
pub struct RequestSigner {
    /// Keyed MAC state, cloned for every digest.
    mac: HmacSha256,
    max_skew_secs: u64,
}

impl RequestSigner {
    /// Create a signer from the shared secret.
    ///
    /// An empty key is a configuration error.
    pub fn new(signing_key: &str, max_skew_secs: u64) -> BridgeResult<Self> {
        if signing_key.is_empty() {
            return Err(BridgeError::Configuration("Signing key must not be empty".to_string()));
        }
        let mac = HmacSha256::new_from_slice(signing_key.as_bytes())
            .map_err(|e| BridgeError::Configuration(format!("Invalid signing key: {}", e)))?;

        Ok(Self { mac, max_skew_secs })
    }

    pub fn max_skew_secs(&self) -> u64 {
        self.max_skew_secs
    }

    /// Sign with the current wall-clock time.
    pub fn sign(&self, request: &mut SignableRequest) -> SignedEnvelope {
        self.sign_at(request, unix_now())
    }

    /// Sign with an explicit timestamp and attach the auth headers.
    pub fn sign_at(&self, request: &mut SignableRequest, timestamp: i64) -> SignedEnvelope {
        let method = request.method.to_ascii_uppercase();
        let body_hash = body_hash(&request.body);
        let canonical = canonical_string(timestamp, &method, &request.path_and_query, &body_hash);

        let mut mac = self.mac.clone();
        mac.update(canonical.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        // Both values are ASCII digits / hex, always valid header values
        if let Ok(value) = HeaderValue::from_str(&timestamp.to_string()) {
            request.headers.insert(TIMESTAMP_HEADER, value);
        }
        if let Ok(value) = HeaderValue::from_str(&signature) {
            request.headers.insert(SIGNATURE_HEADER, value);
        }

        SignedEnvelope {
            timestamp,
            method,
            path: request.path_and_query.clone(),
            body_hash,
            signature,
        }
    }

    /// Verify a claimed signature against the current wall-clock time.
    pub fn verify(&self, request: &SignableRequest, claimed_signature: &str) -> bool {
        self.verify_at(request, claimed_signature, unix_now())
    }

    /// Verify a claimed signature as of `now`. Never panics, never errors.
    pub fn verify_at(&self, request: &SignableRequest, claimed_signature: &str, now: i64) -> bool {
        let Some(timestamp) = request
            .headers
            .get(TIMESTAMP_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
        else {
            tracing::debug!("Rejecting request without a usable timestamp header");
            return false;
        };

        let skew = now.abs_diff(timestamp);
        if skew > self.max_skew_secs {
            tracing::debug!(
                timestamp,
                now,
                max_skew_secs = self.max_skew_secs,
                "Rejecting request outside the skew window"
            );
            return false;
        }

        if !is_canonical_signature(claimed_signature) {
            return false;
        }
        let Ok(claimed) = hex::decode(claimed_signature) else {
            return false;
        };

        let method = request.method.to_ascii_uppercase();
        let canonical = canonical_string(
            timestamp,
            &method,
            &request.path_and_query,
            &body_hash(&request.body),
        );

        let mut mac = self.mac.clone();
        mac.update(canonical.as_bytes());
        mac.verify_slice(&claimed).is_ok()
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("signing_key", &"<redacted>")
            .field("max_skew_secs", &self.max_skew_secs)
            .finish()
    }
}

/// `timestamp \n METHOD \n path[?query] \n sha256(body)`
pub fn canonical_string(timestamp: i64, method: &str, path_and_query: &str, body_hash: &str) -> String {
    format!("{}\n{}\n{}\n{}", timestamp, method, path_and_query, body_hash)
}

/// Lowercase hex SHA-256 of the body.
pub fn body_hash(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Exactly 64 lowercase hex characters.
fn is_canonical_signature(signature: &str) -> bool {
    signature.len() == 64 && signature.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
