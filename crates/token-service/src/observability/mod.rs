//! Observability for the token service.
//!
//! # Privacy by Default
//!
//! Exchange and handler functions use `#[instrument(skip_all)]` and log an
//! explicit allow-list of fields:
//! - **SAFE**: operation names, error codes, algorithm names
//! - **HASHED**: login identifiers and user ids, via [`hash_for_correlation`]
//! - **NEVER**: passwords, tokens, signing keys

pub mod metrics;

pub use self::metrics::{record_token_issuance, record_validation_failure};

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// One-way and truncated. Not a substitute for keeping secrets out of logs.
pub fn hash_for_correlation(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    hex::encode(result.get(..4).unwrap_or_default())
}
