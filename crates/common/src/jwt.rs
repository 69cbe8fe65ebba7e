//! JWT utilities shared across token service components.
//!
//! This module provides the structural checks that run before a token ever
//! reaches signature verification:
//! - Size limit for DoS prevention
//! - Three-segment compact serialization check
//! - Header decoding (for logging the algorithm on rejection)
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - These checks do NOT validate the signature; the token MUST still be
//!   verified with the configured key afterwards

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical tokens minted by this service are 200-400 bytes. Anything larger
/// than this is rejected before base64 decoding or signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

// =============================================================================
// Error Types
// =============================================================================

/// Structural problems found before signature verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtShapeError {
    /// Token size exceeds maximum allowed.
    #[error("token exceeds {MAX_JWT_SIZE_BYTES} bytes")]
    TokenTooLarge,

    /// Token is not three dot-separated segments.
    #[error("token is not a compact JWT")]
    MalformedToken,

    /// Header segment is not base64url-encoded JSON.
    #[error("token header is not valid base64url JSON")]
    MalformedHeader,
}

// =============================================================================
// Functions
// =============================================================================

/// Check size and segment count of a compact JWT.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Token is not `header.payload.signature` or a segment is empty
pub fn check_token_shape(token: &str) -> Result<(), JwtShapeError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtShapeError::TokenTooLarge);
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtShapeError::MalformedToken);
    }

    Ok(())
}

/// Read the `alg` field of a JWT header without verifying anything.
///
/// Only used to enrich debug logs when a token is rejected.
///
/// # Errors
///
/// Returns the same errors as [`check_token_shape`], plus `MalformedHeader`
/// when the first segment does not decode to a JSON object.
pub fn peek_algorithm(token: &str) -> Result<Option<String>, JwtShapeError> {
    check_token_shape(token)?;

    let header_part = token
        .split('.')
        .next()
        .ok_or(JwtShapeError::MalformedToken)?;

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_part)
        .map_err(|_| JwtShapeError::MalformedHeader)?;

    let header: serde_json::Value =
        serde_json::from_slice(&header_bytes).map_err(|_| JwtShapeError::MalformedHeader)?;

    if !header.is_object() {
        return Err(JwtShapeError::MalformedHeader);
    }

    Ok(header
        .get("alg")
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string))
}
