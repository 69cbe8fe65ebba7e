//! Custom test assertions for expressive tests
//!
//! Inspect tokens without verifying the signature; signature checks belong
//! to the codec under test.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use serde_json::Value;
use token_service::models::UserId;
use token_service::policy::Claims;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

fn segment(token: &str, index: usize) -> Vec<u8> {
    let part = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT has no segment {}", index));
    URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT segment {}: {}", index, e))
}

/// Decode the payload without checking the signature.
pub fn unverified_claims(token: &str) -> Claims {
    serde_json::from_slice(&segment(token, 1)).expect("Failed to parse JWT claims JSON")
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// response.token
///     .assert_valid_jwt("HS256")
///     .assert_for_user(ALICE_ID)
///     .assert_orig_iat(TEST_NOW);
/// ```
pub trait TokenAssertions {
    /// Assert three segments, a JSON header with `typ: JWT` and `alg`, and a
    /// JSON object payload
    fn assert_valid_jwt(&self, alg: &str) -> &Self;

    /// Assert `sub` equals `id`
    fn assert_for_user(&self, id: UserId) -> &Self;

    fn assert_orig_iat(&self, orig_iat: i64) -> &Self;

    fn assert_no_orig_iat(&self) -> &Self;

    /// Assert `exp - now` is within 5 seconds of `seconds`
    fn assert_expires_in(&self, seconds: i64) -> &Self;
}

impl TokenAssertions for str {
    fn assert_valid_jwt(&self, alg: &str) -> &Self {
        let parts = self.split('.').count();
        assert_eq!(
            parts, 3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts
        );

        let header: JwtHeader =
            serde_json::from_slice(&segment(self, 0)).expect("Failed to parse JWT header JSON");
        assert_eq!(header.alg, alg, "Expected {} algorithm", alg);
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        let payload: Value =
            serde_json::from_slice(&segment(self, 1)).expect("Failed to parse JWT claims JSON");
        assert!(payload.is_object(), "JWT payload must be an object");

        self
    }

    fn assert_for_user(&self, id: UserId) -> &Self {
        let claims = unverified_claims(self);
        assert_eq!(
            claims.get("sub"),
            Some(&Value::from(id.0)),
            "Expected sub {}",
            id
        );
        self
    }

    fn assert_orig_iat(&self, orig_iat: i64) -> &Self {
        let claims = unverified_claims(self);
        assert_eq!(claims.orig_iat(), Some(orig_iat), "orig_iat mismatch");
        self
    }

    fn assert_no_orig_iat(&self) -> &Self {
        let claims = unverified_claims(self);
        assert!(
            !claims.contains_key("orig_iat"),
            "Token unexpectedly carries orig_iat"
        );
        self
    }

    fn assert_expires_in(&self, seconds: i64) -> &Self {
        let claims = unverified_claims(self);
        let exp = claims.exp().expect("Token has no exp");
        let expires_in = exp - chrono::Utc::now().timestamp();

        // Allow 5-second tolerance for test execution time
        assert!(
            (expires_in - seconds).abs() <= 5,
            "Expected token to expire in {} seconds, but expires in {} seconds",
            seconds,
            expires_in
        );
        self
    }
}
