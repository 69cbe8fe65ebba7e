//! Builder patterns for test data construction

use chrono::{Duration, Utc};
use serde_json::Value;
use token_service::codec::TokenCodec;
use token_service::models::UserId;
use token_service::policy::Claims;

use crate::test_ids::{ALICE_ID, ALICE_USERNAME};

/// Builder for hand-made claims, including shapes the exchanges never mint.
///
/// # Example
/// ```rust,ignore
/// let token = TestClaimsBuilder::new()
///     .for_user(ALICE_ID)
///     .with_orig_iat(TEST_NOW)
///     .expires_in(60)
///     .encode_with(&codec);
/// ```
pub struct TestClaimsBuilder {
    sub: Option<Value>,
    username: Option<String>,
    exp: Option<i64>,
    orig_iat: Option<i64>,
    extra: Vec<(String, Value)>,
}

impl TestClaimsBuilder {
    /// alice, expiring in one hour, no `orig_iat`
    pub fn new() -> Self {
        Self {
            sub: Some(Value::from(ALICE_ID.0)),
            username: Some(ALICE_USERNAME.to_string()),
            exp: Some((Utc::now() + Duration::seconds(3600)).timestamp()),
            orig_iat: None,
            extra: Vec::new(),
        }
    }

    pub fn for_user(mut self, id: UserId) -> Self {
        self.sub = Some(Value::from(id.0));
        self
    }

    /// Set `sub` to an arbitrary JSON value
    pub fn with_sub(mut self, sub: impl Into<Value>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    pub fn without_sub(mut self) -> Self {
        self.sub = None;
        self
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_orig_iat(mut self, orig_iat: i64) -> Self {
        self.orig_iat = Some(orig_iat);
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    pub fn without_exp(mut self) -> Self {
        self.exp = None;
        self
    }

    pub fn with_claim(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.push((key.to_string(), value.into()));
        self
    }

    pub fn build(self) -> Claims {
        let mut claims = Claims::new();
        if let Some(sub) = self.sub {
            claims.insert("sub", sub);
        }
        if let Some(username) = self.username {
            claims.insert("username", username);
        }
        if let Some(exp) = self.exp {
            claims.insert("exp", exp);
        }
        if let Some(orig_iat) = self.orig_iat {
            claims.set_orig_iat(orig_iat);
        }
        for (key, value) in self.extra {
            claims.insert(key, value);
        }
        claims
    }

    /// Build and sign with `codec`
    pub fn encode_with(self, codec: &dyn TokenCodec) -> String {
        codec.encode(&self.build()).expect("encode test claims")
    }
}

impl Default for TestClaimsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
