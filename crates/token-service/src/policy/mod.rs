//! Claims policy: how a user becomes a claims map and back.
//!
//! The exchanges never hardcode claim names other than `orig_iat`. Everything
//! else is delegated to the hooks held by [`ClaimsPolicy`], so a deployment
//! can replace the payload shape, the user-id lookup and the response
//! augmentation without touching the exchange state machine.
//!
//! Hooks are plain `Arc<dyn Fn>` values injected at construction. They must
//! be pure: no I/O, no clock reads (the issuance instant arrives through
//! [`PayloadContext`]).

use crate::models::{User, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Claim carrying the Unix time of the original credential-based issuance.
pub const ORIG_IAT_CLAIM: &str = "orig_iat";

/// Login identifier field used when the user model names none.
pub const DEFAULT_USERNAME_FIELD: &str = "username";

/// Ordered claims map carried inside a token.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `orig_iat` as an integer, if present.
    ///
    /// Presence is explicit: a stored `0` is `Some(0)`. Integral floats such
    /// as `1700000000.0` are accepted; any other value is treated as absent.
    pub fn orig_iat(&self) -> Option<i64> {
        let value = self.0.get(ORIG_IAT_CLAIM)?;
        value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        })
    }

    pub fn set_orig_iat(&mut self, orig_iat: i64) {
        self.0.insert(ORIG_IAT_CLAIM.to_string(), Value::from(orig_iat));
    }

    pub fn exp(&self) -> Option<i64> {
        self.0.get("exp").and_then(Value::as_i64)
    }
}

/// Debug prints claim names only; values may identify the user.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("keys", &self.0.keys().collect::<Vec<_>>())
            .field("exp", &self.exp())
            .field("orig_iat", &self.orig_iat())
            .finish()
    }
}

/// Inputs to the payload hook besides the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadContext {
    /// Issuance instant, Unix seconds (UTC).
    pub now: i64,
    /// Lifetime of the minted token; `exp = now + expiration_seconds`.
    pub expiration_seconds: i64,
    pub audience: Option<String>,
    pub issuer: Option<String>,
}

pub type PayloadHandler = Arc<dyn Fn(&User, &PayloadContext) -> Claims + Send + Sync>;
pub type UserIdExtractor = Arc<dyn Fn(&Claims) -> Option<UserId> + Send + Sync>;
pub type ResponsePayloadHandler = Arc<dyn Fn(&User) -> Value + Send + Sync>;

/// Default payload: `sub`, `username`, `exp`, plus `email`, `aud` and `iss`
/// when available.
pub fn default_payload_handler(user: &User, ctx: &PayloadContext) -> Claims {
    let mut claims = Claims::new();
    claims.insert("sub", user.id.0);
    claims.insert("username", user.username.clone());
    if let Some(email) = &user.email {
        claims.insert("email", email.clone());
    }
    claims.insert("exp", ctx.now.saturating_add(ctx.expiration_seconds));
    if let Some(aud) = &ctx.audience {
        claims.insert("aud", aud.clone());
    }
    if let Some(iss) = &ctx.issuer {
        claims.insert("iss", iss.clone());
    }
    claims
}

/// Default extractor: `sub` as an integer or a decimal string.
pub fn default_user_id_extractor(claims: &Claims) -> Option<UserId> {
    match claims.get("sub")? {
        Value::Number(n) => n.as_i64().map(UserId),
        Value::String(s) => s.parse().ok().map(UserId),
        _ => None,
    }
}

/// Default response augmentation: nothing.
pub fn default_response_payload_handler(_user: &User) -> Value {
    Value::Null
}

/// The set of hooks that decide claim shape.
#[derive(Clone)]
pub struct ClaimsPolicy {
    username_field: String,
    payload_handler: PayloadHandler,
    user_id_extractor: UserIdExtractor,
    response_payload_handler: ResponsePayloadHandler,
}

impl ClaimsPolicy {
    /// Build a policy with default hooks.
    ///
    /// `username_field` is the user model's login-identifier override; when
    /// `None` (or blank) the field resolves to `"username"`.
    pub fn new(username_field: Option<String>) -> Self {
        let username_field = username_field
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_USERNAME_FIELD.to_string());

        Self {
            username_field,
            payload_handler: Arc::new(default_payload_handler),
            user_id_extractor: Arc::new(default_user_id_extractor),
            response_payload_handler: Arc::new(default_response_payload_handler),
        }
    }

    pub fn with_payload_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&User, &PayloadContext) -> Claims + Send + Sync + 'static,
    {
        self.payload_handler = Arc::new(handler);
        self
    }

    pub fn with_user_id_extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&Claims) -> Option<UserId> + Send + Sync + 'static,
    {
        self.user_id_extractor = Arc::new(extractor);
        self
    }

    pub fn with_response_payload_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&User) -> Value + Send + Sync + 'static,
    {
        self.response_payload_handler = Arc::new(handler);
        self
    }

    pub fn username_field(&self) -> &str {
        &self.username_field
    }

    pub fn build_payload(&self, user: &User, ctx: &PayloadContext) -> Claims {
        (self.payload_handler)(user, ctx)
    }

    pub fn extract_user_id(&self, claims: &Claims) -> Option<UserId> {
        (self.user_id_extractor)(claims)
    }

    pub fn response_payload(&self, user: &User) -> Value {
        (self.response_payload_handler)(user)
    }
}

impl Default for ClaimsPolicy {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for ClaimsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimsPolicy")
            .field("username_field", &self.username_field)
            .finish_non_exhaustive()
    }
}
