use common::secret::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Primary key of a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user as seen by the token exchanges.
///
/// Produced by an `Authenticator` or a `UserDirectory`; the exchanges never
/// construct one themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}

/// Login credentials submitted to the obtain-token exchange.
///
/// Both halves are optional so that "missing" can be reported as a
/// validation failure instead of a deserialization error. Never persisted.
pub struct Credentials {
    pub identifier: Option<String>,
    pub password: Option<SecretString>,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            password: Some(SecretString::from(password.into())),
        }
    }

    /// Pull the identifier (keyed by `username_field`) and `password` out of
    /// a JSON request body. Non-string values count as missing.
    pub fn from_json(body: &Value, username_field: &str) -> Self {
        let identifier = body
            .get(username_field)
            .and_then(Value::as_str)
            .map(ToString::to_string);
        let password = body
            .get("password")
            .and_then(Value::as_str)
            .map(|p| SecretString::from(p.to_string()));

        Self {
            identifier,
            password,
        }
    }
}

/// Custom Debug implementation that redacts both fields.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier.as_ref().map(|_| "[REDACTED]"))
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Successful exchange result: `{"token": "...", ...extra}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenResponse {
    pub fn new(token: String) -> Self {
        Self {
            token,
            extra: Map::new(),
        }
    }

    /// Merge response-augmentation output into the response.
    ///
    /// Only JSON objects are merged; any other value is ignored. A string
    /// `token` in `data` replaces the minted token; a non-string `token` is
    /// dropped.
    pub fn merge_extra(mut self, data: Value) -> Self {
        let Value::Object(map) = data else {
            return self;
        };

        for (key, value) in map {
            if key == "token" {
                match value {
                    Value::String(token) => self.token = token,
                    _ => tracing::debug!(
                        target: "token.models",
                        "Ignoring non-string 'token' from response payload handler"
                    ),
                }
                continue;
            }
            self.extra.insert(key, value);
        }

        self
    }
}
