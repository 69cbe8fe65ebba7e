//! Token exchanges.
//!
//! [`TokenExchange`] bundles the claims policy, the codec and the user
//! collaborators. It is immutable after construction and shared behind an
//! `Arc` by the HTTP layer. Obtain and refresh have `_at(now)` variants
//! taking the issuance instant (Unix seconds) explicitly.

mod credential_exchange;
mod refresh_exchange;
mod verify_exchange;

use crate::codec::{CodecError, JwtCodec, TokenCodec};
use crate::config::Config;
use crate::directory::{Authenticator, UserDirectory};
use crate::errors::{ExchangeError, ValidationError};
use crate::models::{Credentials, TokenResponse, User};
use crate::observability::{hash_for_correlation, record_token_issuance, record_validation_failure};
use crate::policy::{Claims, ClaimsPolicy, PayloadContext};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Default `exp` delta for minted tokens.
pub const DEFAULT_EXPIRATION_SECONDS: i64 = 300;

/// Default refresh window measured from `orig_iat` (7 days).
pub const DEFAULT_REFRESH_EXPIRATION_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Issuance and refresh parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeSettings {
    /// Stamp `orig_iat` on credential-based issuance.
    pub allow_refresh: bool,
    pub expiration_seconds: i64,
    /// A refresh is rejected once `now > orig_iat + refresh_expiration_seconds`.
    pub refresh_expiration_seconds: i64,
    pub audience: Option<String>,
    pub issuer: Option<String>,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            allow_refresh: false,
            expiration_seconds: DEFAULT_EXPIRATION_SECONDS,
            refresh_expiration_seconds: DEFAULT_REFRESH_EXPIRATION_SECONDS,
            audience: None,
            issuer: None,
        }
    }
}

impl ExchangeSettings {
    pub fn payload_context(&self, now: i64) -> PayloadContext {
        PayloadContext {
            now,
            expiration_seconds: self.expiration_seconds,
            audience: self.audience.clone(),
            issuer: self.issuer.clone(),
        }
    }
}

/// The obtain, refresh and verify exchanges over one set of collaborators.
#[derive(Clone)]
pub struct TokenExchange {
    settings: ExchangeSettings,
    policy: ClaimsPolicy,
    codec: Arc<dyn TokenCodec>,
    authenticator: Arc<dyn Authenticator>,
    directory: Arc<dyn UserDirectory>,
}

impl TokenExchange {
    pub fn new(
        settings: ExchangeSettings,
        policy: ClaimsPolicy,
        codec: Arc<dyn TokenCodec>,
        authenticator: Arc<dyn Authenticator>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            settings,
            policy,
            codec,
            authenticator,
            directory,
        }
    }

    /// Build a [`JwtCodec`]-backed exchange with the default claims policy.
    pub fn from_config(
        config: &Config,
        authenticator: Arc<dyn Authenticator>,
        directory: Arc<dyn UserDirectory>,
    ) -> Result<Self, CodecError> {
        let codec = JwtCodec::new(&config.signing_key, &config.codec_settings())?;

        Ok(Self::new(
            config.exchange_settings(),
            ClaimsPolicy::new(config.username_field.clone()),
            Arc::new(codec),
            authenticator,
            directory,
        ))
    }

    /// Replace the claims policy, e.g. to install custom hooks.
    pub fn with_policy(mut self, policy: ClaimsPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn settings(&self) -> &ExchangeSettings {
        &self.settings
    }

    pub fn policy(&self) -> &ClaimsPolicy {
        &self.policy
    }

    /// Exchange login credentials for a token.
    pub fn issue_token(&self, credentials: &Credentials) -> Result<TokenResponse, ExchangeError> {
        self.issue_token_at(credentials, Utc::now().timestamp())
    }

    pub fn issue_token_at(
        &self,
        credentials: &Credentials,
        now: i64,
    ) -> Result<TokenResponse, ExchangeError> {
        observe("obtain", || {
            credential_exchange::issue(self, credentials, now)
        })
    }

    /// Exchange a live token for a new one carrying the same `orig_iat`.
    pub fn refresh_token(&self, token: &str) -> Result<TokenResponse, ExchangeError> {
        self.refresh_token_at(token, Utc::now().timestamp())
    }

    pub fn refresh_token_at(&self, token: &str, now: i64) -> Result<TokenResponse, ExchangeError> {
        observe("refresh", || refresh_exchange::refresh(self, token, now))
    }

    /// Check a token and echo it back.
    pub fn verify_token(&self, token: &str) -> Result<TokenResponse, ExchangeError> {
        observe("verify", || verify_exchange::verify(self, token))
    }

    /// Sign `claims` and merge the response hook output for `user`.
    fn respond(&self, user: &User, claims: &Claims) -> Result<TokenResponse, ExchangeError> {
        let token = self.codec.encode(claims)?;

        Ok(TokenResponse::new(token).merge_extra(self.policy.response_payload(user)))
    }

    /// Decode `token` and resolve the active user it names.
    ///
    /// Shared first half of the refresh and verify exchanges.
    fn authenticate_token(&self, token: &str) -> Result<(Claims, User), ExchangeError> {
        if token.is_empty() {
            return Err(ValidationError::MissingToken.into());
        }

        let claims = self.codec.decode(token).map_err(|e| match e {
            CodecError::ExpiredSignature => ValidationError::SignatureExpired,
            _ => ValidationError::DecodeError,
        })?;

        let user_id = self
            .policy
            .extract_user_id(&claims)
            .ok_or(ValidationError::InvalidPayload)?;

        let user = self.directory.find_active_by_id(user_id)?.ok_or_else(|| {
            tracing::debug!(
                target: "token.services",
                user = %hash_for_correlation(&user_id.to_string()),
                "Token names a missing or inactive user"
            );
            ValidationError::UserNotFound
        })?;

        Ok((claims, user))
    }
}

impl fmt::Debug for TokenExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenExchange")
            .field("settings", &self.settings)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Run one exchange and record its outcome.
fn observe<F>(operation: &'static str, exchange: F) -> Result<TokenResponse, ExchangeError>
where
    F: FnOnce() -> Result<TokenResponse, ExchangeError>,
{
    let start = Instant::now();
    let result = exchange();

    match &result {
        Ok(_) => record_token_issuance(operation, "success", start.elapsed()),
        Err(e) => {
            record_token_issuance(operation, "error", start.elapsed());
            if let ExchangeError::Validation(v) = e {
                record_validation_failure(operation, v.code());
            }
        }
    }

    result
}
