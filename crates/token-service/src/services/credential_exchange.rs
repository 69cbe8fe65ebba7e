use super::TokenExchange;
use crate::errors::{ExchangeError, ValidationError};
use crate::models::{Credentials, TokenResponse};
use crate::observability::hash_for_correlation;
use common::secret::ExposeSecret;
use tracing::instrument;

/// Credentials → token.
///
/// Unknown identifier and wrong password fail identically. An inactive user
/// with a correct password gets `AccountDisabled`.
#[instrument(skip_all)]
pub(super) fn issue(
    exchange: &TokenExchange,
    credentials: &Credentials,
    now: i64,
) -> Result<TokenResponse, ExchangeError> {
    let missing = || ValidationError::MissingCredentials {
        username_field: exchange.policy.username_field().to_string(),
    };

    let identifier = credentials
        .identifier
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(missing)?;
    let password = credentials
        .password
        .as_ref()
        .filter(|pw| !pw.expose_secret().is_empty())
        .ok_or_else(missing)?;

    let user = exchange
        .authenticator
        .authenticate(identifier, password)?
        .ok_or_else(|| {
            tracing::debug!(
                target: "token.services.obtain",
                identifier = %hash_for_correlation(identifier),
                "Credential check failed"
            );
            ValidationError::InvalidCredentials
        })?;

    if !user.is_active {
        tracing::debug!(
            target: "token.services.obtain",
            user = %hash_for_correlation(&user.id.to_string()),
            "Login attempt for disabled account"
        );
        return Err(ValidationError::AccountDisabled.into());
    }

    let mut claims = exchange
        .policy
        .build_payload(&user, &exchange.settings.payload_context(now));

    if exchange.settings.allow_refresh {
        claims.set_orig_iat(now);
    }

    let response = exchange.respond(&user, &claims)?;

    tracing::debug!(
        target: "token.services.obtain",
        user = %hash_for_correlation(&user.id.to_string()),
        refreshable = exchange.settings.allow_refresh,
        "Token issued"
    );

    Ok(response)
}
