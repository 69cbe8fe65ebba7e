use super::TokenExchange;
use crate::errors::{ExchangeError, ValidationError};
use crate::models::TokenResponse;
use crate::observability::hash_for_correlation;
use tracing::instrument;

/// Live token → new token with the original `orig_iat`.
///
/// The refresh window is anchored at `orig_iat`, never at the previous
/// token's issuance, so chained refreshes cannot extend a session.
#[instrument(skip_all)]
pub(super) fn refresh(
    exchange: &TokenExchange,
    token: &str,
    now: i64,
) -> Result<TokenResponse, ExchangeError> {
    let (claims, user) = exchange.authenticate_token(token)?;

    let orig_iat = claims.orig_iat().ok_or(ValidationError::OrigIatRequired)?;

    let refresh_limit =
        orig_iat.saturating_add(exchange.settings.refresh_expiration_seconds);
    if now > refresh_limit {
        tracing::debug!(
            target: "token.services.refresh",
            user = %hash_for_correlation(&user.id.to_string()),
            orig_iat,
            refresh_limit,
            "Refresh window closed"
        );
        return Err(ValidationError::RefreshExpired.into());
    }

    let mut new_claims = exchange
        .policy
        .build_payload(&user, &exchange.settings.payload_context(now));
    new_claims.set_orig_iat(orig_iat);

    let response = exchange.respond(&user, &new_claims)?;

    tracing::debug!(
        target: "token.services.refresh",
        user = %hash_for_correlation(&user.id.to_string()),
        orig_iat,
        "Token refreshed"
    );

    Ok(response)
}
