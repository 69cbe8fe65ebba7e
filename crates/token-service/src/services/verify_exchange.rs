use super::TokenExchange;
use crate::errors::ExchangeError;
use crate::models::TokenResponse;
use tracing::instrument;

/// Live token of an active user → the same token.
#[instrument(skip_all)]
pub(super) fn verify(exchange: &TokenExchange, token: &str) -> Result<TokenResponse, ExchangeError> {
    let (_claims, user) = exchange.authenticate_token(token)?;

    Ok(TokenResponse::new(token.to_string()).merge_extra(exchange.policy.response_payload(&user)))
}
