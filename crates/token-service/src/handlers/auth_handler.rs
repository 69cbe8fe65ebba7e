use crate::errors::{ExchangeError, ValidationError};
use crate::models::{Credentials, TokenResponse};
use crate::services::TokenExchange;
use axum::{extract::State, Json};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub exchange: TokenExchange,
}

/// Handle credential login
///
/// POST /api/v1/auth/token
///
/// The body is read as loose JSON so that a missing identifier or password
/// reports `MISSING_FIELD` rather than a deserialization rejection. The
/// identifier key is the configured username field.
#[instrument(skip_all, name = "token.handler.obtain")]
pub async fn handle_obtain_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<TokenResponse>, ExchangeError> {
    let credentials = Credentials::from_json(&body, state.exchange.policy().username_field());

    let response = state.exchange.issue_token(&credentials)?;

    Ok(Json(response))
}

/// Handle token refresh
///
/// POST /api/v1/auth/token/refresh
#[instrument(skip_all, name = "token.handler.refresh")]
pub async fn handle_refresh_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<TokenResponse>, ExchangeError> {
    let token = extract_token(&body)?;
    let response = state.exchange.refresh_token(&token)?;

    Ok(Json(response))
}

/// Handle token verification
///
/// POST /api/v1/auth/token/verify
#[instrument(skip_all, name = "token.handler.verify")]
pub async fn handle_verify_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<TokenResponse>, ExchangeError> {
    let token = extract_token(&body)?;
    let response = state.exchange.verify_token(&token)?;

    Ok(Json(response))
}

fn extract_token(body: &Value) -> Result<String, ExchangeError> {
    body.get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ValidationError::MissingToken.into())
}
