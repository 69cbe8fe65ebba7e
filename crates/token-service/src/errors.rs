use crate::codec::CodecError;
use crate::directory::DirectoryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// User-input failures of an exchange.
///
/// Every variant is terminal for the exchange call that produced it. The
/// messages are returned to clients verbatim; `code()` gives a stable
/// machine-readable tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Must include \"{username_field}\" and \"password\".")]
    MissingCredentials { username_field: String },

    #[error("Must include \"token\".")]
    MissingToken,

    /// Same message for unknown user and wrong password.
    #[error("Unable to log in with provided credentials.")]
    InvalidCredentials,

    #[error("User account is disabled.")]
    AccountDisabled,

    #[error("Signature has expired.")]
    SignatureExpired,

    #[error("Error decoding signature.")]
    DecodeError,

    #[error("Invalid payload.")]
    InvalidPayload,

    #[error("User doesn't exist.")]
    UserNotFound,

    #[error("orig_iat field is required.")]
    OrigIatRequired,

    #[error("Refresh has expired.")]
    RefreshExpired,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingCredentials { .. } | ValidationError::MissingToken => {
                "MISSING_FIELD"
            }
            ValidationError::InvalidCredentials => "INVALID_CREDENTIALS",
            ValidationError::AccountDisabled => "ACCOUNT_DISABLED",
            ValidationError::SignatureExpired => "SIGNATURE_EXPIRED",
            ValidationError::DecodeError => "DECODE_ERROR",
            ValidationError::InvalidPayload => "INVALID_PAYLOAD",
            ValidationError::UserNotFound => "USER_NOT_FOUND",
            ValidationError::OrigIatRequired => "ORIG_IAT_REQUIRED",
            ValidationError::RefreshExpired => "REFRESH_EXPIRED",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Signing failed. Only reachable through a misconfigured key or a
    /// payload handler producing unserializable claims.
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("User directory error: {0}")]
    Directory(String),
}

impl From<DirectoryError> for ExchangeError {
    fn from(err: DirectoryError) -> Self {
        ExchangeError::Directory(err.to_string())
    }
}

impl ExchangeError {
    /// Bounded label for metrics.
    pub fn code(&self) -> &'static str {
        match self {
            ExchangeError::Validation(v) => v.code(),
            ExchangeError::Codec(_) => "CODEC_ERROR",
            ExchangeError::Directory(_) => "DIRECTORY_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ExchangeError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ExchangeError::Validation(v) => (StatusCode::BAD_REQUEST, v.to_string()),
            ExchangeError::Codec(err) => {
                tracing::error!(target: "token.errors", error = %err, "Token codec failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ExchangeError::Directory(detail) => {
                tracing::error!(target: "token.errors", error = %detail, "User directory failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
