use crate::codec::{CodecSettings, SigningAlgorithm, SigningKey};
use crate::services::{
    ExchangeSettings, DEFAULT_EXPIRATION_SECONDS, DEFAULT_REFRESH_EXPIRATION_SECONDS,
};
use base64::{engine::general_purpose, Engine as _};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Minimum length of an HMAC shared secret.
pub const MIN_HMAC_SECRET_BYTES: usize = 32;

/// Upper bound for `TOKEN_LEEWAY_SECONDS`.
pub const MAX_LEEWAY_SECONDS: u64 = 600;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub algorithm: SigningAlgorithm,
    pub signing_key: SigningKey,
    pub expiration_seconds: i64,
    pub allow_refresh: bool,
    pub refresh_expiration_seconds: i64,
    pub verify_expiration: bool,
    pub leeway_seconds: u64,
    pub audience: Option<String>,
    pub issuer: Option<String>,
    /// Login identifier field; `None` resolves to `"username"`.
    pub username_field: Option<String>,
    pub users_file: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid signing algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8082".to_string());

        let algorithm = match vars.get("TOKEN_ALGORITHM") {
            Some(raw) => SigningAlgorithm::from_str(raw).map_err(ConfigError::InvalidAlgorithm)?,
            None => SigningAlgorithm::Hs256,
        };

        let signing_key = load_signing_key(vars, algorithm)?;

        let expiration_seconds =
            parse_positive_seconds(vars, "TOKEN_EXPIRATION_SECONDS", DEFAULT_EXPIRATION_SECONDS)?;
        let refresh_expiration_seconds = parse_positive_seconds(
            vars,
            "TOKEN_REFRESH_EXPIRATION_SECONDS",
            DEFAULT_REFRESH_EXPIRATION_SECONDS,
        )?;

        let allow_refresh = parse_bool(vars, "TOKEN_ALLOW_REFRESH", false)?;
        let verify_expiration = parse_bool(vars, "TOKEN_VERIFY_EXPIRATION", true)?;

        let leeway_seconds = match vars.get("TOKEN_LEEWAY_SECONDS") {
            Some(raw) => {
                let value: u64 = raw.parse().map_err(|e| ConfigError::InvalidValue {
                    name: "TOKEN_LEEWAY_SECONDS".to_string(),
                    reason: format!("{}", e),
                })?;
                if value > MAX_LEEWAY_SECONDS {
                    return Err(ConfigError::InvalidValue {
                        name: "TOKEN_LEEWAY_SECONDS".to_string(),
                        reason: format!("must be at most {}, got {}", MAX_LEEWAY_SECONDS, value),
                    });
                }
                value
            }
            None => 0,
        };

        Ok(Config {
            bind_address,
            algorithm,
            signing_key,
            expiration_seconds,
            allow_refresh,
            refresh_expiration_seconds,
            verify_expiration,
            leeway_seconds,
            audience: non_empty(vars, "TOKEN_AUDIENCE"),
            issuer: non_empty(vars, "TOKEN_ISSUER"),
            username_field: non_empty(vars, "USERNAME_FIELD"),
            users_file: non_empty(vars, "USERS_FILE"),
        })
    }

    pub fn exchange_settings(&self) -> ExchangeSettings {
        ExchangeSettings {
            allow_refresh: self.allow_refresh,
            expiration_seconds: self.expiration_seconds,
            refresh_expiration_seconds: self.refresh_expiration_seconds,
            audience: self.audience.clone(),
            issuer: self.issuer.clone(),
        }
    }

    pub fn codec_settings(&self) -> CodecSettings {
        CodecSettings {
            algorithm: self.algorithm,
            verify_expiration: self.verify_expiration,
            leeway_seconds: self.leeway_seconds,
            audience: self.audience.clone(),
            issuer: self.issuer.clone(),
        }
    }
}

fn load_signing_key(
    vars: &HashMap<String, String>,
    algorithm: SigningAlgorithm,
) -> Result<SigningKey, ConfigError> {
    if algorithm.is_hmac() {
        let secret_base64 = vars
            .get("TOKEN_SECRET_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("TOKEN_SECRET_KEY".to_string()))?;

        let secret = general_purpose::STANDARD.decode(secret_base64)?;
        if secret.len() < MIN_HMAC_SECRET_BYTES {
            return Err(ConfigError::InvalidSigningKey(format!(
                "Expected at least {} bytes, got {}",
                MIN_HMAC_SECRET_BYTES,
                secret.len()
            )));
        }

        Ok(SigningKey::hmac(secret))
    } else {
        let key_base64 = vars
            .get("TOKEN_PRIVATE_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("TOKEN_PRIVATE_KEY".to_string()))?;

        let pkcs8 = general_purpose::STANDARD.decode(key_base64)?;
        SigningKey::ed25519_from_pkcs8(pkcs8)
            .map_err(|e| ConfigError::InvalidSigningKey(e.to_string()))
    }
}

fn parse_positive_seconds(
    vars: &HashMap<String, String>,
    name: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };

    let value: i64 = raw.parse().map_err(|e| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: format!("{}", e),
    })?;

    if value <= 0 {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: format!("must be positive, got {}", value),
        });
    }

    Ok(value)
}

fn parse_bool(
    vars: &HashMap<String, String>,
    name: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match vars.get(name).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}

fn non_empty(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
