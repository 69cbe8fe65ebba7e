//! Token codec: claims map ⇄ signed JWT string.
//!
//! [`TokenCodec`] is the seam the exchanges sign and verify through.
//! [`JwtCodec`] is the production implementation over `jsonwebtoken`,
//! supporting HMAC (HS256/HS384/HS512) with a shared secret and EdDSA with an
//! Ed25519 PKCS#8 key.
//!
//! Algorithm and key are fixed when the codec is built. Changing either
//! invalidates every token minted before the change.

use crate::policy::Claims;
use common::jwt::check_token_shape;
use common::secret::{ExposeSecret, SecretBox};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::signature::{Ed25519KeyPair, KeyPair};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Token encoding failed: {0}")]
    Encode(String),

    #[error("Token decoding failed: {0}")]
    Decode(String),

    #[error("Token signature has expired")]
    ExpiredSignature,

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}

/// Sign and verify claims.
pub trait TokenCodec: Send + Sync {
    /// Serialize and sign `claims`.
    fn encode(&self, claims: &Claims) -> Result<String, CodecError>;

    /// Verify `token` and return its claims.
    ///
    /// Returns `ExpiredSignature` when `exp` has passed and `Decode` for
    /// every other verification failure.
    fn decode(&self, token: &str) -> Result<Claims, CodecError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    Hs256,
    Hs384,
    Hs512,
    EdDsa,
}

impl SigningAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::Hs256 => "HS256",
            SigningAlgorithm::Hs384 => "HS384",
            SigningAlgorithm::Hs512 => "HS512",
            SigningAlgorithm::EdDsa => "EdDSA",
        }
    }

    pub fn is_hmac(&self) -> bool {
        !matches!(self, SigningAlgorithm::EdDsa)
    }

    fn to_jwt(self) -> Algorithm {
        match self {
            SigningAlgorithm::Hs256 => Algorithm::HS256,
            SigningAlgorithm::Hs384 => Algorithm::HS384,
            SigningAlgorithm::Hs512 => Algorithm::HS512,
            SigningAlgorithm::EdDsa => Algorithm::EdDSA,
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(SigningAlgorithm::Hs256),
            "HS384" => Ok(SigningAlgorithm::Hs384),
            "HS512" => Ok(SigningAlgorithm::Hs512),
            "EDDSA" => Ok(SigningAlgorithm::EdDsa),
            other => Err(format!(
                "unsupported algorithm '{}' (expected HS256, HS384, HS512 or EdDSA)",
                other
            )),
        }
    }
}

/// Key material for a [`JwtCodec`].
///
/// Debug is manually implemented to redact all key material.
/// Clone is manually implemented because SecretBox requires explicit cloning.
pub enum SigningKey {
    Hmac(SecretBox<Vec<u8>>),
    Ed25519 {
        private_key_pkcs8: SecretBox<Vec<u8>>,
        public_key: Vec<u8>,
    },
}

impl SigningKey {
    pub fn hmac(secret: Vec<u8>) -> Self {
        SigningKey::Hmac(SecretBox::new(Box::new(secret)))
    }

    /// Parse an Ed25519 PKCS#8 document and derive its public key.
    pub fn ed25519_from_pkcs8(private_key_pkcs8: Vec<u8>) -> Result<Self, CodecError> {
        let key_pair = Ed25519KeyPair::from_pkcs8(&private_key_pkcs8)
            .map_err(|e| CodecError::InvalidKey(format!("Invalid Ed25519 PKCS#8 key: {}", e)))?;
        let public_key = key_pair.public_key().as_ref().to_vec();

        Ok(SigningKey::Ed25519 {
            private_key_pkcs8: SecretBox::new(Box::new(private_key_pkcs8)),
            public_key,
        })
    }
}

impl Clone for SigningKey {
    fn clone(&self) -> Self {
        match self {
            SigningKey::Hmac(secret) => {
                SigningKey::Hmac(SecretBox::new(Box::new(secret.expose_secret().clone())))
            }
            SigningKey::Ed25519 {
                private_key_pkcs8,
                public_key,
            } => SigningKey::Ed25519 {
                private_key_pkcs8: SecretBox::new(Box::new(
                    private_key_pkcs8.expose_secret().clone(),
                )),
                public_key: public_key.clone(),
            },
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningKey::Hmac(_) => f.debug_tuple("Hmac").field(&"[REDACTED]").finish(),
            SigningKey::Ed25519 { .. } => f
                .debug_struct("Ed25519")
                .field("private_key_pkcs8", &"[REDACTED]")
                .finish_non_exhaustive(),
        }
    }
}

/// Verification options for [`JwtCodec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecSettings {
    pub algorithm: SigningAlgorithm,
    /// Reject tokens whose `exp` has passed.
    pub verify_expiration: bool,
    /// Seconds of tolerance applied to `exp`.
    pub leeway_seconds: u64,
    /// When set, `aud` must be present and equal.
    pub audience: Option<String>,
    /// When set, `iss` must be present and equal.
    pub issuer: Option<String>,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            algorithm: SigningAlgorithm::Hs256,
            verify_expiration: true,
            leeway_seconds: 0,
            audience: None,
            issuer: None,
        }
    }
}

/// `jsonwebtoken`-backed codec.
pub struct JwtCodec {
    algorithm: SigningAlgorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    /// Build a codec; fails if the key does not match the algorithm family.
    pub fn new(key: &SigningKey, settings: &CodecSettings) -> Result<Self, CodecError> {
        let (encoding_key, decoding_key) = match (key, settings.algorithm.is_hmac()) {
            (SigningKey::Hmac(secret), true) => (
                EncodingKey::from_secret(secret.expose_secret()),
                DecodingKey::from_secret(secret.expose_secret()),
            ),
            (
                SigningKey::Ed25519 {
                    private_key_pkcs8,
                    public_key,
                },
                false,
            ) => (
                EncodingKey::from_ed_der(private_key_pkcs8.expose_secret()),
                DecodingKey::from_ed_der(public_key),
            ),
            _ => {
                return Err(CodecError::InvalidKey(format!(
                    "key type does not match algorithm {}",
                    settings.algorithm.as_str()
                )))
            }
        };

        let mut validation = Validation::new(settings.algorithm.to_jwt());
        validation.validate_exp = settings.verify_expiration;
        validation.leeway = settings.leeway_seconds;

        let mut required_claims: Vec<&str> = Vec::new();
        match &settings.audience {
            Some(aud) => {
                validation.set_audience(&[aud]);
                required_claims.push("aud");
            }
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &settings.issuer {
            validation.set_issuer(&[iss]);
            required_claims.push("iss");
        }
        validation.set_required_spec_claims(required_claims.as_slice());

        Ok(Self {
            algorithm: settings.algorithm,
            encoding_key,
            decoding_key,
            validation,
        })
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }
}

impl fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtCodec")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl TokenCodec for JwtCodec {
    #[instrument(skip_all, fields(alg = self.algorithm.as_str()))]
    fn encode(&self, claims: &Claims) -> Result<String, CodecError> {
        let mut header = Header::new(self.algorithm.to_jwt());
        header.typ = Some("JWT".to_string());

        encode(&header, claims.as_map(), &self.encoding_key)
            .map_err(|e| CodecError::Encode(format!("JWT signing operation failed: {}", e)))
    }

    #[instrument(skip_all, fields(alg = self.algorithm.as_str()))]
    fn decode(&self, token: &str) -> Result<Claims, CodecError> {
        // Size and structure BEFORE any base64 or crypto work
        check_token_shape(token).map_err(|e| {
            tracing::debug!(target: "token.codec", error = %e, "Token rejected before verification");
            CodecError::Decode(e.to_string())
        })?;

        let token_data =
            decode::<Map<String, Value>>(token, &self.decoding_key, &self.validation).map_err(
                |e| match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!(target: "token.codec", "Token signature expired");
                        CodecError::ExpiredSignature
                    }
                    _ => {
                        tracing::debug!(
                            target: "token.codec",
                            error = %e,
                            token_alg = ?common::jwt::peek_algorithm(token).ok().flatten(),
                            "Token verification failed"
                        );
                        CodecError::Decode(e.to_string())
                    }
                },
            )?;

        Ok(Claims::from_map(token_data.claims))
    }
}
