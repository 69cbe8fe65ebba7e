//! Deterministic cryptographic fixtures for testing
//!
//! The HMAC secret is a fixed byte pattern; Ed25519 keys are derived from a
//! seed, so the same seed always yields the same key pair.

use base64::engine::general_purpose;
use base64::Engine;
use ring::signature::{Ed25519KeyPair, KeyPair};
use thiserror::Error;
use token_service::codec::SigningKey;

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

/// PKCS#8 v2 prefix for an Ed25519 private key (RFC 8410), up to the seed.
const PKCS8_V2_PREFIX: [u8; 16] = [
    0x30, 0x53, 0x02, 0x01, 0x01, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];

/// Bytes between the seed and the embedded public key.
const PKCS8_V2_PUBLIC_KEY_TAG: [u8; 5] = [0xa1, 0x23, 0x03, 0x21, 0x00];

/// Fixed 32-byte HMAC secret.
pub fn test_hmac_secret() -> Vec<u8> {
    (0u8..32).map(|i| i.wrapping_mul(7).wrapping_add(11)).collect()
}

/// [`test_hmac_secret`] as standard base64, the `TOKEN_SECRET_KEY` format.
pub fn test_hmac_secret_base64() -> String {
    general_purpose::STANDARD.encode(test_hmac_secret())
}

/// A different secret, for "signed by someone else" tests.
pub fn other_hmac_secret() -> Vec<u8> {
    vec![0x5a; 32]
}

pub fn test_hmac_key() -> SigningKey {
    SigningKey::hmac(test_hmac_secret())
}

/// Deterministic Ed25519 key as a PKCS#8 v2 document.
///
/// # Example
/// ```rust,ignore
/// let pkcs8 = test_ed25519_pkcs8(1)?;
/// assert_eq!(pkcs8, test_ed25519_pkcs8(1)?);
/// ```
pub fn test_ed25519_pkcs8(seed: u8) -> Result<Vec<u8>, FixtureError> {
    let mut seed_bytes = [0u8; 32];
    for (i, byte) in seed_bytes.iter_mut().enumerate() {
        *byte = seed.wrapping_mul(i as u8 + 1).wrapping_add(i as u8);
    }

    let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes)
        .map_err(|e| FixtureError::Crypto(format!("Failed to derive test keypair: {:?}", e)))?;

    let mut pkcs8 = Vec::with_capacity(85);
    pkcs8.extend_from_slice(&PKCS8_V2_PREFIX);
    pkcs8.extend_from_slice(&seed_bytes);
    pkcs8.extend_from_slice(&PKCS8_V2_PUBLIC_KEY_TAG);
    pkcs8.extend_from_slice(key_pair.public_key().as_ref());

    Ok(pkcs8)
}

/// [`test_ed25519_pkcs8`] as standard base64, the `TOKEN_PRIVATE_KEY` format.
pub fn test_ed25519_pkcs8_base64(seed: u8) -> Result<String, FixtureError> {
    Ok(general_purpose::STANDARD.encode(test_ed25519_pkcs8(seed)?))
}

pub fn test_ed25519_key(seed: u8) -> Result<SigningKey, FixtureError> {
    SigningKey::ed25519_from_pkcs8(test_ed25519_pkcs8(seed)?)
        .map_err(|e| FixtureError::Crypto(e.to_string()))
}
