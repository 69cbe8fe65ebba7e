//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Use these types
//! for every sensitive value the token service touches: user passwords,
//! HMAC signing secrets and Ed25519 private keys.
//!
//! `SecretBox<T>` and `SecretString` implement `Debug` with redaction, so any
//! struct deriving `Debug` that holds a secret logs safely. Secrets are
//! zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct LoginRequest {
//!     username: String,
//!     password: SecretString,
//! }
//!
//! let req = LoginRequest {
//!     username: "alice".to_string(),
//!     password: SecretString::from("hunter2"),
//! };
//!
//! assert!(!format!("{req:?}").contains("hunter2"));
//! assert_eq!(req.password.expose_secret(), "hunter2");
//! ```
//!
//! # Usage Guidelines
//!
//! Use `SecretString` for:
//! - User passwords
//!
//! Use `SecretBox<T>` for:
//! - Binary key material (`SecretBox<Vec<u8>>` for HMAC secrets and PKCS#8 keys)

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
