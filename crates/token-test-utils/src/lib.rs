//! # Token Test Utilities
//!
//! Shared test utilities for the token service.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (fixed HMAC secret, seeded Ed25519 keys)
//! - Fixed test users and ids
//! - Seeded user store and exchange fixtures
//! - Test data builders (TestClaimsBuilder)
//! - Server test harness (TestTokenServer for E2E tests)
//! - Custom assertions (TokenAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use token_test_utils::*;
//!
//! #[test]
//! fn test_example() {
//!     let exchange = test_exchange(refreshable_settings());
//!     let response = exchange
//!         .issue_token(&Credentials::new(ALICE_USERNAME, ALICE_PASSWORD))
//!         .unwrap();
//!
//!     response
//!         .token
//!         .assert_valid_jwt("HS256")
//!         .assert_for_user(ALICE_ID);
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod fixtures;
pub mod server_harness;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use fixtures::*;
pub use server_harness::*;
pub use test_ids::*;
pub use token_builders::*;
