//! Fixed test users and ids for deterministic tests

use token_service::models::UserId;

// Active user with an email
pub const ALICE_ID: UserId = UserId(1);
pub const ALICE_USERNAME: &str = "alice";
pub const ALICE_EMAIL: &str = "alice@example.com";
pub const ALICE_PASSWORD: &str = "secret";

// Second active user
pub const BOB_ID: UserId = UserId(2);
pub const BOB_USERNAME: &str = "bob";
pub const BOB_EMAIL: &str = "bob@example.com";
pub const BOB_PASSWORD: &str = "bob-password";

// Disabled user
pub const CAROL_ID: UserId = UserId(3);
pub const CAROL_USERNAME: &str = "carol";
pub const CAROL_EMAIL: &str = "carol@example.com";
pub const CAROL_PASSWORD: &str = "carol-password";

// Never present in the store
pub const UNKNOWN_USER_ID: UserId = UserId(999);
pub const UNKNOWN_USERNAME: &str = "mallory";

// Audience / issuer used when validation of those claims is under test
pub const TEST_AUDIENCE: &str = "token-service-tests";
pub const TEST_ISSUER: &str = "https://auth.test.local";

/// Fixed instant (2023-11-14T22:13:20Z) for deterministic `_at` calls.
pub const TEST_NOW: i64 = 1_700_000_000;
