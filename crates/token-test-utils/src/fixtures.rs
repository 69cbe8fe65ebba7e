//! Seeded collaborators: user store, codec and exchange.

use crate::crypto_fixtures::test_hmac_key;
use crate::test_ids::*;
use std::sync::Arc;
use token_service::codec::{CodecSettings, JwtCodec, SigningKey};
use token_service::directory::{InMemoryUserStore, UserRecord};
use token_service::models::{User, UserId};
use token_service::policy::ClaimsPolicy;
use token_service::services::{ExchangeSettings, TokenExchange};

/// bcrypt cost for fixture hashes. The minimum bcrypt accepts; keeps tests fast.
pub const TEST_BCRYPT_COST: u32 = 4;

pub fn test_user_record(
    id: UserId,
    username: &str,
    email: &str,
    password: &str,
    is_active: bool,
) -> UserRecord {
    UserRecord {
        user: User {
            id,
            username: username.to_string(),
            email: Some(email.to_string()),
            is_active,
        },
        password_hash: bcrypt::hash(password, TEST_BCRYPT_COST).expect("bcrypt hash"),
    }
}

/// alice and bob (active) plus carol (disabled).
pub fn test_user_records() -> Vec<UserRecord> {
    vec![
        test_user_record(ALICE_ID, ALICE_USERNAME, ALICE_EMAIL, ALICE_PASSWORD, true),
        test_user_record(BOB_ID, BOB_USERNAME, BOB_EMAIL, BOB_PASSWORD, true),
        test_user_record(CAROL_ID, CAROL_USERNAME, CAROL_EMAIL, CAROL_PASSWORD, false),
    ]
}

/// Store keyed by `username_field` (`"username"` or `"email"`).
pub fn test_user_store(username_field: &str) -> Arc<InMemoryUserStore> {
    Arc::new(
        InMemoryUserStore::new(test_user_records(), username_field).expect("fixture user store"),
    )
}

/// Exchange settings with refresh enabled and default lifetimes.
pub fn refreshable_settings() -> ExchangeSettings {
    ExchangeSettings {
        allow_refresh: true,
        ..ExchangeSettings::default()
    }
}

pub fn test_codec(key: &SigningKey, settings: &CodecSettings) -> JwtCodec {
    JwtCodec::new(key, settings).expect("fixture codec")
}

/// HS256 exchange over the fixture store with the default claims policy.
pub fn test_exchange(settings: ExchangeSettings) -> TokenExchange {
    test_exchange_with(
        &test_hmac_key(),
        &CodecSettings::default(),
        settings,
        ClaimsPolicy::default(),
    )
}

pub fn test_exchange_with(
    key: &SigningKey,
    codec_settings: &CodecSettings,
    settings: ExchangeSettings,
    policy: ClaimsPolicy,
) -> TokenExchange {
    let store = test_user_store(policy.username_field());
    TokenExchange::new(
        settings,
        policy,
        Arc::new(test_codec(key, codec_settings)),
        store.clone(),
        store,
    )
}
