//! Integration tests for the refresh exchange
//!
//! The refresh window is anchored at `orig_iat`: every refresh copies it
//! unchanged, and the window check is `now > orig_iat + window`.

use chrono::Utc;
use token_service::codec::{CodecSettings, TokenCodec};
use token_service::errors::{ExchangeError, ValidationError};
use token_service::models::{Credentials, TokenResponse};
use token_service::services::ExchangeSettings;
use token_test_utils::*;

const WINDOW: i64 = 3_600;

fn validation_error(result: Result<TokenResponse, ExchangeError>) -> ValidationError {
    match result {
        Err(ExchangeError::Validation(e)) => e,
        other => panic!("expected a validation error, got {:?}", other),
    }
}

fn settings() -> ExchangeSettings {
    ExchangeSettings {
        refresh_expiration_seconds: WINDOW,
        ..refreshable_settings()
    }
}

fn codec() -> impl TokenCodec {
    test_codec(&test_hmac_key(), &CodecSettings::default())
}

#[test]
fn test_alice_refresh_keeps_orig_iat() -> Result<(), anyhow::Error> {
    // Arrange
    let exchange = test_exchange(settings());
    let now = Utc::now().timestamp();
    let first = exchange.issue_token_at(&Credentials::new(ALICE_USERNAME, ALICE_PASSWORD), now - 10)?;

    // Act
    let second = exchange.refresh_token_at(&first.token, now)?;

    // Assert
    assert_ne!(second.token, first.token);
    second
        .token
        .assert_valid_jwt("HS256")
        .assert_for_user(ALICE_ID)
        .assert_orig_iat(now - 10);
    assert_eq!(unverified_claims(&second.token).exp(), Some(now + 300));

    Ok(())
}

#[test]
fn test_chained_refreshes_never_move_orig_iat() -> Result<(), anyhow::Error> {
    let exchange = test_exchange(settings());
    let start = Utc::now().timestamp() - 100;
    let mut token = exchange
        .issue_token_at(&Credentials::new(ALICE_USERNAME, ALICE_PASSWORD), start)?
        .token;

    for step in 1..=5 {
        token = exchange.refresh_token_at(&token, start + step * 10)?.token;
        token.assert_orig_iat(start);
    }

    Ok(())
}

#[test]
fn test_chained_refreshes_cannot_extend_the_window() -> Result<(), anyhow::Error> {
    let exchange = test_exchange(settings());
    let orig_iat = 1_000;
    let token = TestClaimsBuilder::new()
        .with_orig_iat(orig_iat)
        .encode_with(&codec());

    // Refresh late in the window; the new token still carries orig_iat
    let refreshed = exchange.refresh_token_at(&token, orig_iat + WINDOW - 1)?;
    refreshed.token.assert_orig_iat(orig_iat);

    // The new token is rejected once the original window has closed. Its exp
    // came from a past `now`, so re-sign the claims with a live exp.
    let mut claims = unverified_claims(&refreshed.token);
    claims.insert("exp", Utc::now().timestamp() + 300);
    let live = codec().encode(&claims)?;

    let err = validation_error(exchange.refresh_token_at(&live, orig_iat + WINDOW + 1));
    assert_eq!(err, ValidationError::RefreshExpired);

    Ok(())
}

#[test]
fn test_refresh_window_boundary_is_inclusive() -> Result<(), anyhow::Error> {
    let exchange = test_exchange(settings());
    let orig_iat = 50_000;
    let token = TestClaimsBuilder::new()
        .with_orig_iat(orig_iat)
        .encode_with(&codec());

    // now == orig_iat + window is still valid
    exchange.refresh_token_at(&token, orig_iat + WINDOW)?;

    // one second later is not
    let err = validation_error(exchange.refresh_token_at(&token, orig_iat + WINDOW + 1));
    assert_eq!(err, ValidationError::RefreshExpired);
    assert_eq!(err.to_string(), "Refresh has expired.");

    Ok(())
}

#[test]
fn test_orig_iat_zero_is_accepted() -> Result<(), anyhow::Error> {
    let exchange = test_exchange(settings());
    let token = TestClaimsBuilder::new().with_orig_iat(0).encode_with(&codec());

    let refreshed = exchange.refresh_token_at(&token, WINDOW)?;
    refreshed.token.assert_orig_iat(0);

    let err = validation_error(exchange.refresh_token_at(&token, WINDOW + 1));
    assert_eq!(err, ValidationError::RefreshExpired);

    Ok(())
}

#[test]
fn test_missing_orig_iat_rejected() -> Result<(), anyhow::Error> {
    // Tokens minted with refresh disabled carry no orig_iat
    let exchange = test_exchange(ExchangeSettings::default());
    let token = exchange
        .issue_token(&Credentials::new(ALICE_USERNAME, ALICE_PASSWORD))?
        .token;

    let err = validation_error(exchange.refresh_token(&token));

    assert_eq!(err, ValidationError::OrigIatRequired);
    assert_eq!(err.to_string(), "orig_iat field is required.");
    Ok(())
}

#[test]
fn test_expired_token_rejected() {
    let exchange = test_exchange(settings());
    let token = TestClaimsBuilder::new()
        .with_orig_iat(Utc::now().timestamp())
        .expires_in(-120)
        .encode_with(&codec());

    let err = validation_error(exchange.refresh_token(&token));

    assert_eq!(err, ValidationError::SignatureExpired);
    assert_eq!(err.to_string(), "Signature has expired.");
}

#[test]
fn test_tampered_and_foreign_tokens_rejected() {
    let exchange = test_exchange(settings());
    let token = TestClaimsBuilder::new()
        .with_orig_iat(Utc::now().timestamp())
        .encode_with(&codec());

    // Swap the payload for bob's, keeping alice's signature
    let bob_token = TestClaimsBuilder::new()
        .for_user(BOB_ID)
        .with_orig_iat(Utc::now().timestamp())
        .encode_with(&codec());
    let mut parts: Vec<&str> = token.split('.').collect();
    parts[1] = bob_token.split('.').nth(1).unwrap();
    let tampered = parts.join(".");

    let foreign = TestClaimsBuilder::new()
        .with_orig_iat(Utc::now().timestamp())
        .encode_with(&test_codec(
            &token_service::codec::SigningKey::hmac(other_hmac_secret()),
            &CodecSettings::default(),
        ));

    for bad in [tampered.as_str(), foreign.as_str(), "not.a.jwt", "garbage"] {
        let err = validation_error(exchange.refresh_token(bad));
        assert_eq!(err, ValidationError::DecodeError, "token {bad:?}");
        assert_eq!(err.to_string(), "Error decoding signature.");
    }
}

#[test]
fn test_empty_token_rejected() {
    let exchange = test_exchange(settings());

    let err = validation_error(exchange.refresh_token(""));

    assert_eq!(err, ValidationError::MissingToken);
}

#[test]
fn test_unusable_user_id_is_invalid_payload() {
    let exchange = test_exchange(settings());
    let now = Utc::now().timestamp();

    for token in [
        TestClaimsBuilder::new().without_sub().with_orig_iat(now).encode_with(&codec()),
        TestClaimsBuilder::new().with_sub("alice").with_orig_iat(now).encode_with(&codec()),
    ] {
        let err = validation_error(exchange.refresh_token(&token));
        assert_eq!(err, ValidationError::InvalidPayload);
        assert_eq!(err.to_string(), "Invalid payload.");
    }
}

#[test]
fn test_unknown_and_inactive_users_rejected() {
    let exchange = test_exchange(settings());
    let now = Utc::now().timestamp();

    for id in [UNKNOWN_USER_ID, CAROL_ID] {
        let token = TestClaimsBuilder::new()
            .for_user(id)
            .with_orig_iat(now)
            .encode_with(&codec());

        let err = validation_error(exchange.refresh_token(&token));
        assert_eq!(err, ValidationError::UserNotFound);
        assert_eq!(err.to_string(), "User doesn't exist.");
    }
}

#[test]
fn test_user_checked_before_orig_iat() {
    // An inactive user's token without orig_iat reports the user first
    let exchange = test_exchange(settings());
    let token = TestClaimsBuilder::new().for_user(CAROL_ID).encode_with(&codec());

    let err = validation_error(exchange.refresh_token(&token));

    assert_eq!(err, ValidationError::UserNotFound);
}

#[test]
fn test_refresh_rebuilds_payload_from_current_user() -> Result<(), anyhow::Error> {
    // Claims smuggled into the old token do not survive a refresh
    let exchange = test_exchange(settings());
    let token = TestClaimsBuilder::new()
        .with_username("not-alice")
        .with_claim("role", "admin")
        .with_orig_iat(Utc::now().timestamp())
        .encode_with(&codec());

    let refreshed = exchange.refresh_token(&token)?;
    let claims = unverified_claims(&refreshed.token);

    assert_eq!(claims.get("username"), Some(&serde_json::json!(ALICE_USERNAME)));
    assert!(!claims.contains_key("role"));

    Ok(())
}
