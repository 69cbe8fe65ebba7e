//! Integration tests for the obtain-token exchange
//!
//! Credentials in, signed token out. Covers the anti-enumeration guarantee,
//! disabled accounts, `orig_iat` stamping and the response hook.

use serde_json::json;
use token_service::codec::{CodecSettings, SigningAlgorithm, TokenCodec};
use token_service::errors::{ExchangeError, ValidationError};
use token_service::models::{Credentials, TokenResponse};
use token_service::policy::ClaimsPolicy;
use token_service::services::ExchangeSettings;
use token_test_utils::*;

fn validation_error(result: Result<TokenResponse, ExchangeError>) -> ValidationError {
    match result {
        Err(ExchangeError::Validation(e)) => e,
        other => panic!("expected a validation error, got {:?}", other),
    }
}

fn alice_credentials() -> Credentials {
    Credentials::new(ALICE_USERNAME, ALICE_PASSWORD)
}

#[test]
fn test_alice_obtains_token_with_her_id() -> Result<(), anyhow::Error> {
    // Arrange
    let exchange = test_exchange(refreshable_settings());
    let codec = test_codec(&test_hmac_key(), &CodecSettings::default());

    // Act
    let response = exchange.issue_token(&alice_credentials())?;

    // Assert
    response
        .token
        .assert_valid_jwt("HS256")
        .assert_for_user(ALICE_ID)
        .assert_expires_in(300);

    let claims = codec.decode(&response.token)?;
    assert_eq!(claims.get("sub"), Some(&json!(1)));
    assert_eq!(claims.get("username"), Some(&json!("alice")));
    assert!(response.extra.is_empty(), "default hook adds nothing");

    Ok(())
}

#[test]
fn test_orig_iat_stamped_when_refresh_allowed() -> Result<(), anyhow::Error> {
    let exchange = test_exchange(refreshable_settings());

    let response = exchange.issue_token_at(&alice_credentials(), TEST_NOW)?;

    response.token.assert_orig_iat(TEST_NOW);
    assert_eq!(unverified_claims(&response.token).exp(), Some(TEST_NOW + 300));

    Ok(())
}

#[test]
fn test_no_orig_iat_when_refresh_disabled() -> Result<(), anyhow::Error> {
    let exchange = test_exchange(ExchangeSettings::default());

    let response = exchange.issue_token_at(&alice_credentials(), TEST_NOW)?;

    response.token.assert_no_orig_iat();
    Ok(())
}

#[test]
fn test_expiration_setting_controls_exp() -> Result<(), anyhow::Error> {
    let exchange = test_exchange(ExchangeSettings {
        expiration_seconds: 60,
        ..ExchangeSettings::default()
    });

    let response = exchange.issue_token_at(&alice_credentials(), TEST_NOW)?;

    assert_eq!(unverified_claims(&response.token).exp(), Some(TEST_NOW + 60));
    Ok(())
}

#[test]
fn test_missing_credentials_rejected() {
    let exchange = test_exchange(refreshable_settings());
    let cases = [
        Credentials {
            identifier: None,
            password: Some("secret".to_string().into()),
        },
        Credentials {
            identifier: Some(ALICE_USERNAME.to_string()),
            password: None,
        },
        Credentials::new("", ALICE_PASSWORD),
        Credentials::new(ALICE_USERNAME, ""),
    ];

    for credentials in cases {
        let err = validation_error(exchange.issue_token(&credentials));
        assert_eq!(
            err,
            ValidationError::MissingCredentials {
                username_field: "username".to_string()
            }
        );
        assert_eq!(err.to_string(), "Must include \"username\" and \"password\".");
    }
}

#[test]
fn test_unknown_user_and_wrong_password_are_indistinguishable() {
    let exchange = test_exchange(refreshable_settings());

    let wrong_password =
        validation_error(exchange.issue_token(&Credentials::new(ALICE_USERNAME, "wrong")));
    let unknown_user =
        validation_error(exchange.issue_token(&Credentials::new(UNKNOWN_USERNAME, ALICE_PASSWORD)));

    assert_eq!(wrong_password, ValidationError::InvalidCredentials);
    assert_eq!(wrong_password, unknown_user);
    assert_eq!(
        wrong_password.to_string(),
        "Unable to log in with provided credentials."
    );
}

#[test]
fn test_disabled_account_rejected() {
    let exchange = test_exchange(refreshable_settings());

    let err = validation_error(exchange.issue_token(&Credentials::new(CAROL_USERNAME, CAROL_PASSWORD)));

    assert_eq!(err, ValidationError::AccountDisabled);
    assert_eq!(err.to_string(), "User account is disabled.");
}

#[test]
fn test_disabled_account_with_wrong_password_is_invalid_credentials() {
    let exchange = test_exchange(refreshable_settings());

    let err = validation_error(exchange.issue_token(&Credentials::new(CAROL_USERNAME, "wrong")));

    assert_eq!(err, ValidationError::InvalidCredentials);
}

#[test]
fn test_email_as_username_field() -> Result<(), anyhow::Error> {
    let exchange = test_exchange_with(
        &test_hmac_key(),
        &CodecSettings::default(),
        refreshable_settings(),
        ClaimsPolicy::new(Some("email".to_string())),
    );

    let response = exchange.issue_token(&Credentials::new(ALICE_EMAIL, ALICE_PASSWORD))?;
    response.token.assert_for_user(ALICE_ID);

    let err = validation_error(exchange.issue_token(&Credentials::new(ALICE_USERNAME, ALICE_PASSWORD)));
    assert_eq!(err, ValidationError::InvalidCredentials);

    let err = validation_error(exchange.issue_token(&Credentials {
        identifier: None,
        password: None,
    }));
    assert_eq!(err.to_string(), "Must include \"email\" and \"password\".");

    Ok(())
}

#[test]
fn test_response_hook_output_is_merged() -> Result<(), anyhow::Error> {
    let policy = ClaimsPolicy::default().with_response_payload_handler(|user| {
        json!({"user": {"id": user.id, "username": user.username}})
    });
    let exchange = test_exchange_with(
        &test_hmac_key(),
        &CodecSettings::default(),
        refreshable_settings(),
        policy,
    );

    let response = exchange.issue_token(&alice_credentials())?;
    let body = serde_json::to_value(&response)?;

    assert_eq!(body["user"], json!({"id": 1, "username": "alice"}));
    response.token.assert_for_user(ALICE_ID);

    Ok(())
}

#[test]
fn test_response_hook_token_replaces_minted_token() -> Result<(), anyhow::Error> {
    let policy = ClaimsPolicy::default()
        .with_response_payload_handler(|_| json!({"token": "hook-token", "x": 1}));
    let exchange = test_exchange_with(
        &test_hmac_key(),
        &CodecSettings::default(),
        refreshable_settings(),
        policy,
    );

    let response = exchange.issue_token(&alice_credentials())?;
    let body = serde_json::to_value(&response)?;

    assert_eq!(body, json!({"token": "hook-token", "x": 1}));
    Ok(())
}

#[test]
fn test_non_object_response_hook_output_is_ignored() -> Result<(), anyhow::Error> {
    let policy = ClaimsPolicy::default().with_response_payload_handler(|_| json!(["not", "an", "object"]));
    let exchange = test_exchange_with(
        &test_hmac_key(),
        &CodecSettings::default(),
        refreshable_settings(),
        policy,
    );

    let response = exchange.issue_token(&alice_credentials())?;

    assert!(response.extra.is_empty());
    Ok(())
}

#[test]
fn test_custom_payload_hook_shapes_claims() -> Result<(), anyhow::Error> {
    let policy = ClaimsPolicy::default().with_payload_handler(|user, ctx| {
        let mut claims = token_service::policy::Claims::new();
        claims.insert("sub", user.id.0);
        claims.insert("role", "member");
        claims.insert("exp", ctx.now + ctx.expiration_seconds);
        claims
    });
    let exchange = test_exchange_with(
        &test_hmac_key(),
        &CodecSettings::default(),
        refreshable_settings(),
        policy,
    );

    let response = exchange.issue_token_at(&alice_credentials(), TEST_NOW)?;
    let claims = unverified_claims(&response.token);

    assert_eq!(claims.get("role"), Some(&json!("member")));
    assert!(!claims.contains_key("username"));
    // orig_iat is stamped by the exchange, not the hook
    assert_eq!(claims.orig_iat(), Some(TEST_NOW));

    Ok(())
}

#[test]
fn test_eddsa_tokens() -> Result<(), anyhow::Error> {
    let key = test_ed25519_key(1)?;
    let settings = CodecSettings {
        algorithm: SigningAlgorithm::EdDsa,
        ..CodecSettings::default()
    };
    let exchange = test_exchange_with(&key, &settings, refreshable_settings(), ClaimsPolicy::default());

    let response = exchange.issue_token(&alice_credentials())?;

    response.token.assert_valid_jwt("EdDSA").assert_for_user(ALICE_ID);
    let claims = test_codec(&key, &settings).decode(&response.token)?;
    assert_eq!(claims.get("username"), Some(&json!("alice")));

    Ok(())
}

#[test]
fn test_audience_and_issuer_are_emitted_and_checked() -> Result<(), anyhow::Error> {
    let codec_settings = CodecSettings {
        audience: Some(TEST_AUDIENCE.to_string()),
        issuer: Some(TEST_ISSUER.to_string()),
        ..CodecSettings::default()
    };
    let exchange = test_exchange_with(
        &test_hmac_key(),
        &codec_settings,
        ExchangeSettings {
            audience: Some(TEST_AUDIENCE.to_string()),
            issuer: Some(TEST_ISSUER.to_string()),
            ..refreshable_settings()
        },
        ClaimsPolicy::default(),
    );

    let response = exchange.issue_token(&alice_credentials())?;
    let claims = test_codec(&test_hmac_key(), &codec_settings).decode(&response.token)?;

    assert_eq!(claims.get("aud"), Some(&json!(TEST_AUDIENCE)));
    assert_eq!(claims.get("iss"), Some(&json!(TEST_ISSUER)));

    // Same secret, different expected audience
    let other = CodecSettings {
        audience: Some("someone-else".to_string()),
        ..codec_settings
    };
    assert!(test_codec(&test_hmac_key(), &other).decode(&response.token).is_err());

    Ok(())
}
