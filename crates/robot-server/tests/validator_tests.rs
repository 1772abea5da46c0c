//! Token validator integration tests.
//!
//! Drives `TokenValidator` end to end against a mocked JWKS endpoint with
//! real RS256 signatures.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::Algorithm;
use robot_server::auth::{JwksClient, TokenValidator, ValidatorSettings};
use robot_server::errors::AuthError;
use robot_test_utils::{
    jwks_json, MockJwks, TestTokenBuilder, PRIMARY, SECONDARY, TEST_AUDIENCE, TEST_ISSUER,
};
use serde_json::{json, Value};
use std::time::Duration;

fn validator_for(jwks: &MockJwks, fetch_timeout: Duration) -> TokenValidator {
    TokenValidator::new(
        ValidatorSettings {
            issuer: TEST_ISSUER.to_string(),
            audience: TEST_AUDIENCE.to_string(),
            algorithm: Algorithm::RS256,
            clock_skew: Duration::from_secs(300),
        },
        JwksClient::new(jwks.url(), fetch_timeout),
    )
}

fn validator(jwks: &MockJwks) -> TokenValidator {
    validator_for(jwks, Duration::from_secs(5))
}

async fn primary_key_set() -> MockJwks {
    MockJwks::start(jwks_json(vec![PRIMARY.jwk_json("k1")])).await
}

/// Replace the payload segment of a signed token, keeping the signature.
fn with_payload(token: &str, claims: &Value) -> String {
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3);
    format!(
        "{}.{}.{}",
        parts[0],
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        parts[2]
    )
}

// ============================================================================
// Successful validation
// ============================================================================

#[tokio::test]
async fn test_valid_token_returns_claims_unchanged() {
    let jwks = primary_key_set().await;
    let claims = json!({"iss": "https://issuer.example/", "aud": "https://api.example"});
    let token = PRIMARY.sign(Some("k1"), &claims).unwrap();

    let verified = validator(&jwks).validate(&token).await.unwrap();

    assert_eq!(verified.issuer(), Some("https://issuer.example/"));
    assert!(verified.has_audience("https://api.example"));
    assert_eq!(serde_json::to_value(&verified).unwrap(), claims);
}

#[tokio::test]
async fn test_valid_token_preserves_custom_claims() {
    let jwks = primary_key_set().await;
    let claims = TestTokenBuilder::new()
        .for_user("auth0|alice")
        .with_scope("read:tasks write:tasks")
        .with_claim("https://robot.example/roles", json!(["admin"]))
        .build();
    let token = PRIMARY.sign(Some("k1"), &claims).unwrap();

    let verified = validator(&jwks).validate(&token).await.unwrap();

    assert_eq!(verified.subject(), Some("auth0|alice"));
    assert_eq!(
        verified.custom::<String>("scope").as_deref(),
        Some("read:tasks write:tasks")
    );
    assert_eq!(
        verified.custom::<Vec<String>>("https://robot.example/roles"),
        Some(vec!["admin".to_string()])
    );
    assert_eq!(serde_json::to_value(&verified).unwrap(), claims);
}

#[tokio::test]
async fn test_audience_list_containing_expected_audience() {
    let jwks = primary_key_set().await;
    let claims = TestTokenBuilder::new()
        .with_audiences(&["https://issuer.example/userinfo", TEST_AUDIENCE])
        .build();
    let token = PRIMARY.sign(Some("k1"), &claims).unwrap();

    let verified = validator(&jwks).validate(&token).await.unwrap();

    assert_eq!(verified.audiences().len(), 2);
}

#[tokio::test]
async fn test_key_selected_by_kid_among_several() {
    let jwks = MockJwks::start(jwks_json(vec![
        SECONDARY.jwk_json("k2"),
        PRIMARY.jwk_json("k1"),
    ]))
    .await;
    let validator = validator(&jwks);

    let primary_token = PRIMARY
        .sign(Some("k1"), &TestTokenBuilder::new().build())
        .unwrap();
    let secondary_token = SECONDARY
        .sign(Some("k2"), &TestTokenBuilder::new().build())
        .unwrap();

    assert!(validator.validate(&primary_token).await.is_ok());
    assert!(validator.validate(&secondary_token).await.is_ok());
}

#[tokio::test]
async fn test_key_with_only_rsa_components_verifies() {
    let jwks = MockJwks::start(jwks_json(vec![
        PRIMARY.jwk_json_without_certificate("k1")
    ]))
    .await;
    let token = PRIMARY
        .sign(Some("k1"), &TestTokenBuilder::new().build())
        .unwrap();

    assert!(validator(&jwks).validate(&token).await.is_ok());
}

#[tokio::test]
async fn test_duplicate_kid_uses_first_key() {
    let jwks = MockJwks::start(jwks_json(vec![
        PRIMARY.jwk_json("dup"),
        SECONDARY.jwk_json("dup"),
    ]))
    .await;
    let validator = validator(&jwks);

    let first = PRIMARY
        .sign(Some("dup"), &TestTokenBuilder::new().build())
        .unwrap();
    let second = SECONDARY
        .sign(Some("dup"), &TestTokenBuilder::new().build())
        .unwrap();

    assert!(validator.validate(&first).await.is_ok());
    assert_eq!(
        validator.validate(&second).await.err(),
        Some(AuthError::SignatureInvalid)
    );
}

#[tokio::test]
async fn test_token_without_time_claims_accepted() {
    let jwks = primary_key_set().await;
    let token = PRIMARY
        .sign(
            Some("k1"),
            &TestTokenBuilder::new().without_time_claims().build(),
        )
        .unwrap();

    assert!(validator(&jwks).validate(&token).await.is_ok());
}

#[tokio::test]
async fn test_iat_within_clock_skew_accepted() {
    let jwks = primary_key_set().await;
    let claims = TestTokenBuilder::new()
        .issued_at(Utc::now().timestamp() + 60)
        .build();
    let token = PRIMARY.sign(Some("k1"), &claims).unwrap();

    assert!(validator(&jwks).validate(&token).await.is_ok());
}

#[tokio::test]
async fn test_fractional_time_claims_accepted_unchanged() {
    let jwks = primary_key_set().await;
    let now = Utc::now().timestamp() as f64;
    let claims = json!({
        "iss": TEST_ISSUER,
        "aud": TEST_AUDIENCE,
        "iat": now - 0.5,
        "exp": now + 3600.25
    });
    let token = PRIMARY.sign(Some("k1"), &claims).unwrap();

    let verified = validator(&jwks).validate(&token).await.unwrap();

    assert_eq!(serde_json::to_value(&verified).unwrap(), claims);
}

#[tokio::test]
async fn test_key_set_fetched_on_every_validation() {
    let jwks = primary_key_set().await;
    let validator = validator(&jwks);
    let token = PRIMARY
        .sign(Some("k1"), &TestTokenBuilder::new().build())
        .unwrap();

    validator.validate(&token).await.unwrap();
    validator.validate(&token).await.unwrap();

    assert_eq!(jwks.request_count().await, 2);
}

// ============================================================================
// Claim rejections
// ============================================================================

#[tokio::test]
async fn test_wrong_audience_rejected_even_with_valid_signature() {
    let jwks = primary_key_set().await;
    let token = PRIMARY
        .sign(
            Some("k1"),
            &TestTokenBuilder::new()
                .with_audience("https://other.example")
                .build(),
        )
        .unwrap();

    assert_eq!(
        validator(&jwks).validate(&token).await.err(),
        Some(AuthError::InvalidAudience)
    );
}

#[tokio::test]
async fn test_wrong_audience_rejected_with_invalid_signature() {
    let jwks = primary_key_set().await;
    let token = SECONDARY
        .sign(
            Some("k1"),
            &TestTokenBuilder::new()
                .with_audience("https://other.example")
                .build(),
        )
        .unwrap();

    assert_eq!(
        validator(&jwks).validate(&token).await.err(),
        Some(AuthError::InvalidAudience)
    );
    assert_eq!(jwks.request_count().await, 0);
}

#[tokio::test]
async fn test_missing_audience_rejected() {
    let jwks = primary_key_set().await;
    let token = PRIMARY
        .sign(Some("k1"), &TestTokenBuilder::new().without_audience().build())
        .unwrap();

    assert_eq!(
        validator(&jwks).validate(&token).await.err(),
        Some(AuthError::InvalidAudience)
    );
}

#[tokio::test]
async fn test_wrong_issuer_rejected() {
    let jwks = primary_key_set().await;
    let validator = validator(&jwks);

    for issuer in ["https://evil.example/", "https://issuer.example"] {
        let token = PRIMARY
            .sign(
                Some("k1"),
                &TestTokenBuilder::new().with_issuer(issuer).build(),
            )
            .unwrap();

        assert_eq!(
            validator.validate(&token).await.err(),
            Some(AuthError::InvalidIssuer),
            "issuer {issuer}"
        );
    }
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let jwks = primary_key_set().await;
    let token = PRIMARY
        .sign(Some("k1"), &TestTokenBuilder::new().expires_in(-120).build())
        .unwrap();

    assert_eq!(
        validator(&jwks).validate(&token).await.err(),
        Some(AuthError::TokenExpired)
    );
}

#[tokio::test]
async fn test_not_yet_valid_token_rejected() {
    let jwks = primary_key_set().await;
    let token = PRIMARY
        .sign(
            Some("k1"),
            &TestTokenBuilder::new().not_before_in(600).build(),
        )
        .unwrap();

    assert_eq!(
        validator(&jwks).validate(&token).await.err(),
        Some(AuthError::TokenNotYetValid)
    );
}

#[tokio::test]
async fn test_fractional_expiry_in_the_past_rejected() {
    let jwks = primary_key_set().await;
    let now = Utc::now().timestamp() as f64;
    let claims = json!({
        "iss": TEST_ISSUER,
        "aud": TEST_AUDIENCE,
        "exp": now - 60.5
    });
    let token = PRIMARY.sign(Some("k1"), &claims).unwrap();

    assert_eq!(
        validator(&jwks).validate(&token).await.err(),
        Some(AuthError::TokenExpired)
    );
}

#[tokio::test]
async fn test_iat_beyond_clock_skew_rejected() {
    let jwks = primary_key_set().await;
    let claims = TestTokenBuilder::new()
        .issued_at(Utc::now().timestamp() + 3600)
        .expires_in(7200)
        .build();
    let token = PRIMARY.sign(Some("k1"), &claims).unwrap();

    assert_eq!(
        validator(&jwks).validate(&token).await.err(),
        Some(AuthError::TokenNotYetValid)
    );
}

// ============================================================================
// Key and signature rejections
// ============================================================================

#[tokio::test]
async fn test_unknown_kid_rejected() {
    let jwks = primary_key_set().await;
    let token = PRIMARY
        .sign(Some("k9"), &TestTokenBuilder::new().build())
        .unwrap();

    assert_eq!(
        validator(&jwks).validate(&token).await.err(),
        Some(AuthError::KeyNotFound)
    );
}

#[tokio::test]
async fn test_missing_kid_rejected_without_fetch() {
    let jwks = primary_key_set().await;
    let token = PRIMARY
        .sign(None, &TestTokenBuilder::new().build())
        .unwrap();

    assert_eq!(
        validator(&jwks).validate(&token).await.err(),
        Some(AuthError::KeyNotFound)
    );
    assert_eq!(jwks.request_count().await, 0);
}

#[tokio::test]
async fn test_tampered_payload_rejected() {
    let jwks = primary_key_set().await;
    let token = PRIMARY
        .sign(
            Some("k1"),
            &TestTokenBuilder::new().for_user("auth0|alice").build(),
        )
        .unwrap();
    let tampered = with_payload(
        &token,
        &TestTokenBuilder::new().for_user("auth0|mallory").build(),
    );

    assert_eq!(
        validator(&jwks).validate(&tampered).await.err(),
        Some(AuthError::SignatureInvalid)
    );
}

#[tokio::test]
async fn test_token_signed_by_other_key_rejected() {
    let jwks = primary_key_set().await;
    let token = SECONDARY
        .sign(Some("k1"), &TestTokenBuilder::new().build())
        .unwrap();

    assert_eq!(
        validator(&jwks).validate(&token).await.err(),
        Some(AuthError::SignatureInvalid)
    );
}

#[tokio::test]
async fn test_malformed_certificate_rejected() {
    let mut jwk = PRIMARY.jwk_json("k1");
    jwk["x5c"] = json!(["bm90IGEgY2VydGlmaWNhdGU="]);
    let jwks = MockJwks::start(jwks_json(vec![jwk])).await;
    let token = PRIMARY
        .sign(Some("k1"), &TestTokenBuilder::new().build())
        .unwrap();

    assert_eq!(
        validator(&jwks).validate(&token).await.err(),
        Some(AuthError::KeyMaterialInvalid)
    );
}

#[tokio::test]
async fn test_key_without_material_rejected() {
    let jwks = MockJwks::start(jwks_json(vec![json!({"kty": "RSA", "kid": "k1"})])).await;
    let token = PRIMARY
        .sign(Some("k1"), &TestTokenBuilder::new().build())
        .unwrap();

    assert_eq!(
        validator(&jwks).validate(&token).await.err(),
        Some(AuthError::KeyMaterialInvalid)
    );
}

// ============================================================================
// Token format rejections
// ============================================================================

#[tokio::test]
async fn test_oversized_token_rejected_without_fetch() {
    let jwks = primary_key_set().await;
    let claims = TestTokenBuilder::new()
        .with_claim("padding", json!("x".repeat(9000)))
        .build();
    let token = PRIMARY.sign(Some("k1"), &claims).unwrap();

    assert_eq!(
        validator(&jwks).validate(&token).await.err(),
        Some(AuthError::MalformedToken)
    );
    assert_eq!(jwks.request_count().await, 0);
}

#[tokio::test]
async fn test_structurally_invalid_tokens_rejected() {
    let jwks = primary_key_set().await;
    let validator = validator(&jwks);

    for token in ["", "not-a-jwt", "a.b", "eyJhbGciOiJSUzI1NiJ9.e30", "a.b.c.d"] {
        assert_eq!(
            validator.validate(token).await.err(),
            Some(AuthError::MalformedToken),
            "token {token:?}"
        );
    }
}

// ============================================================================
// Key set availability
// ============================================================================

#[tokio::test]
async fn test_key_set_error_status_is_unavailable() {
    let token = PRIMARY
        .sign(Some("k1"), &TestTokenBuilder::new().build())
        .unwrap();

    for status in [404, 500, 503] {
        let jwks = MockJwks::start_with_status(status).await;
        assert_eq!(
            validator(&jwks).validate(&token).await.err(),
            Some(AuthError::KeySetUnavailable),
            "status {status}"
        );
    }
}

#[tokio::test]
async fn test_key_set_malformed_json_is_unavailable() {
    let token = PRIMARY
        .sign(Some("k1"), &TestTokenBuilder::new().build())
        .unwrap();

    for body in ["{not json", "[]", "{\"keys\": \"k1\"}"] {
        let jwks = MockJwks::start_with_body(body).await;
        assert_eq!(
            validator(&jwks).validate(&token).await.err(),
            Some(AuthError::KeySetUnavailable),
            "body {body}"
        );
    }
}

#[tokio::test]
async fn test_slow_key_set_is_unavailable() {
    let jwks = MockJwks::start_delayed(
        jwks_json(vec![PRIMARY.jwk_json("k1")]),
        Duration::from_secs(3),
    )
    .await;
    let token = PRIMARY
        .sign(Some("k1"), &TestTokenBuilder::new().build())
        .unwrap();

    let result = validator_for(&jwks, Duration::from_millis(200))
        .validate(&token)
        .await;

    assert_eq!(result.err(), Some(AuthError::KeySetUnavailable));
}
