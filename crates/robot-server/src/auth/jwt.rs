//! Bearer token validation against the identity provider's JWKS.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Audience and issuer are checked before any network call
//! - The header algorithm is pinned to the configured one (RS256)
//! - Time claims are checked only when present; `iat` gets clock skew tolerance
//! - Failures are classified but never carry token or key material

use crate::auth::claims::Claims;
use crate::auth::jwks::JwksClient;
use crate::config::Config;
use crate::errors::AuthError;
use crate::observability::metrics::record_token_validation;
use common::jwt::{decode_unverified, validate_iat};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::collections::HashSet;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Static expectations a token is validated against.
#[derive(Debug, Clone)]
pub struct ValidatorSettings {
    /// Expected `iss` claim, compared exactly.
    pub issuer: String,

    /// Audience that `aud` must equal or contain.
    pub audience: String,

    /// Accepted signing algorithm.
    pub algorithm: Algorithm,

    /// Tolerance for `iat` in the future.
    pub clock_skew: Duration,
}

impl ValidatorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            algorithm: config.jwt_algorithm,
            clock_skew: Duration::from_secs(config.jwt_clock_skew_seconds),
        }
    }
}

/// Validates bearer tokens with keys from the configured JWKS endpoint.
///
/// Holds only static configuration and can be shared across requests.
pub struct TokenValidator {
    settings: ValidatorSettings,
    jwks_client: JwksClient,
}

impl TokenValidator {
    pub fn new(settings: ValidatorSettings, jwks_client: JwksClient) -> Self {
        Self {
            settings,
            jwks_client,
        }
    }

    /// Validate a bearer token and return its verified claim set.
    ///
    /// # Checks, in order
    ///
    /// 1. Size and structure, decoded without trusting the signature
    /// 2. Audience, then issuer, against the configured values
    /// 3. Header `kid` present and header `alg` equal to the configured algorithm
    /// 4. Key set fetched, first key with a matching `kid` selected
    /// 5. Public key reconstructed from `x5c[0]` (or `n`/`e`)
    /// 6. Signature verified, then `exp`, `nbf` and `iat` when present
    ///
    /// # Errors
    ///
    /// Returns the `AuthError` of the first check that fails.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let start = Instant::now();
        let result = self.validate_token(token).await;

        match &result {
            Ok(_) => {
                tracing::debug!(target: "robot.auth.jwt", "Token validated successfully");
                record_token_validation("success", start.elapsed());
            }
            Err(e) => {
                tracing::debug!(target: "robot.auth.jwt", reason = e.kind(), "Token rejected");
                record_token_validation(e.kind(), start.elapsed());
            }
        }

        result
    }

    async fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        // 1. Decode header and claims (includes size check via common::jwt)
        let unverified = decode_unverified::<Claims>(token).map_err(|e| {
            tracing::debug!(target: "robot.auth.jwt", error = ?e, "Token decoding failed");
            AuthError::MalformedToken
        })?;

        // 2. Claims that can be rejected without any key
        if !unverified.claims.has_audience(&self.settings.audience) {
            return Err(AuthError::InvalidAudience);
        }
        if unverified.claims.issuer() != Some(self.settings.issuer.as_str()) {
            return Err(AuthError::InvalidIssuer);
        }

        // 3. Header
        let kid = unverified.header.key_id().ok_or_else(|| {
            tracing::debug!(target: "robot.auth.jwt", "Token header has no kid");
            AuthError::KeyNotFound
        })?;
        let header_alg = unverified
            .header
            .alg
            .as_deref()
            .and_then(|alg| Algorithm::from_str(alg).ok());
        if header_alg != Some(self.settings.algorithm) {
            tracing::debug!(
                target: "robot.auth.jwt",
                alg = ?unverified.header.alg,
                "Token signed with unexpected algorithm"
            );
            return Err(AuthError::SignatureInvalid);
        }

        // 4. Key lookup
        let jwks = self.jwks_client.fetch_key_set().await?;
        let jwk = jwks.find_key(kid).ok_or_else(|| {
            tracing::debug!(
                target: "robot.auth.jwt",
                kid = %kid,
                key_count = jwks.keys.len(),
                "No key matches token kid"
            );
            AuthError::KeyNotFound
        })?;

        // 5. Key reconstruction
        let decoding_key = jwk.decoding_key()?;

        // 6. Signature and registered claims
        let claims = self.verify_signature(token, &decoding_key)?;

        if let Some(iat) = claims.issued_at() {
            if let Err(e) = validate_iat(iat, self.settings.clock_skew) {
                tracing::debug!(target: "robot.auth.jwt", error = ?e, "Token iat validation failed");
                return Err(AuthError::TokenNotYetValid);
            }
        }

        Ok(claims)
    }

    /// Verify the signature and let the verifier re-assert issuer, audience,
    /// `exp` and `nbf`.
    fn verify_signature(&self, token: &str, key: &DecodingKey) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.settings.algorithm);
        validation.set_issuer(&[self.settings.issuer.as_str()]);
        validation.set_audience(&[self.settings.audience.as_str()]);
        // exp and nbf are optional; checked only when present
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        decode::<Claims>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(target: "robot.auth.jwt", error = %e, "Token verification failed");
                classify_verification_error(e.kind())
            })
    }
}

fn classify_verification_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        ErrorKind::InvalidAudience => AuthError::InvalidAudience,
        ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
            "iss" => AuthError::InvalidIssuer,
            "aud" => AuthError::InvalidAudience,
            _ => AuthError::MalformedToken,
        },
        ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => AuthError::KeyMaterialInvalid,
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => AuthError::MalformedToken,
        _ => AuthError::SignatureInvalid,
    }
}
