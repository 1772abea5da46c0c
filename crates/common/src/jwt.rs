//! JWT format utilities shared by the robot server and its test utilities.
//!
//! This module provides the signature-independent half of token handling:
//! - Size limits for DoS prevention
//! - Clock skew constants for iat validation
//! - Unverified decoding of the header and claim set
//! - Key ID lookup on the decoded header
//! - iat validation logic
//! - Wrapping of JWKS `x5c` certificate material in PEM delimiters
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Nothing decoded here is trusted until the signature is verified
//! - Error messages are generic to prevent information leakage
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{decode_unverified, wrap_certificate_pem};
//!
//! let unverified: UnverifiedToken<MyClaims> = decode_unverified(token)?;
//! // check iss/aud on unverified.claims, look up unverified.header.kid ...
//! let pem = wrap_certificate_pem(&jwk.x5c[0]);
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this size are rejected BEFORE any base64 decoding,
/// JSON parsing or network activity.
///
/// Typical identity-provider access tokens are 700-1500 bytes (RS256
/// signature plus a handful of claims), so 8KB leaves generous room.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default JWT clock skew tolerance (5 minutes per NIST SP 800-63B).
///
/// Tokens with `iat` (issued-at) timestamps more than this amount in the
/// future are rejected.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Maximum allowed JWT clock skew tolerance (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Opening delimiter of a PEM encoded X.509 certificate.
pub const PEM_CERTIFICATE_BEGIN: &str = "-----BEGIN CERTIFICATE-----";

/// Closing delimiter of a PEM encoded X.509 certificate.
pub const PEM_CERTIFICATE_END: &str = "-----END CERTIFICATE-----";

/// Line width of the base64 body in PEM output (RFC 7468).
const PEM_LINE_WIDTH: usize = 64;

// =============================================================================
// Error Types
// =============================================================================

/// Errors produced while inspecting a token before signature verification.
///
/// Display strings are intentionally generic. Detailed information is
/// logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token `iat` claim is too far in the future.
    #[error("The access token is invalid or expired")]
    IatTooFarInFuture,
}

// =============================================================================
// Token Types
// =============================================================================

/// The JOSE header fields this crate cares about.
///
/// Unknown header parameters are ignored. A `kid` that is present but not a
/// string is treated as malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    /// Signing algorithm declared by the token (e.g. "RS256").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key ID used to select the verification key from a JWKS.
    #[serde(default)]
    pub kid: Option<String>,

    /// Media type, usually "JWT".
    #[serde(default)]
    pub typ: Option<String>,
}

impl TokenHeader {
    /// Returns the key ID if present and non-empty.
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.kid.as_deref().filter(|kid| !kid.is_empty())
    }
}

/// A token decoded WITHOUT signature verification.
///
/// The contents must only be used to decide whether verification is worth
/// attempting (claim pre-checks, key lookup). They are never authoritative.
#[derive(Debug, Clone)]
pub struct UnverifiedToken<C> {
    /// Decoded header.
    pub header: TokenHeader,

    /// Decoded claim set.
    pub claims: C,
}

// =============================================================================
// Functions
// =============================================================================

/// Decode the header and claims of a JWT without verifying the signature.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing (denial-of-service prevention)
/// - This function does NOT validate the token signature
/// - The token MUST still be verified before any claim is trusted
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Wrong segment count, bad base64url, or the header or
///   payload is not JSON of the expected shape
pub fn decode_unverified<C: DeserializeOwned>(
    token: &str,
) -> Result<UnverifiedToken<C>, JwtValidationError> {
    let (header_part, payload_part) = split_token(token)?;

    let header: TokenHeader = decode_segment(header_part, "header")?;
    let claims: C = decode_segment(payload_part, "payload")?;

    Ok(UnverifiedToken { header, claims })
}

/// Size-check a token and return its header and payload segments.
fn split_token(token: &str) -> Result<(&str, &str), JwtValidationError> {
    // Check token size first (DoS prevention)
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(_signature), None)
            if !header.is_empty() && !payload.is_empty() =>
        {
            Ok((header, payload))
        }
        _ => {
            tracing::debug!(
                target: "common.jwt",
                parts = token.split('.').count(),
                "Token rejected: invalid JWT format"
            );
            Err(JwtValidationError::MalformedToken)
        }
    }
}

fn decode_segment<T: DeserializeOwned>(
    segment: &str,
    name: &'static str,
) -> Result<T, JwtValidationError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", segment = name, error = %e, "Failed to decode JWT base64");
        JwtValidationError::MalformedToken
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", segment = name, error = %e, "Failed to parse JWT JSON");
        JwtValidationError::MalformedToken
    })
}

/// Validate the `iat` (issued-at) claim with clock skew tolerance.
///
/// Rejects tokens with `iat` too far in the future, which could indicate
/// token pre-generation or clock synchronization issues.
///
/// # Errors
///
/// Returns `JwtValidationError::IatTooFarInFuture` if the iat timestamp is more than
/// `clock_skew` in the future.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    let now = chrono::Utc::now().timestamp();
    validate_iat_at(iat, clock_skew, now)
}

/// Deterministic `iat` validation against an explicit `now` timestamp.
///
/// Prefer [`validate_iat`] in production code.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtValidationError> {
    // Safe cast: clock_skew is bounded to MAX_CLOCK_SKEW (600 seconds), well within i64 range
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;
    let max_iat = now.saturating_add(clock_skew_secs);

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            clock_skew_secs = clock_skew_secs,
            "Token rejected: iat too far in the future"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }

    Ok(())
}

/// Wrap a base64 DER certificate (a JWKS `x5c` entry) in PEM delimiters.
///
/// Whitespace in the input is dropped and the body is folded at 64 columns
/// so the result is accepted by strict PEM parsers.
///
/// # Example
///
/// ```rust,ignore
/// let pem = wrap_certificate_pem("MIIC+zCCAeOgAwIBAgIJ...");
/// let key = DecodingKey::from_rsa_pem(pem.as_bytes())?;
/// ```
#[must_use]
pub fn wrap_certificate_pem(der_b64: &str) -> String {
    let body: Vec<char> = der_b64.chars().filter(|c| !c.is_whitespace()).collect();

    let mut pem = String::with_capacity(
        PEM_CERTIFICATE_BEGIN.len() + PEM_CERTIFICATE_END.len() + body.len() * 65 / 64 + 4,
    );
    pem.push_str(PEM_CERTIFICATE_BEGIN);
    pem.push('\n');
    for line in body.chunks(PEM_LINE_WIDTH) {
        pem.extend(line);
        pem.push('\n');
    }
    pem.push_str(PEM_CERTIFICATE_END);
    pem
}

// =============================================================================
// Tests
// =============================================================================
