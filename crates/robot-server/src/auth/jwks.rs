//! JWKS client for fetching the identity provider's public keys.
//!
//! The key set is fetched fresh on every validation call and discarded
//! afterwards; nothing is cached or shared between requests.
//!
//! # Security
//!
//! - Every fetch is bounded by an explicit timeout
//! - Certificate material is never logged
//! - HTTPS should be used in production (enforced by deployment config)

use crate::errors::AuthError;
use crate::observability::metrics::record_jwks_fetch;
use common::jwt::wrap_certificate_pem;
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::instrument;

/// JSON Web Key from the JWKS endpoint.
///
/// Every field is optional on the wire; a key without `kid` can never be
/// selected.
#[derive(Clone, Deserialize)]
pub struct Jwk {
    /// Key ID - used to select the correct key for verification.
    #[serde(default)]
    pub kid: String,

    /// Key type ("RSA" for RS256 keys).
    #[serde(default)]
    pub kty: String,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// Algorithm, if the provider publishes one.
    #[serde(default)]
    pub alg: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,

    /// X.509 certificate chain, each entry base64 (not url-safe) DER.
    #[serde(default)]
    pub x5c: Vec<String>,
}

/// Debug output lists how much certificate material is present, not the material.
impl fmt::Debug for Jwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jwk")
            .field("kid", &self.kid)
            .field("kty", &self.kty)
            .field("key_use", &self.key_use)
            .field("alg", &self.alg)
            .field("has_n", &self.n.is_some())
            .field("has_e", &self.e.is_some())
            .field("x5c_len", &self.x5c.len())
            .finish()
    }
}

impl Jwk {
    /// Reconstruct the RSA public key used to verify signatures.
    ///
    /// The leaf certificate (`x5c[0]`) is wrapped in PEM certificate
    /// delimiters and parsed. A key published without a certificate falls
    /// back to its `n`/`e` components.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyMaterialInvalid` if the key is not an RSA key,
    /// carries no usable material, or the material cannot be parsed.
    pub fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        if self.kty != "RSA" {
            tracing::warn!(target: "robot.auth.jwks", kid = %self.kid, kty = %self.kty, "Unexpected JWK key type");
            return Err(AuthError::KeyMaterialInvalid);
        }

        if let Some(certificate) = self.x5c.first() {
            let pem = wrap_certificate_pem(certificate);
            return DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
                tracing::error!(target: "robot.auth.jwks", kid = %self.kid, error = %e, "Invalid x5c certificate");
                AuthError::KeyMaterialInvalid
            });
        }

        match (self.n.as_deref(), self.e.as_deref()) {
            (Some(n), Some(e)) => DecodingKey::from_rsa_components(n, e).map_err(|err| {
                tracing::error!(target: "robot.auth.jwks", kid = %self.kid, error = %err, "Invalid RSA key components");
                AuthError::KeyMaterialInvalid
            }),
            _ => {
                tracing::error!(target: "robot.auth.jwks", kid = %self.kid, "JWK has neither x5c nor n/e");
                Err(AuthError::KeyMaterialInvalid)
            }
        }
    }
}

/// JWKS document from the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    /// List of JSON Web Keys, in provider order.
    pub keys: Vec<Jwk>,
}

impl JwksResponse {
    /// Find the key with the given ID.
    ///
    /// Key IDs are expected to be unique. If the provider publishes the same
    /// `kid` more than once, the first key in document order is used.
    pub fn find_key(&self, kid: &str) -> Option<&Jwk> {
        if kid.is_empty() {
            return None;
        }
        self.keys.iter().find(|key| key.kid == kid)
    }
}

/// JWKS client for fetching public keys.
///
/// Holds no key state; safe to share across request tasks.
pub struct JwksClient {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,

    /// Upper bound on one fetch (connect, headers and body).
    fetch_timeout: Duration,
}

impl JwksClient {
    /// Create a new JWKS client.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - URL to the identity provider's JWKS endpoint
    /// * `fetch_timeout` - Upper bound for a single fetch
    pub fn new(jwks_url: String, fetch_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "robot.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            fetch_timeout,
        }
    }

    /// Fetch the current key set.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeySetUnavailable` if the request fails or times
    /// out, the endpoint answers with a non-2xx status, or the body is not a
    /// JWKS document.
    #[instrument(skip_all)]
    pub async fn fetch_key_set(&self) -> Result<JwksResponse, AuthError> {
        let start = Instant::now();
        let result = self.fetch().await;

        let status = match &result {
            Ok(_) => "success",
            Err(FetchFailure::Timeout) => "timeout",
            Err(FetchFailure::Other) => "error",
        };
        record_jwks_fetch(status, start.elapsed());

        result.map_err(|_| AuthError::KeySetUnavailable)
    }

    async fn fetch(&self) -> Result<JwksResponse, FetchFailure> {
        tracing::debug!(target: "robot.auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        // Per-request timeout also covers a client built with defaults
        let response = self
            .http_client
            .get(&self.jwks_url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "robot.auth.jwks", error = %e, timeout = e.is_timeout(), "Failed to fetch JWKS");
                FetchFailure::from(&e)
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "robot.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(FetchFailure::Other);
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "robot.auth.jwks", error = %e, "Failed to parse JWKS response");
            FetchFailure::from(&e)
        })?;

        tracing::debug!(
            target: "robot.auth.jwks",
            key_count = jwks.keys.len(),
            "JWKS fetched"
        );

        Ok(jwks)
    }
}

/// Internal classification of a failed fetch, for metrics only.
enum FetchFailure {
    Timeout,
    Other,
}

impl From<&reqwest::Error> for FetchFailure {
    fn from(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchFailure::Timeout
        } else {
            FetchFailure::Other
        }
    }
}
