//! Robot server configuration.
//!
//! Configuration is loaded from environment variables. The identity provider
//! settings (JWKS URL, issuer, audience) have no defaults and must be set.

use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:10333";

/// Default directory holding the front-end build output.
pub const DEFAULT_STATIC_DIR: &str = "../build";

/// Default path prefix under which the front-end is served.
pub const DEFAULT_URL_PREFIX: &str = "/robot";

/// Default JWKS fetch timeout in seconds.
pub const DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 5;

/// Maximum JWKS fetch timeout in seconds.
pub const MAX_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 30;

/// Robot server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:10333").
    pub bind_address: String,

    /// Directory with `index.html` and a `static/` subdirectory.
    pub static_dir: PathBuf,

    /// Path prefix for the front-end (default: "/robot").
    pub url_prefix: String,

    /// URL of the identity provider's JWKS document.
    pub jwks_url: String,

    /// Expected `iss` claim, compared exactly.
    pub issuer: String,

    /// Expected `aud` claim value.
    pub audience: String,

    /// Token signing algorithm. Only RS256 is supported.
    pub jwt_algorithm: Algorithm,

    /// Timeout for one JWKS fetch, in seconds.
    pub jwks_fetch_timeout_seconds: u64,

    /// JWT clock skew tolerance in seconds for iat validation.
    pub jwt_clock_skew_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWKS URL: {0}")]
    InvalidJwksUrl(String),

    #[error("Invalid URL prefix: {0}")]
    InvalidUrlPrefix(String),

    #[error("Unsupported JWT algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid JWKS fetch timeout configuration: {0}")]
    InvalidJwksFetchTimeout(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let required = |name: &str| {
            vars.get(name)
                .filter(|value| !value.trim().is_empty())
                .cloned()
                .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
        };

        let jwks_url = required("AUTH_JWKS_URL")?;
        if !(jwks_url.starts_with("https://") || jwks_url.starts_with("http://")) {
            return Err(ConfigError::InvalidJwksUrl(format!(
                "AUTH_JWKS_URL must be an http(s) URL, got '{}'",
                jwks_url
            )));
        }

        let issuer = required("AUTH_ISSUER")?;
        let audience = required("AUTH_AUDIENCE")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let static_dir = PathBuf::from(
            vars.get("STATIC_DIR")
                .map(String::as_str)
                .unwrap_or(DEFAULT_STATIC_DIR),
        );

        let url_prefix = vars
            .get("URL_PREFIX")
            .cloned()
            .unwrap_or_else(|| DEFAULT_URL_PREFIX.to_string());
        if !url_prefix.starts_with('/') || url_prefix.len() < 2 || url_prefix.ends_with('/') {
            return Err(ConfigError::InvalidUrlPrefix(format!(
                "URL_PREFIX must start with '/', be non-root and have no trailing '/', got '{}'",
                url_prefix
            )));
        }

        let jwt_algorithm = match vars.get("JWT_ALGORITHM") {
            Some(name) => match Algorithm::from_str(name) {
                Ok(Algorithm::RS256) => Algorithm::RS256,
                _ => return Err(ConfigError::UnsupportedAlgorithm(name.clone())),
            },
            None => Algorithm::RS256,
        };

        // Parse JWKS fetch timeout with validation
        let jwks_fetch_timeout_seconds = parse_bounded_seconds(
            vars,
            "JWKS_FETCH_TIMEOUT_SECONDS",
            DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS,
            MAX_JWKS_FETCH_TIMEOUT_SECONDS,
        )
        .map_err(ConfigError::InvalidJwksFetchTimeout)?;

        // Parse JWT clock skew tolerance with validation
        let jwt_clock_skew_seconds = parse_bounded_seconds(
            vars,
            "JWT_CLOCK_SKEW_SECONDS",
            DEFAULT_CLOCK_SKEW.as_secs(),
            MAX_CLOCK_SKEW.as_secs(),
        )
        .map_err(ConfigError::InvalidJwtClockSkew)?;

        Ok(Config {
            bind_address,
            static_dir,
            url_prefix,
            jwks_url,
            issuer,
            audience,
            jwt_algorithm,
            jwks_fetch_timeout_seconds,
            jwt_clock_skew_seconds,
        })
    }
}

/// Parse a positive number of seconds no larger than `max`.
fn parse_bounded_seconds(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
    max: u64,
) -> Result<u64, String> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: i64 = value_str.parse().map_err(|e| {
        format!(
            "{} must be a valid integer, got '{}': {}",
            name, value_str, e
        )
    })?;

    if value <= 0 {
        return Err(format!("{} must be positive, got {}", name, value));
    }

    let value = value.unsigned_abs();
    if value > max {
        return Err(format!(
            "{} must not exceed {} seconds, got {}",
            name, max, value
        ));
    }

    Ok(value)
}
