//! Builder patterns for test data construction
//!
//! Provides a fluent API for creating token claim sets.

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

/// Issuer the test server is configured to expect.
pub const TEST_ISSUER: &str = "https://issuer.example/";

/// Audience the test server is configured to expect.
pub const TEST_AUDIENCE: &str = "https://api.example";

/// Builder for creating test JWT claims
///
/// Defaults to a claim set the test server accepts: expected issuer and
/// audience, a subject, `iat` now and `exp` one hour out.
///
/// # Example
/// ```rust,ignore
/// let claims = TestTokenBuilder::new()
///     .for_user("auth0|alice")
///     .with_scope("read:tasks")
///     .expires_in(3600)
///     .build();
/// let token = PRIMARY.sign(Some("k1"), &claims)?;
/// ```
pub struct TestTokenBuilder {
    iss: Option<String>,
    aud: Option<Value>,
    sub: Option<String>,
    exp: Option<i64>,
    nbf: Option<i64>,
    iat: Option<i64>,
    extra: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            iss: Some(TEST_ISSUER.to_string()),
            aud: Some(Value::String(TEST_AUDIENCE.to_string())),
            sub: Some("test-subject".to_string()),
            exp: Some((now + Duration::seconds(3600)).timestamp()),
            nbf: None,
            iat: Some(now.timestamp()),
            extra: Map::new(),
        }
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = Some(subject.to_string());
        self
    }

    /// Set the issuer
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.iss = Some(issuer.to_string());
        self
    }

    /// Drop the issuer claim
    pub fn without_issuer(mut self) -> Self {
        self.iss = None;
        self
    }

    /// Set a single audience
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = Some(Value::String(audience.to_string()));
        self
    }

    /// Set an audience list
    pub fn with_audiences(mut self, audiences: &[&str]) -> Self {
        self.aud = Some(json!(audiences));
        self
    }

    /// Drop the audience claim
    pub fn without_audience(mut self) -> Self {
        self.aud = None;
        self
    }

    /// Set the scope (space-separated)
    pub fn with_scope(self, scope: &str) -> Self {
        self.with_claim("scope", json!(scope))
    }

    /// Add an arbitrary claim
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Set not-before in seconds from now
    pub fn not_before_in(mut self, seconds: i64) -> Self {
        self.nbf = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = Some(timestamp);
        self
    }

    /// Drop `exp`, `nbf` and `iat`
    pub fn without_time_claims(mut self) -> Self {
        self.exp = None;
        self.nbf = None;
        self.iat = None;
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        let mut claims = self.extra;
        let registered = [
            ("iss", self.iss.map(Value::String)),
            ("aud", self.aud),
            ("sub", self.sub.map(Value::String)),
            ("exp", self.exp.map(Value::from)),
            ("nbf", self.nbf.map(Value::from)),
            ("iat", self.iat.map(Value::from)),
        ];
        for (name, value) in registered {
            if let Some(value) = value {
                claims.insert(name.to_string(), value);
            }
        }
        Value::Object(claims)
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
