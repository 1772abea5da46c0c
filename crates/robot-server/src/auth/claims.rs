//! JWT claims structure.
//!
//! Typed view over the claim set of a bearer token. Registered claims used by
//! validation get their own fields; every other claim is preserved verbatim
//! in `extra` so a verified claim set can be handed back unchanged.
//!
//! The `sub` field is redacted in Debug output to prevent exposure in logs.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// The `aud` claim: a single audience or a list of audiences (RFC 7519 4.1.3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    /// All audiences, in claim order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Audience::Single(aud) => vec![aud.as_str()],
            Audience::Multiple(auds) => auds.iter().map(String::as_str).collect(),
        }
    }
}

/// Claim set of a bearer token.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience(s) the token was minted for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Subject (user identifier) - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration time (RFC 7519 NumericDate, may be fractional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<Number>,

    /// Not-before time (RFC 7519 NumericDate, may be fractional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<Number>,

    /// Issued-at time (RFC 7519 NumericDate, may be fractional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<Number>,

    /// Application claims (scope, permissions, namespaced provider claims...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Custom Debug implementation that redacts the `sub` field and only lists
/// the names of application claims.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("sub", &self.sub.as_ref().map(|_| "[REDACTED]"))
            .field("exp", &self.exp)
            .field("nbf", &self.nbf)
            .field("iat", &self.iat)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Claims {
    /// The `iss` claim, if present.
    pub fn issuer(&self) -> Option<&str> {
        self.iss.as_deref()
    }

    /// The `sub` claim, if present.
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    /// Every audience listed in the `aud` claim. Empty if absent.
    pub fn audiences(&self) -> Vec<&str> {
        self.aud.as_ref().map(Audience::values).unwrap_or_default()
    }

    /// Returns true if the `aud` claim equals or contains `audience`.
    ///
    /// A token without an `aud` claim has no audience.
    pub fn has_audience(&self, audience: &str) -> bool {
        self.audiences().contains(&audience)
    }

    /// The `iat` claim in whole seconds, rounded up.
    pub fn issued_at(&self) -> Option<i64> {
        self.iat.as_ref().and_then(whole_seconds_ceil)
    }

    /// Raw value of an application claim.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Application claim deserialized into `T`.
    ///
    /// Returns `None` if the claim is absent or does not have the shape of `T`.
    pub fn custom<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.claim(name).and_then(|value| T::deserialize(value).ok())
    }
}

/// Fractional seconds round up so a bound like "not after now + skew" is
/// never loosened.
#[allow(clippy::cast_possible_truncation)]
fn whole_seconds_ceil(value: &Number) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|secs| secs.is_finite())
            .map(|secs| secs.ceil() as i64)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims_from(value: Value) -> Claims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_claims_debug_redacts_sub() {
        let claims = claims_from(json!({
            "iss": "https://issuer.example/",
            "sub": "auth0|secret-user-id",
            "email": "someone@example.com"
        }));

        let debug_str = format!("{:?}", claims);

        assert!(!debug_str.contains("secret-user-id"));
        assert!(!debug_str.contains("someone@example.com"));
        assert!(debug_str.contains("[REDACTED]"));
        assert!(debug_str.contains("https://issuer.example/"));
    }

    #[test]
    fn test_single_audience() {
        let claims = claims_from(json!({"aud": "https://api.example"}));

        assert!(claims.has_audience("https://api.example"));
        assert!(!claims.has_audience("https://other.example"));
        assert_eq!(claims.audiences(), vec!["https://api.example"]);
    }

    #[test]
    fn test_multiple_audiences() {
        let claims = claims_from(json!({
            "aud": ["https://api.example", "https://issuer.example/userinfo"]
        }));

        assert!(claims.has_audience("https://api.example"));
        assert!(claims.has_audience("https://issuer.example/userinfo"));
        assert!(!claims.has_audience("https://other.example"));
        assert_eq!(claims.audiences().len(), 2);
    }

    #[test]
    fn test_missing_audience() {
        let claims = claims_from(json!({"iss": "https://issuer.example/"}));

        assert!(!claims.has_audience("https://api.example"));
        assert!(claims.audiences().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_unknown_claims() {
        let original = json!({
            "iss": "https://issuer.example/",
            "aud": ["https://api.example"],
            "sub": "user-1",
            "exp": 1_900_000_000,
            "iat": 1_700_000_000,
            "scope": "openid profile",
            "https://robot.example/roles": ["admin"],
            "nested": {"a": 1}
        });

        let claims = claims_from(original.clone());
        let back = serde_json::to_value(&claims).unwrap();

        assert_eq!(back, original);
    }

    #[test]
    fn test_custom_claim_accessors() {
        let claims = claims_from(json!({
            "scope": "read:tasks write:tasks",
            "https://robot.example/roles": ["admin", "viewer"],
            "level": 3
        }));

        assert_eq!(
            claims.custom::<String>("scope").as_deref(),
            Some("read:tasks write:tasks")
        );
        assert_eq!(
            claims.custom::<Vec<String>>("https://robot.example/roles"),
            Some(vec!["admin".to_string(), "viewer".to_string()])
        );
        assert_eq!(claims.custom::<u32>("level"), Some(3));
        assert_eq!(claims.custom::<String>("level"), None);
        assert!(claims.claim("missing").is_none());
    }

    #[test]
    fn test_registered_claims_are_not_in_extra() {
        let claims = claims_from(json!({
            "iss": "i", "aud": "a", "sub": "s", "exp": 1, "nbf": 2, "iat": 3
        }));

        assert!(claims.extra.is_empty());
        assert_eq!(claims.issuer(), Some("i"));
        assert_eq!(claims.subject(), Some("s"));
        assert_eq!(claims.nbf, Some(Number::from(2)));
        assert_eq!(claims.issued_at(), Some(3));
    }

    #[test]
    fn test_fractional_time_claims_are_kept_verbatim() {
        let original = json!({
            "iss": "https://issuer.example/",
            "exp": 1_900_000_000.25,
            "nbf": 1_699_999_999.5,
            "iat": 1_700_000_000.5
        });

        let claims = claims_from(original.clone());

        assert_eq!(claims.issued_at(), Some(1_700_000_001));
        assert_eq!(serde_json::to_value(&claims).unwrap(), original);
    }

    #[test]
    fn test_issued_at_absent() {
        let claims = claims_from(json!({"iss": "https://issuer.example/"}));
        assert_eq!(claims.issued_at(), None);
    }
}
