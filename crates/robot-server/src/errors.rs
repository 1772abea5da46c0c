//! Robot server error types.
//!
//! `AuthError` classifies why a bearer token was rejected. `ApiError` is the
//! handler-facing error and maps to HTTP status codes via `IntoResponse`.
//! Messages returned to clients are intentionally generic; actual causes are
//! logged server-side.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Value of the `WWW-Authenticate` header on 401 responses.
const WWW_AUTHENTICATE_VALUE: &str = "Bearer realm=\"robot\", error=\"invalid_token\"";

/// Reasons a bearer token fails validation.
///
/// Every variant is recoverable at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("bearer credentials are missing")]
    MissingCredentials,

    #[error("token is malformed")]
    MalformedToken,

    #[error("token audience does not match")]
    InvalidAudience,

    #[error("token issuer does not match")]
    InvalidIssuer,

    #[error("signing key set is unavailable")]
    KeySetUnavailable,

    #[error("no signing key matches the token key id")]
    KeyNotFound,

    #[error("signing key material is invalid")]
    KeyMaterialInvalid,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    TokenExpired,

    #[error("token is not yet valid")]
    TokenNotYetValid,
}

impl AuthError {
    /// Bounded label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::KeySetUnavailable => "key_set_unavailable",
            AuthError::KeyNotFound => "key_not_found",
            AuthError::KeyMaterialInvalid => "key_material_invalid",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
        }
    }
}

/// Robot server error type.
///
/// Maps to HTTP status codes:
/// - Unauthorized: 401 with empty body and `WWW-Authenticate` header
/// - NotFound: 404 Not Found
/// - ServiceUnavailable: 503 Service Unavailable
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(AuthError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// An unreachable or broken key-set endpoint is an outage, not a bad token.
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::KeySetUnavailable => {
                ApiError::ServiceUnavailable("Authentication provider unavailable".to_string())
            }
            other => ApiError::Unauthorized(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message) = match &self {
            ApiError::Unauthorized(reason) => {
                tracing::debug!(target: "robot.errors", reason = reason.kind(), "Rejecting request as unauthorized");
                let mut response = status.into_response();
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(WWW_AUTHENTICATE_VALUE),
                );
                return response;
            }
            ApiError::NotFound(resource) => ("NOT_FOUND", resource.clone()),
            ApiError::ServiceUnavailable(reason) => {
                // Log actual reason server-side
                tracing::warn!(target: "robot.availability", reason = %reason, "Service unavailable");
                (
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
