//! Authentication middleware for protected routes.
//!
//! Extracts the Bearer token from the Authorization header, validates it
//! against the identity provider's JWKS, and injects the verified claims into
//! request extensions.

use crate::auth::TokenValidator;
use crate::errors::{ApiError, AuthError};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Token validator with its JWKS client.
    pub validator: Arc<TokenValidator>,
}

/// Authentication middleware that validates bearer tokens.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// - 401 Unauthorized with `WWW-Authenticate` if the token is missing or invalid
/// - 503 Service Unavailable if the key set cannot be fetched
/// - Otherwise continues to the handler with `Claims` in extensions
#[instrument(skip_all, name = "robot.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "robot.middleware.auth", "Missing Authorization header");
            ApiError::Unauthorized(AuthError::MissingCredentials)
        })?;

    // Auth scheme names are case-insensitive (RFC 7235 2.1)
    let token = auth_header
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
        .map(|(_, token)| token)
        .ok_or_else(|| {
            tracing::debug!(target: "robot.middleware.auth", "Invalid Authorization header format");
            ApiError::Unauthorized(AuthError::MissingCredentials)
        })?;

    let claims = state.validator.validate(token.trim()).await?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
