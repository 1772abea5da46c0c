//! HTTP routes for the robot server.
//!
//! Defines the Axum router and application state.

use crate::auth::{JwksClient, TokenValidator, ValidatorSettings};
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_auth, AuthState};
use axum::{http::Method, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe (simple "OK") - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/tasks` - Caller's tasks - requires authentication
/// - `{prefix}` and `{prefix}/` - Front-end `index.html`
/// - `{prefix}/static/*` - Front-end assets
/// - CORS for any origin (GET, POST, any header)
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let config = &state.config;

    // Create JWKS client and token validator
    let jwks_client = JwksClient::new(
        config.jwks_url.clone(),
        Duration::from_secs(config.jwks_fetch_timeout_seconds),
    );
    let validator = Arc::new(TokenValidator::new(
        ValidatorSettings::from_config(config),
        jwks_client,
    ));
    let auth_state = Arc::new(AuthState { validator });

    // Public routes (no authentication required)
    let public_routes = Router::new().route("/health", get(handlers::health_check));

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/tasks", get(handlers::list_tasks))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth));

    // Front-end build output
    let index = ServeFile::new(config.static_dir.join("index.html"));
    let static_routes = Router::new()
        .route_service(&config.url_prefix, index.clone())
        .route_service(&format!("{}/", config.url_prefix), index)
        .nest_service(
            &format!("{}/static", config.url_prefix),
            ServeDir::new(config.static_dir.join("static")),
        );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    // Merge routes and apply global middleware layers
    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. CorsLayer - Answer preflight requests, add CORS headers
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .merge(static_routes)
        .fallback(handlers::not_found)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            http_metrics_middleware,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
