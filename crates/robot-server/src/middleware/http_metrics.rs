//! HTTP metrics middleware for capturing all request/response metrics
//!
//! This middleware captures metrics for ALL HTTP responses including
//! framework-level errors that occur before handlers run (404, 405,
//! authentication rejections).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use crate::observability::metrics::record_http_request;
use crate::routes::AppState;

/// Middleware that records HTTP request metrics for all responses
///
/// Applied as the outermost layer. Paths under the static prefix are
/// normalized with the configured URL prefix.
pub async fn http_metrics_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status_code = response.status().as_u16();
    record_http_request(
        &method,
        &path,
        &state.config.url_prefix,
        status_code,
        duration,
    );

    response
}
