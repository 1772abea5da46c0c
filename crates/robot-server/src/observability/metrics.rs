//! Metrics definitions for the robot server.
//!
//! All metrics follow Prometheus naming conventions:
//! - `robot_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: a handful of values (static assets collapse to one label)
//! - `status`: 3 values (success, error, timeout)
//! - `outcome`: `success` or an `AuthError::kind()` value

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // HTTP request buckets
        .set_buckets_for_metric(
            Matcher::Prefix("robot_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Token validation includes one JWKS round trip
        .set_buckets_for_metric(
            Matcher::Prefix("robot_token_validation".to_string()),
            &[
                0.001, 0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set token validation buckets: {e}"))?
        // JWKS fetch is bounded by the configured fetch timeout (max 30s)
        .set_buckets_for_metric(
            Matcher::Prefix("robot_jwks_fetch".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.500, 5.000, 10.000, 30.000,
            ],
        )
        .map_err(|e| format!("Failed to set JWKS fetch buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `robot_http_requests_total`, `robot_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(
    method: &str,
    endpoint: &str,
    url_prefix: &str,
    status_code: u16,
    duration: Duration,
) {
    let normalized_endpoint = normalize_endpoint(endpoint, url_prefix);
    let status = categorize_status_code(status_code);

    histogram!("robot_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("robot_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=399 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
///
/// Every file under the static prefix shares one label.
fn normalize_endpoint(path: &str, url_prefix: &str) -> &'static str {
    match path {
        "/tasks" => "/tasks",
        "/health" => "/health",
        "/metrics" => "/metrics",
        _ => {
            let Some(rest) = path.strip_prefix(url_prefix) else {
                return "/other";
            };
            if rest.is_empty() || rest == "/" {
                "/{prefix}"
            } else if rest.starts_with("/static/") {
                "/{prefix}/static/{file}"
            } else {
                "/other"
            }
        }
    }
}

// ============================================================================
// Token Validation Metrics
// ============================================================================

/// Record a bearer token validation
///
/// Metric: `robot_token_validations_total`, `robot_token_validation_duration_seconds`
/// Labels: `outcome` (`success` or the `AuthError::kind()` of the failure)
pub fn record_token_validation(outcome: &'static str, duration: Duration) {
    histogram!("robot_token_validation_duration_seconds").record(duration.as_secs_f64());

    counter!("robot_token_validations_total",
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a JWKS fetch from the identity provider
///
/// Metric: `robot_jwks_fetch_total`, `robot_jwks_fetch_duration_seconds`
/// Labels: `status` (success, error, timeout)
pub fn record_jwks_fetch(status: &'static str, duration: Duration) {
    histogram!("robot_jwks_fetch_duration_seconds",
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("robot_jwks_fetch_total",
        "status" => status
    )
    .increment(1);
}

// ============================================================================
// Tests
// ============================================================================
