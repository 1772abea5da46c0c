//! HTTP request handlers for the robot server.

pub mod health;
pub mod metrics;
pub mod tasks;

pub use health::health_check;
pub use metrics::metrics_handler;
pub use tasks::list_tasks;

use crate::errors::ApiError;

/// Fallback for paths no route matches.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Resource not found".to_string())
}
