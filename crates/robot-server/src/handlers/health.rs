//! Health check handler.

/// Liveness probe handler.
///
/// Returns "OK" to indicate the process is running. Does not check the
/// identity provider.
pub async fn health_check() -> &'static str {
    "OK"
}
