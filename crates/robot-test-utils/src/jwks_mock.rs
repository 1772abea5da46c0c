//! Mock JWKS endpoint backed by wiremock.

use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock serves the key set on.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Mock identity provider JWKS endpoint.
///
/// # Example
/// ```rust,ignore
/// let jwks = MockJwks::start(jwks_json(vec![PRIMARY.jwk_json("k1")])).await;
/// let client = JwksClient::new(jwks.url(), Duration::from_secs(5));
/// ```
pub struct MockJwks {
    server: MockServer,
}

impl MockJwks {
    /// Serve `jwks` as a 200 JSON response.
    pub async fn start(jwks: Value) -> Self {
        Self::start_with(ResponseTemplate::new(200).set_body_json(jwks)).await
    }

    /// Answer every key set request with `status` and an empty body.
    pub async fn start_with_status(status: u16) -> Self {
        Self::start_with(ResponseTemplate::new(status)).await
    }

    /// Answer with a raw (possibly invalid) body.
    pub async fn start_with_body(body: &str) -> Self {
        Self::start_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string(body),
        )
        .await
    }

    /// Serve `jwks` only after `delay`.
    pub async fn start_delayed(jwks: Value, delay: Duration) -> Self {
        Self::start_with(
            ResponseTemplate::new(200)
                .set_body_json(jwks)
                .set_delay(delay),
        )
        .await
    }

    /// Serve an arbitrary response template.
    pub async fn start_with(response: ResponseTemplate) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(response)
            .mount(&server)
            .await;
        Self { server }
    }

    /// Full URL of the key set endpoint.
    pub fn url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// Number of key set requests received so far.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}
