//! Test server harness for E2E testing
//!
//! Provides `TestRobotServer` for spawning real robot server instances in
//! tests, with a temporary front-end build directory.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use robot_server::config::Config;
use robot_server::observability::metrics::init_metrics_recorder;
use robot_server::routes::{self, AppState};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;
use tokio::task::JoinHandle;

use crate::token_builders::{TEST_AUDIENCE, TEST_ISSUER};

/// Contents of `index.html` in the temporary static directory.
pub const TEST_INDEX_HTML: &str = "<!doctype html><title>Robot</title><div id=\"root\"></div>";

/// Contents of `static/js/main.js` in the temporary static directory.
pub const TEST_MAIN_JS: &str = "console.log(\"robot\");";

/// URL prefix the test server serves the front-end under.
pub const TEST_URL_PREFIX: &str = "/robot";

static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics handle shared by every server spawned in this test process.
///
/// The global recorder can only be installed once; later callers get a
/// standalone handle if another recorder won.
pub fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the robot server in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() -> Result<(), anyhow::Error> {
///     let jwks = MockJwks::start(jwks_json(vec![])).await;
///     let server = TestRobotServer::spawn(&jwks.url()).await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestRobotServer {
    addr: SocketAddr,
    config: Config,
    static_dir: TempDir,
    _handle: JoinHandle<()>,
}

impl TestRobotServer {
    /// Spawn a server validating tokens against `jwks_url`.
    pub async fn spawn(jwks_url: &str) -> Result<Self, anyhow::Error> {
        Self::spawn_with(jwks_url, HashMap::new()).await
    }

    /// Spawn a server with extra environment overrides (e.g.
    /// `JWKS_FETCH_TIMEOUT_SECONDS`).
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Serve a temporary static directory with `index.html` and `static/js/main.js`
    /// - Start the HTTP server in the background
    pub async fn spawn_with(
        jwks_url: &str,
        overrides: HashMap<String, String>,
    ) -> Result<Self, anyhow::Error> {
        let static_dir = TempDir::new()?;
        write_static_files(static_dir.path())?;

        let mut vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            (
                "STATIC_DIR".to_string(),
                static_dir.path().display().to_string(),
            ),
            ("URL_PREFIX".to_string(), TEST_URL_PREFIX.to_string()),
            ("AUTH_JWKS_URL".to_string(), jwks_url.to_string()),
            ("AUTH_ISSUER".to_string(), TEST_ISSUER.to_string()),
            ("AUTH_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
        ]);
        vars.extend(overrides);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState {
            config: config.clone(),
        });

        // Build routes using the server's real route builder
        let app = routes::build_routes(state, test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            static_dir,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Root of the temporary front-end build directory.
    pub fn static_dir(&self) -> &Path {
        self.static_dir.path()
    }
}

impl Drop for TestRobotServer {
    fn drop(&mut self) {
        // Abort the server task so the port is released when the test ends
        self._handle.abort();
    }
}

fn write_static_files(root: &Path) -> std::io::Result<()> {
    std::fs::write(root.join("index.html"), TEST_INDEX_HTML)?;
    let js_dir = root.join("static").join("js");
    std::fs::create_dir_all(&js_dir)?;
    std::fs::write(js_dir.join("main.js"), TEST_MAIN_JS)
}
