//! # Robot Test Utilities
//!
//! Shared test utilities for the robot server.
//!
//! This crate provides:
//! - Deterministic RSA key and certificate fixtures
//! - Fluent builder for token claims
//! - Mock JWKS endpoint (`MockJwks`)
//! - Server test harness (`TestRobotServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use robot_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let jwks = MockJwks::start(jwks_json(vec![PRIMARY.jwk_json("k1")])).await;
//!     let server = TestRobotServer::spawn(&jwks.url()).await?;
//!
//!     let token = PRIMARY.sign(Some("k1"), &TestTokenBuilder::new().build())?;
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/tasks", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_mock;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use jwks_mock::*;
pub use server_harness::*;
pub use token_builders::*;
