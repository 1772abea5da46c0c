//! Robot Server Library
//!
//! Backend for the robot programming front-end:
//!
//! - Serves the front-end build output under a URL prefix
//! - Exposes `GET /tasks` to callers holding a valid bearer token
//! - Validates tokens against the identity provider's JWKS
//!
//! # Modules
//!
//! - `auth` - JWKS client, token validation, claims
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication and HTTP metrics middleware
//! - `models` - Data models
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
