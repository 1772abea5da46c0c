//! Authentication module for the robot server.
//!
//! Validates bearer tokens with public keys from the identity provider's
//! JWKS endpoint.
//!
//! # Components
//!
//! - `jwks` - JWKS client and key reconstruction
//! - `jwt` - Token validation pipeline
//! - `claims` - Claim set of validated tokens

pub mod claims;
pub mod jwks;
pub mod jwt;

pub use claims::{Audience, Claims};
pub use jwks::{Jwk, JwksClient, JwksResponse};
pub use jwt::{TokenValidator, ValidatorSettings};
