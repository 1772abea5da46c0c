//! Common utilities shared across the robot server crates.

#![warn(clippy::pedantic)]

/// Module for JWT format utilities (unverified decoding, kid, iat, PEM)
pub mod jwt;
