//! Observability module for the robot server.
//!
//! Provides metrics definitions and recording helpers.

pub mod metrics;
