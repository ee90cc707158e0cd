//! Shared utilities for pulse
//!
//! This crate provides common functionality used across the pulse workspace:
//! tracing setup and the application configuration read from the environment.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigError};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
