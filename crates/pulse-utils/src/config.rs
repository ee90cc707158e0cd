//! Configuration management utilities

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.2";
const DEFAULT_STORE_PATH: &str = "pulse-store.json";

/// Invalid configuration value
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was present but could not be parsed
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    /// A value parsed but is out of range
    #[error("Configuration error: {0}")]
    Invalid(String),
}

/// Application configuration shared by the binaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the local inference server
    pub ollama_host: String,
    /// Model used for sentiment analysis until changed at runtime
    pub model: String,
    /// Location of the JSON record store
    pub store_path: PathBuf,
    /// Upper bound on quote requests per minute
    pub quote_rate_limit: u32,
    /// HTTP request timeout in seconds, shared by both clients
    pub request_timeout_secs: u64,
    /// Lifetime of cached symbol search results in seconds
    pub search_cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            quote_rate_limit: 120,
            request_timeout_secs: 30,
            search_cache_ttl_secs: 300,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// Reads `OLLAMA_HOST`, `PULSE_MODEL`, `PULSE_STORE`, `PULSE_QUOTE_RATE_LIMIT`,
    /// `PULSE_TIMEOUT_SECS` and `PULSE_SEARCH_CACHE_TTL`. Unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("OLLAMA_HOST") {
            config.ollama_host = host;
        }
        if let Some(model) = lookup("PULSE_MODEL") {
            config.model = model;
        }
        if let Some(path) = lookup("PULSE_STORE") {
            config.store_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup("PULSE_QUOTE_RATE_LIMIT") {
            config.quote_rate_limit = parse_number("PULSE_QUOTE_RATE_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("PULSE_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_number("PULSE_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("PULSE_SEARCH_CACHE_TTL") {
            config.search_cache_ttl_secs = parse_number("PULSE_SEARCH_CACHE_TTL", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model name must not be empty".to_string()));
        }
        if self.quote_rate_limit == 0 {
            return Err(ConfigError::Invalid(
                "quote_rate_limit must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}
