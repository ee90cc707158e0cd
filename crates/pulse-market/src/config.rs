//! Configuration for the Yahoo Finance client

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_CHART_BASE: &str = "https://query1.finance.yahoo.com";
const DEFAULT_SEARCH_BASE: &str = "https://query2.finance.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; pulse/0.1)";

/// Configuration for [`crate::YahooClient`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YahooConfig {
    /// Base URL for the chart endpoint (default: "https://query1.finance.yahoo.com")
    pub chart_base: String,

    /// Base URL for the search endpoint (default: "https://query2.finance.yahoo.com")
    pub search_base: String,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Maximum requests per minute across both endpoints
    pub rate_limit_per_minute: u32,

    /// How long search results stay cached
    pub search_cache_ttl: Duration,

    /// User agent sent with every request; Yahoo rejects empty agents
    pub user_agent: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            chart_base: DEFAULT_CHART_BASE.to_string(),
            search_base: DEFAULT_SEARCH_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            rate_limit_per_minute: 120,
            search_cache_ttl: Duration::from_secs(300),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl YahooConfig {
    /// Create a config with default endpoints
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the chart endpoint somewhere else (mirrors, test servers)
    pub fn with_chart_base(mut self, base: impl Into<String>) -> Self {
        self.chart_base = base.into();
        self
    }

    /// Point the search endpoint somewhere else
    pub fn with_search_base(mut self, base: impl Into<String>) -> Self {
        self.search_base = base.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the request budget per minute
    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.rate_limit_per_minute = per_minute;
        self
    }

    /// Set the search cache lifetime
    pub fn with_search_cache_ttl(mut self, ttl: Duration) -> Self {
        self.search_cache_ttl = ttl;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = YahooConfig::default();
        assert_eq!(config.chart_base, "https://query1.finance.yahoo.com");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.rate_limit_per_minute, 120);
    }

    #[test]
    fn test_config_builder() {
        let config = YahooConfig::new()
            .with_chart_base("http://127.0.0.1:9000")
            .with_timeout(5)
            .with_rate_limit(10)
            .with_search_cache_ttl(Duration::from_secs(1));

        assert_eq!(config.chart_base, "http://127.0.0.1:9000");
        assert_eq!(config.search_base, "https://query2.finance.yahoo.com");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.rate_limit_per_minute, 10);
        assert_eq!(config.search_cache_ttl, Duration::from_secs(1));
    }
}
