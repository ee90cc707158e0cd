//! Quote types and the provider seam

use crate::error::{QuoteError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A price observation for a symbol at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub currency: String,
    pub observed_at: DateTime<Utc>,
}

/// One entry returned by a symbol search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub symbol: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub quote_type: Option<String>,
}

/// Trim and upper-case a ticker symbol, rejecting empty or path-breaking input
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let trimmed = symbol.trim();
    if trimmed.is_empty()
        || trimmed
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#'))
    {
        return Err(QuoteError::InvalidSymbol(symbol.to_string()));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Trait for price-quote providers
///
/// Implementations only perform I/O; they never touch stored records.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch the current quote for one symbol
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;

    /// Search for instruments matching free text
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;

    /// Fetch quotes for many symbols concurrently
    ///
    /// Per-symbol failures are logged and dropped. An empty result means
    /// "no updates this cycle", not failure. Duplicate symbols are fetched once.
    async fn fetch_quotes(&self, symbols: &[String]) -> Vec<Quote> {
        let mut unique: Vec<&String> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if !unique.iter().any(|s| s.eq_ignore_ascii_case(symbol)) {
                unique.push(symbol);
            }
        }

        let results = join_all(unique.iter().map(|symbol| self.fetch_quote(symbol))).await;

        let mut quotes = Vec::with_capacity(results.len());
        for (symbol, result) in unique.into_iter().zip(results) {
            match result {
                Ok(quote) => quotes.push(quote),
                Err(err) => warn!(symbol = %symbol, error = %err, "Quote fetch failed, skipping symbol"),
            }
        }

        debug!("Fetched {}/{} quotes", quotes.len(), symbols.len());
        quotes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct FixedProvider;

    #[async_trait]
    impl QuoteProvider for FixedProvider {
        async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
            if symbol.starts_with("BAD") {
                return Err(QuoteError::HttpStatus {
                    status: 404,
                    body: "Not Found".to_string(),
                });
            }
            Ok(Quote {
                symbol: symbol.to_string(),
                price: 100.0,
                currency: "USD".to_string(),
                observed_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            })
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("brk-b").unwrap(), "BRK-B");
        assert_eq!(normalize_symbol("^gspc").unwrap(), "^GSPC");
        assert!(normalize_symbol("").is_err());
        assert!(normalize_symbol("A B").is_err());
        assert!(normalize_symbol("../x").is_err());
    }

    #[tokio::test]
    async fn test_fetch_quotes_drops_failures() {
        let symbols = vec!["AAPL".to_string(), "BAD1".to_string(), "MSFT".to_string()];
        let quotes = FixedProvider.fetch_quotes(&symbols).await;

        let fetched: Vec<_> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(fetched, vec!["AAPL", "MSFT"]);
    }

    #[tokio::test]
    async fn test_fetch_quotes_all_failing_is_empty() {
        let symbols = vec!["BAD1".to_string(), "BAD2".to_string()];
        assert!(FixedProvider.fetch_quotes(&symbols).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_quotes_deduplicates() {
        let symbols = vec!["AAPL".to_string(), "aapl".to_string()];
        assert_eq!(FixedProvider.fetch_quotes(&symbols).await.len(), 1);
    }
}
