//! Price quote client for pulse
//!
//! This crate wraps the price-quote provider's network contract. It holds no
//! state beyond an HTTP client, a rate limiter and a short-lived cache of
//! symbol search results.
//!
//! - [`QuoteProvider`]: the seam the orchestrator depends on
//! - [`YahooClient`]: implementation over Yahoo Finance's chart and search endpoints
//!
//! # Example
//!
//! ```rust,ignore
//! use pulse_market::{QuoteProvider, YahooClient, YahooConfig};
//!
//! let client = YahooClient::with_config(YahooConfig::default())?;
//! let quotes = client
//!     .fetch_quotes(&["AAPL".to_string(), "MSFT".to_string()])
//!     .await;
//! for quote in quotes {
//!     println!("{} {} {}", quote.symbol, quote.price, quote.currency);
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod quote;
pub mod yahoo;

pub use cache::SearchCache;
pub use config::YahooConfig;
pub use error::{QuoteError, Result};
pub use quote::{Quote, QuoteProvider, SearchHit, normalize_symbol};
pub use yahoo::YahooClient;
