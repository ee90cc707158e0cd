//! Error types for price quote operations

use thiserror::Error;

/// Price quote errors
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    /// Endpoint URL could not be constructed
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// Network or HTTP error, including timeouts
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Provider answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Response body is not the expected JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Response decoded but a required field is absent
    #[error("Missing field `{field}` in quote for {symbol}")]
    MissingField {
        symbol: String,
        field: &'static str,
    },

    /// Yahoo Finance reported an error inside a successful response
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),
}

impl QuoteError {
    /// Whether the failure happened before a usable body was received
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::InvalidEndpoint(_) | Self::NetworkError(_) | Self::HttpStatus { .. }
        )
    }

    /// Whether a body was received but could not be understood
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::JsonError(_) | Self::MissingField { .. } | Self::YahooFinanceError(_)
        )
    }
}

/// Result type alias for quote operations
pub type Result<T> = std::result::Result<T, QuoteError>;
