//! Error types for inference operations

use thiserror::Error;

/// Result type for inference operations
pub type Result<T> = std::result::Result<T, InferenceError>;

/// Errors that can occur while talking to the local model
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Endpoint URL could not be constructed
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// HTTP error, including connection refused and timeouts
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// Server answered 404 for the requested model
    #[error("Model not found: {model} (HTTP 404: {body})")]
    ModelNotFound { model: String, body: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Envelope decoded but lacks a required field
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// No parse strategy produced a sentiment object
    #[error("Unparseable sentiment: {0}")]
    UnparseableSentiment(String),

    /// A sentiment object was found but `score`/`summary` are absent or mistyped
    #[error("Invalid sentiment response: {0}")]
    InvalidSentimentResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl InferenceError {
    /// Whether the request never produced a usable response body
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::InvalidEndpoint(_)
                | Self::HttpError(_)
                | Self::RequestFailed { .. }
                | Self::ModelNotFound { .. }
        )
    }
}
