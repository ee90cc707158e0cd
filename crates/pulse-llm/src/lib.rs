//! Local inference client for pulse
//!
//! This crate wraps the local language model's network contract. It includes:
//!
//! - Request/response envelope types for the generate endpoint
//! - The [`InferenceProvider`] trait the orchestrator depends on
//! - Sentiment extraction with an ordered list of [`ParseStrategy`] values
//! - An Ollama implementation in [`providers`]

pub mod error;
pub mod generate;
pub mod provider;
pub mod providers;
pub mod sentiment;

// Re-export main types
pub use error::{InferenceError, Result};
pub use generate::{GenerateRequest, GenerateResponse};
pub use provider::InferenceProvider;
pub use sentiment::{PARSE_STRATEGIES, ParseStrategy, SentimentJudgment, parse_sentiment};

