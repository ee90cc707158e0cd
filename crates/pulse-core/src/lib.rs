//! Sentiment orchestration for pulse
//!
//! This crate owns the record model and the workflow that keeps it current:
//!
//! - [`models`]: tickers, articles and sentiment analyses
//! - [`store`]: the [`RecordStore`] seam with in-memory and JSON-file stores
//! - [`SentimentOrchestrator`]: price refresh, ingestion and analysis under a
//!   single writer lock
//!
//! # Example
//!
//! ```rust,ignore
//! use pulse_core::{InMemoryStore, SentimentOrchestrator};
//! use pulse_llm::providers::OllamaClient;
//! use pulse_market::YahooClient;
//! use std::sync::Arc;
//!
//! let orchestrator = SentimentOrchestrator::builder()
//!     .quotes(Arc::new(YahooClient::new()?))
//!     .inference(Arc::new(OllamaClient::new()?))
//!     .store(Arc::new(InMemoryStore::new()))
//!     .build()?;
//!
//! orchestrator.watch("AAPL", "Apple Inc.").await?;
//! let report = orchestrator.refresh_and_analyze(&["AAPL".to_string()]).await?;
//! println!("updated {:?}, analyzed {}", report.updated, report.analyzed);
//! ```

pub mod error;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod source;
pub mod store;

pub use error::{ErrorKind, Result, SentimentError};
pub use models::{
    Article, NewArticle, SentimentAnalysis, SentimentLabel, Ticker, TickerSummary,
    average_sentiment, clamp_score,
};
pub use orchestrator::{
    AnalysisOutcome, DEFAULT_MODEL, RefreshReport, SentimentOrchestrator,
    SentimentOrchestratorBuilder,
};
pub use prompt::SentimentPrompt;
pub use source::{ArticleSource, NoArticleSource};
pub use store::{
    ArticleQuery, InMemoryStore, JsonFileStore, RecordStore, StoreError, StoreResult, WriteBatch,
};
