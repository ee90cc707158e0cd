//! Error types for the sentiment workflow

use crate::store::StoreError;
use pulse_llm::InferenceError;
use pulse_market::QuoteError;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for pulse-core
pub type Result<T> = std::result::Result<T, SentimentError>;

/// Coarse classification of a failure, for callers that branch on cause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request never produced a usable body (connect, timeout, non-2xx)
    Transport,
    /// Body arrived but could not be decoded
    Decode,
    /// No parse strategy located a sentiment object
    SentimentFormat,
    /// A sentiment object was found but its fields are wrong
    InvalidResponse,
    Persistence,
    Configuration,
    /// Referenced ticker or article does not exist
    NotFound,
}

/// Errors surfaced by the orchestrator
#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("Quote error: {0}")]
    Quote(#[from] QuoteError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("Prompt rendering failed: {0}")]
    Prompt(#[from] minijinja::Error),

    /// The model's judgment could not be turned into a stored score
    #[error("Invalid sentiment response: {0}")]
    InvalidSentimentResponse(String),

    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("Unknown article: {0}")]
    UnknownArticle(Uuid),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Analysis of one article failed; nothing was written for it
    #[error("Analysis of article {article_id} ({headline:?}) failed: {source}")]
    AnalysisFailed {
        article_id: Uuid,
        headline: String,
        #[source]
        source: Box<SentimentError>,
    },

    /// Refreshing one ticker failed after its quote arrived
    #[error("Refresh of {symbol} failed: {source}")]
    RefreshFailed {
        symbol: String,
        #[source]
        source: Box<SentimentError>,
    },
}

impl SentimentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Quote(err) if err.is_transport() => ErrorKind::Transport,
            Self::Quote(QuoteError::InvalidSymbol(_)) => ErrorKind::Configuration,
            Self::Quote(_) => ErrorKind::Decode,
            Self::Inference(err) => inference_kind(err),
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::Prompt(_) | Self::Configuration(_) => ErrorKind::Configuration,
            Self::InvalidSentimentResponse(_) => ErrorKind::InvalidResponse,
            Self::UnknownTicker(_) | Self::UnknownArticle(_) => ErrorKind::NotFound,
            Self::AnalysisFailed { source, .. } | Self::RefreshFailed { source, .. } => {
                source.kind()
            }
        }
    }

    /// Wrap a failure with the article it happened on
    pub(crate) fn analysis_failed(article_id: Uuid, headline: &str, source: Self) -> Self {
        Self::AnalysisFailed {
            article_id,
            headline: headline.to_string(),
            source: Box::new(source),
        }
    }

    /// Wrap a failure with the ticker being refreshed
    pub(crate) fn refresh_failed(symbol: &str, source: Self) -> Self {
        Self::RefreshFailed {
            symbol: symbol.to_string(),
            source: Box::new(source),
        }
    }
}

fn inference_kind(err: &InferenceError) -> ErrorKind {
    match err {
        _ if err.is_transport() => ErrorKind::Transport,
        InferenceError::UnparseableSentiment(_) => ErrorKind::SentimentFormat,
        InferenceError::InvalidSentimentResponse(_) => ErrorKind::InvalidResponse,
        InferenceError::ConfigurationError(_) => ErrorKind::Configuration,
        _ => ErrorKind::Decode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_kinds() {
        let status: SentimentError = QuoteError::HttpStatus {
            status: 503,
            body: String::new(),
        }
        .into();
        assert_eq!(status.kind(), ErrorKind::Transport);

        let missing: SentimentError = QuoteError::MissingField {
            symbol: "AAPL".to_string(),
            field: "currency",
        }
        .into();
        assert_eq!(missing.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_inference_kinds() {
        let cases = [
            (
                InferenceError::ModelNotFound {
                    model: "x".into(),
                    body: String::new(),
                },
                ErrorKind::Transport,
            ),
            (InferenceError::UnparseableSentiment("x".into()), ErrorKind::SentimentFormat),
            (InferenceError::InvalidSentimentResponse("x".into()), ErrorKind::InvalidResponse),
            (InferenceError::UnexpectedResponse("x".into()), ErrorKind::Decode),
            (InferenceError::ConfigurationError("x".into()), ErrorKind::Configuration),
        ];
        for (err, kind) in cases {
            assert_eq!(SentimentError::from(err).kind(), kind);
        }
    }

    #[test]
    fn test_wrapped_kind_follows_source() {
        let err = SentimentError::analysis_failed(
            Uuid::new_v4(),
            "Earnings beat",
            StoreError::AnalysisExists(Uuid::new_v4()).into(),
        );
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(err.to_string().contains("Earnings beat"));

        let err = SentimentError::refresh_failed("AAPL", err);
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(err.to_string().starts_with("Refresh of AAPL failed"));
    }
}
