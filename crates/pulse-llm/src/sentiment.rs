//! Sentiment extraction from generate envelopes
//!
//! Local models do not reliably honor JSON-format requests. Some return the
//! judgment as a JSON document inside the `response` string, others put an
//! object next to it in the envelope. Extraction walks [`PARSE_STRATEGIES`]
//! in order and stops at the first one that yields an object.

use crate::{GenerateResponse, InferenceError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Score and rationale returned by the model, before clamping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentJudgment {
    pub score: f64,
    pub summary: String,
}

impl SentimentJudgment {
    /// Validate a candidate object: `score` must be a number, `summary` a string
    pub fn from_object(object: &Map<String, Value>) -> Result<Self> {
        let score = match object.get("score") {
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
                InferenceError::InvalidSentimentResponse(format!("score {n} is not a finite number"))
            })?,
            Some(other) => {
                return Err(InferenceError::InvalidSentimentResponse(format!(
                    "score must be a number, got {other}"
                )));
            }
            None => {
                return Err(InferenceError::InvalidSentimentResponse(
                    "missing `score`".to_string(),
                ));
            }
        };

        let summary = match object.get("summary") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(InferenceError::InvalidSentimentResponse(format!(
                    "summary must be a string, got {other}"
                )));
            }
            None => {
                return Err(InferenceError::InvalidSentimentResponse(
                    "missing `summary`".to_string(),
                ));
            }
        };

        Ok(Self { score, summary })
    }
}

/// One way of locating the sentiment object in an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// Decode the `response` string as a JSON object
    ResponseText,
    /// Use an envelope-level `sentiment` object
    EnvelopeObject,
}

/// Strategies in the order they are tried
pub const PARSE_STRATEGIES: [ParseStrategy; 2] =
    [ParseStrategy::ResponseText, ParseStrategy::EnvelopeObject];

impl ParseStrategy {
    /// Short name used in logs and error messages
    pub fn name(self) -> &'static str {
        match self {
            Self::ResponseText => "response-text",
            Self::EnvelopeObject => "envelope-object",
        }
    }

    /// Try to locate a candidate object; `None` means this strategy does not apply
    pub fn extract(self, envelope: &GenerateResponse) -> Option<Map<String, Value>> {
        match self {
            Self::ResponseText => {
                let text = strip_code_fence(envelope.response_text()?);
                match serde_json::from_str::<Value>(text) {
                    Ok(Value::Object(object)) => Some(object),
                    _ => None,
                }
            }
            Self::EnvelopeObject => match envelope.field("sentiment")? {
                Value::Object(object) => Some(object.clone()),
                _ => None,
            },
        }
    }
}

/// Some models wrap JSON in a markdown fence despite the format flag
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Extract a judgment using [`PARSE_STRATEGIES`]
pub fn parse_sentiment(envelope: &GenerateResponse) -> Result<SentimentJudgment> {
    parse_sentiment_with(envelope, &PARSE_STRATEGIES)
}

/// Extract a judgment trying `strategies` in order
///
/// The first strategy that yields an object decides the outcome: its object
/// is validated and later strategies are not consulted.
pub fn parse_sentiment_with(
    envelope: &GenerateResponse,
    strategies: &[ParseStrategy],
) -> Result<SentimentJudgment> {
    for strategy in strategies {
        if let Some(object) = strategy.extract(envelope) {
            debug!("Sentiment located by {} strategy", strategy.name());
            return SentimentJudgment::from_object(&object);
        }
        debug!("Sentiment strategy {} did not apply", strategy.name());
    }

    let tried: Vec<_> = strategies.iter().map(|s| s.name()).collect();
    Err(InferenceError::UnparseableSentiment(format!(
        "no sentiment object found (tried {})",
        tried.join(", ")
    )))
}
