//! Generate endpoint request/response types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a generate call
///
/// Always requests JSON output and a single non-streamed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub format: String,
    pub stream: bool,
}

impl GenerateRequest {
    /// Create a non-streaming JSON-format request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            format: "json".to_string(),
            stream: false,
        }
    }
}

/// Envelope returned by a generate call
///
/// `response` carries the model's raw output. Every other field is kept in
/// `extra` so callers can look for objects some servers place next to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default)]
    pub response: Value,

    #[serde(default)]
    pub done: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GenerateResponse {
    /// Envelope holding only a textual response
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            response: Value::String(text.into()),
            done: true,
            ..Self::default()
        }
    }

    /// The model's raw output when it is a string
    pub fn response_text(&self) -> Option<&str> {
        self.response.as_str()
    }

    /// Look up an envelope-level field other than `model`, `response` and `done`
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Attach an envelope-level field
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}
