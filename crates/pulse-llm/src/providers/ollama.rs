//! Ollama provider implementation
//!
//! Talks to a locally running Ollama server.
//! See: https://github.com/ollama/ollama/blob/main/docs/api.md
//!
//! # Examples
//!
//! ```no_run
//! use pulse_llm::InferenceProvider;
//! use pulse_llm::providers::{OllamaClient, OllamaConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OllamaClient::with_config(OllamaConfig::from_env())?;
//!
//!     for model in client.list_models().await? {
//!         println!("{model}");
//!     }
//!
//!     let judgment = client
//!         .analyze_sentiment("Respond with {\"score\": 0.1, \"summary\": \"...\"}", "llama3.2")
//!         .await?;
//!     println!("{} {}", judgment.score, judgment.summary);
//!     Ok(())
//! }
//! ```

use crate::{GenerateRequest, GenerateResponse, InferenceError, InferenceProvider, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const DEFAULT_OLLAMA_API_BASE: &str = "http://localhost:11434";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Ollama provider
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the server (default: "http://localhost:11434")
    pub api_base: String,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl OllamaConfig {
    /// Create a config for the given server
    ///
    /// A bare `host:port` is accepted and treated as plain HTTP, matching
    /// how the Ollama CLI reads `OLLAMA_HOST`.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: normalize_base(&api_base.into()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create config from the `OLLAMA_HOST` environment variable, or defaults
    pub fn from_env() -> Self {
        std::env::var("OLLAMA_HOST").map_or_else(|_| Self::default(), Self::new)
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_API_BASE)
    }
}

fn normalize_base(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

/// Ollama provider
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Create a new provider with custom configuration
    pub fn with_config(config: OllamaConfig) -> Result<Self> {
        if config.timeout_secs == 0 {
            return Err(InferenceError::ConfigurationError(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider for the default local server
    pub fn new() -> Result<Self> {
        Self::with_config(OllamaConfig::default())
    }

    /// Get the current configuration
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}/api/{path}", self.config.api_base))?)
    }
}

#[async_trait]
impl InferenceProvider for OllamaClient {
    #[instrument(skip(self, prompt), fields(api_base = %self.config.api_base))]
    async fn generate(&self, prompt: &str, model: &str) -> Result<GenerateResponse> {
        let url = self.endpoint("generate")?;
        let request = GenerateRequest::new(model, prompt);
        debug!("Sending generate request ({} prompt bytes)", prompt.len());

        let response = self.client.post(url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::NOT_FOUND => InferenceError::ModelNotFound {
                    model: model.to_string(),
                    body,
                },
                _ => InferenceError::RequestFailed {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let body = response.text().await?;
        let envelope: GenerateResponse = serde_json::from_str(&body)?;

        if !envelope.done {
            debug!("Generate envelope not marked done");
        }

        Ok(envelope)
    }

    #[instrument(skip(self), fields(api_base = %self.config.api_base))]
    async fn list_models(&self) -> Result<Vec<String>> {
        let url = self.endpoint("tags")?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::RequestFailed { status, body });
        }

        let body = response.text().await?;
        parse_tags(&body)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

// ============================================================================
// Ollama-specific response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Option<Vec<TagsModel>>,
}

#[derive(Debug, Deserialize)]
struct TagsModel {
    name: String,
}

/// Decode a tags listing into model names
fn parse_tags(body: &str) -> Result<Vec<String>> {
    let tags: TagsResponse = serde_json::from_str(body)?;
    let models = tags
        .models
        .ok_or_else(|| InferenceError::UnexpectedResponse("missing `models` array".to_string()))?;
    Ok(models.into_iter().map(|m| m.name).collect())
}

// ============================================================================
// Tests
// ============================================================================
