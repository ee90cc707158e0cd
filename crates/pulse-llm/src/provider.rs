//! Inference provider trait definition

use crate::sentiment::{SentimentJudgment, parse_sentiment};
use crate::{GenerateResponse, Result};
use async_trait::async_trait;

/// Trait for local inference providers
///
/// Implementations are pure I/O and hold no workflow state.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Run a single non-streaming JSON-format generation
    async fn generate(&self, prompt: &str, model: &str) -> Result<GenerateResponse>;

    /// Names of the models the server can run
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Ask the model for a sentiment judgment on `text`
    ///
    /// `text` is the complete prompt. The reply is decoded with the ordered
    /// strategies in [`crate::PARSE_STRATEGIES`].
    async fn analyze_sentiment(&self, text: &str, model: &str) -> Result<SentimentJudgment> {
        let envelope = self.generate(text, model).await?;
        parse_sentiment(&envelope)
    }

    /// Get the provider name (e.g., "ollama")
    fn name(&self) -> &str;
}
