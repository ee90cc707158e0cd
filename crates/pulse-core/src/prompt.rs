//! Sentiment prompt template

use crate::models::Article;
use minijinja::{Environment, context};

const TEMPLATE_NAME: &str = "sentiment.article";

const SENTIMENT_TEMPLATE: &str = r#"You are a financial news analyst. Judge how the following article is likely to affect the stock price of {{ symbol }}.

Headline: {{ headline | trim }}
{% if summary %}Summary: {{ summary | trim }}
{% endif %}
Score the sentiment from -1.0 (very negative) to 1.0 (very positive), with 0.0 meaning neutral.
Positive indicators: revenue or earnings beats, raised guidance, new products, partnerships, upgrades, buybacks.
Negative indicators: misses, lowered guidance, lawsuits, recalls, layoffs, downgrades, regulatory action.

Reply with JSON only, in exactly this shape:
{"score": <number between -1.0 and 1.0>, "summary": "<one sentence explaining the score>"}"#;

/// Renders the per-article sentiment prompt
pub struct SentimentPrompt {
    env: Environment<'static>,
}

impl SentimentPrompt {
    /// Build the prompt environment; fails only if the template does not compile
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, SENTIMENT_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render the prompt for one article
    pub fn render(&self, article: &Article) -> Result<String, minijinja::Error> {
        self.env.get_template(TEMPLATE_NAME)?.render(context! {
            symbol => article.ticker(),
            headline => &article.headline,
            summary => &article.summary,
        })
    }
}

impl std::fmt::Debug for SentimentPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentPrompt")
            .field("template", &TEMPLATE_NAME)
            .finish()
    }
}
