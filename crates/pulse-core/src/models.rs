//! Record types: tickers, articles and their sentiment analyses

use crate::store::StoreError;
use chrono::{DateTime, Utc};
use pulse_market::Quote;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Width of the neutral band around zero used for display labels
const NEUTRAL_BAND: f64 = 0.2;

/// A tracked stock symbol with its latest price and owned articles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    /// Unique key, stored upper-case
    pub symbol: String,
    pub name: String,
    /// Overwritten on every successful quote
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub price_updated_at: Option<DateTime<Utc>>,
    pub(crate) article_ids: Vec<Uuid>,
}

impl Ticker {
    /// Create a ticker with no price and no articles
    pub fn new(symbol: impl AsRef<str>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.as_ref().trim().to_ascii_uppercase(),
            name: name.into(),
            price: None,
            currency: None,
            price_updated_at: None,
            article_ids: Vec::new(),
        }
    }

    /// Owned articles in the order they were attached
    pub fn article_ids(&self) -> &[Uuid] {
        &self.article_ids
    }

    /// Overwrite the price fields from a quote
    pub fn apply_quote(&mut self, quote: &Quote) {
        self.price = Some(quote.price);
        self.currency = Some(quote.currency.clone());
        self.price_updated_at = Some(quote.observed_at);
    }

    pub(crate) fn push_article(&mut self, id: Uuid) {
        if !self.article_ids.contains(&id) {
            self.article_ids.push(id);
        }
    }

    pub(crate) fn remove_article(&mut self, id: Uuid) {
        self.article_ids.retain(|existing| *existing != id);
    }
}

/// Article content supplied by an ingestion source, before it is owned by a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    pub headline: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
}

/// A text item owned by exactly one ticker
///
/// `sentiment_score` mirrors the score of the owned analysis. It is written
/// only by [`Article::attach_analysis`] and reads 0 until then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    id: Uuid,
    ticker: String,
    pub headline: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    sentiment_score: f64,
    analysis_id: Option<Uuid>,
}

impl Article {
    /// Give new content an identity under `ticker`
    pub fn new(ticker: impl AsRef<str>, content: NewArticle) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticker: ticker.as_ref().trim().to_ascii_uppercase(),
            headline: content.headline,
            summary: content.summary,
            published_at: content.published_at,
            url: content.url,
            sentiment_score: 0.0,
            analysis_id: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Symbol of the owning ticker
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Cached copy of the owned analysis's score
    pub fn sentiment_score(&self) -> f64 {
        self.sentiment_score
    }

    pub fn analysis_id(&self) -> Option<Uuid> {
        self.analysis_id
    }

    pub fn is_analyzed(&self) -> bool {
        self.analysis_id.is_some()
    }

    /// Take ownership of an analysis and project its score
    ///
    /// Fails if the analysis belongs to another article or one is already attached.
    pub fn attach_analysis(&mut self, analysis: &SentimentAnalysis) -> Result<(), StoreError> {
        if analysis.article_id != self.id {
            return Err(StoreError::AnalysisMismatch {
                analysis: analysis.id,
                article: self.id,
            });
        }
        if self.analysis_id.is_some() {
            return Err(StoreError::AnalysisExists(self.id));
        }
        self.analysis_id = Some(analysis.id);
        self.sentiment_score = analysis.score;
        Ok(())
    }
}

/// Persisted result of scoring one article; never modified after it is written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub id: Uuid,
    pub article_id: Uuid,
    /// Always within [-1, 1]
    pub score: f64,
    pub rationale: String,
    /// Model that produced the judgment
    pub model: String,
    pub analyzed_at: DateTime<Utc>,
}

impl SentimentAnalysis {
    pub fn new(
        article_id: Uuid,
        score: f64,
        rationale: impl Into<String>,
        model: impl Into<String>,
        analyzed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            article_id,
            score,
            rationale: rationale.into(),
            model: model.into(),
            analyzed_at,
        }
    }
}

/// Clamp a model score into [-1, 1]; non-finite scores have no meaning and yield `None`
pub fn clamp_score(raw: f64) -> Option<f64> {
    raw.is_finite().then(|| raw.clamp(-1.0, 1.0))
}

/// Mean of the articles' cached scores, 0 for an empty slice
pub fn average_sentiment(articles: &[Article]) -> f64 {
    if articles.is_empty() {
        return 0.0;
    }
    articles.iter().map(Article::sentiment_score).sum::<f64>() / articles.len() as f64
}

/// Coarse display bucket for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn from_score(score: f64) -> Self {
        if score > NEUTRAL_BAND {
            Self::Positive
        } else if score < -NEUTRAL_BAND {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        };
        f.write_str(label)
    }
}

/// Read-only view of a ticker for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSummary {
    pub symbol: String,
    pub name: String,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub article_count: usize,
    pub analyzed_count: usize,
    pub average_sentiment: f64,
}

impl TickerSummary {
    /// Summarize a ticker from its owned articles
    pub fn new(ticker: &Ticker, articles: &[Article]) -> Self {
        Self {
            symbol: ticker.symbol.clone(),
            name: ticker.name.clone(),
            price: ticker.price,
            currency: ticker.currency.clone(),
            article_count: articles.len(),
            analyzed_count: articles.iter().filter(|a| a.is_analyzed()).count(),
            average_sentiment: average_sentiment(articles),
        }
    }

    pub fn label(&self) -> SentimentLabel {
        SentimentLabel::from_score(self.average_sentiment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn content(headline: &str) -> NewArticle {
        NewArticle {
            headline: headline.to_string(),
            summary: "summary".to_string(),
            published_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            url: format!("https://news.example/{headline}"),
        }
    }

    fn scored(score: f64) -> Article {
        let mut article = Article::new("AAPL", content("scored"));
        let analysis = SentimentAnalysis::new(article.id(), score, "r", "m", Utc::now());
        article.attach_analysis(&analysis).unwrap();
        article
    }

    #[test]
    fn test_ticker_symbol_normalized() {
        let ticker = Ticker::new(" aapl ", "Apple Inc.");
        assert_eq!(ticker.symbol, "AAPL");
        assert!(ticker.price.is_none());
        assert!(ticker.article_ids().is_empty());
    }

    #[test]
    fn test_apply_quote() {
        let mut ticker = Ticker::new("MSFT", "Microsoft");
        let observed = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        ticker.apply_quote(&Quote {
            symbol: "MSFT".to_string(),
            price: 370.5,
            currency: "USD".to_string(),
            observed_at: observed,
        });
        assert_eq!(ticker.price, Some(370.5));
        assert_eq!(ticker.currency.as_deref(), Some("USD"));
        assert_eq!(ticker.price_updated_at, Some(observed));
    }

    #[test]
    fn test_new_article_is_unanalyzed() {
        let article = Article::new("aapl", content("launch"));
        assert_eq!(article.ticker(), "AAPL");
        assert_eq!(article.sentiment_score(), 0.0);
        assert!(!article.is_analyzed());
    }

    #[test]
    fn test_attach_analysis_projects_score() {
        let mut article = Article::new("AAPL", content("launch"));
        let analysis = SentimentAnalysis::new(article.id(), 0.7, "strong demand", "llama3.2", Utc::now());

        article.attach_analysis(&analysis).unwrap();

        assert_eq!(article.analysis_id(), Some(analysis.id));
        assert_eq!(article.sentiment_score(), 0.7);
    }

    #[test]
    fn test_attach_twice_rejected() {
        let mut article = Article::new("AAPL", content("launch"));
        let first = SentimentAnalysis::new(article.id(), 0.7, "a", "m", Utc::now());
        let second = SentimentAnalysis::new(article.id(), -0.7, "b", "m", Utc::now());

        article.attach_analysis(&first).unwrap();
        assert!(matches!(
            article.attach_analysis(&second),
            Err(StoreError::AnalysisExists(_))
        ));
        assert_eq!(article.sentiment_score(), 0.7);
    }

    #[test]
    fn test_attach_foreign_analysis_rejected() {
        let mut article = Article::new("AAPL", content("launch"));
        let foreign = SentimentAnalysis::new(Uuid::new_v4(), 0.1, "x", "m", Utc::now());
        assert!(matches!(
            article.attach_analysis(&foreign),
            Err(StoreError::AnalysisMismatch { .. })
        ));
        assert!(!article.is_analyzed());
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(2.4), Some(1.0));
        assert_eq!(clamp_score(-5.0), Some(-1.0));
        assert_eq!(clamp_score(0.25), Some(0.25));
        assert_eq!(clamp_score(f64::NAN), None);
        assert_eq!(clamp_score(f64::INFINITY), None);
    }

    #[test]
    fn test_average_sentiment() {
        let articles = vec![scored(0.5), scored(-0.5), scored(1.0)];
        assert!((average_sentiment(&articles) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(average_sentiment(&[]), 0.0);
    }

    #[test]
    fn test_unanalyzed_articles_count_as_zero() {
        let articles = vec![scored(1.0), Article::new("AAPL", content("pending"))];
        assert_eq!(average_sentiment(&articles), 0.5);
    }

    #[test]
    fn test_sentiment_label() {
        assert_eq!(SentimentLabel::from_score(0.5), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(0.2), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.21), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::Negative.to_string(), "negative");
    }

    #[test]
    fn test_ticker_summary() {
        let ticker = Ticker::new("AAPL", "Apple Inc.");
        let articles = vec![scored(0.6), Article::new("AAPL", content("pending"))];
        let summary = TickerSummary::new(&ticker, &articles);

        assert_eq!(summary.article_count, 2);
        assert_eq!(summary.analyzed_count, 1);
        assert_eq!(summary.average_sentiment, 0.3);
        assert_eq!(summary.label(), SentimentLabel::Positive);
    }
}
