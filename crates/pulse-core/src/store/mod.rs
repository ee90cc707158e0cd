//! Record store abstraction and implementations
//!
//! All mutations go through [`RecordStore::commit`] with a [`WriteBatch`]:
//! either every change in the batch is applied or none is.

mod json_file;
mod memory;
mod snapshot;

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;

use crate::models::{Article, SentimentAnalysis, Ticker};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Store failures; a failed commit never leaves partial changes behind
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Ticker {0} already exists")]
    DuplicateTicker(String),

    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("Article {0} already exists")]
    DuplicateArticle(Uuid),

    #[error("Unknown article: {0}")]
    UnknownArticle(Uuid),

    /// The article already owns an analysis
    #[error("Article {0} already has a sentiment analysis")]
    AnalysisExists(Uuid),

    #[error("Analysis {analysis} does not belong to article {article}")]
    AnalysisMismatch { analysis: Uuid, article: Uuid },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Predicate for article lookups
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleQuery {
    All,
    /// Articles owned by the ticker with this symbol, in attachment order
    OwnedBy(String),
    Unanalyzed,
}

impl ArticleQuery {
    pub fn owned_by(symbol: impl AsRef<str>) -> Self {
        Self::OwnedBy(symbol.as_ref().trim().to_ascii_uppercase())
    }

    pub fn matches(&self, article: &Article) -> bool {
        match self {
            Self::All => true,
            Self::OwnedBy(symbol) => article.ticker() == symbol,
            Self::Unanalyzed => !article.is_analyzed(),
        }
    }
}

/// A set of changes committed atomically
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub(crate) new_tickers: Vec<Ticker>,
    pub(crate) ticker_updates: Vec<Ticker>,
    pub(crate) new_articles: Vec<Article>,
    pub(crate) article_updates: Vec<Article>,
    pub(crate) new_analyses: Vec<SentimentAnalysis>,
    pub(crate) deleted_articles: Vec<Uuid>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ticker; its symbol must not exist yet
    pub fn insert_ticker(mut self, ticker: Ticker) -> Self {
        self.new_tickers.push(ticker);
        self
    }

    /// Replace an existing ticker keyed by symbol
    pub fn update_ticker(mut self, ticker: Ticker) -> Self {
        self.ticker_updates.push(ticker);
        self
    }

    /// Add an article and append it to its owner's article list
    pub fn insert_article(mut self, article: Article) -> Self {
        self.new_articles.push(article);
        self
    }

    /// Replace an existing article keyed by id
    pub fn update_article(mut self, article: Article) -> Self {
        self.article_updates.push(article);
        self
    }

    /// Add an analysis; its article must reference it and own no other
    pub fn insert_analysis(mut self, analysis: SentimentAnalysis) -> Self {
        self.new_analyses.push(analysis);
        self
    }

    /// Remove an article together with its analysis
    pub fn delete_article(mut self, id: Uuid) -> Self {
        self.deleted_articles.push(id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.new_tickers.is_empty()
            && self.ticker_updates.is_empty()
            && self.new_articles.is_empty()
            && self.article_updates.is_empty()
            && self.new_analyses.is_empty()
            && self.deleted_articles.is_empty()
    }
}

/// Persistent store of tickers, articles and analyses
///
/// Implementations are not expected to tolerate concurrent writers; callers
/// serialize mutations.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All tickers ordered by symbol
    async fn tickers(&self) -> StoreResult<Vec<Ticker>>;

    async fn ticker(&self, symbol: &str) -> StoreResult<Option<Ticker>>;

    async fn articles(&self, query: ArticleQuery) -> StoreResult<Vec<Article>>;

    async fn article(&self, id: Uuid) -> StoreResult<Option<Article>>;

    async fn analysis_for(&self, article_id: Uuid) -> StoreResult<Option<SentimentAnalysis>>;

    async fn analyses(&self) -> StoreResult<Vec<SentimentAnalysis>>;

    /// Apply every change in `batch`, or none of them
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    async fn insert_ticker(&self, ticker: Ticker) -> StoreResult<()> {
        self.commit(WriteBatch::new().insert_ticker(ticker)).await
    }

    async fn insert_article(&self, article: Article) -> StoreResult<()> {
        self.commit(WriteBatch::new().insert_article(article)).await
    }
}
