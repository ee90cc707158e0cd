//! Article ingestion seam

use crate::Result;
use crate::models::{NewArticle, Ticker};
use async_trait::async_trait;

/// Supplies fresh articles for a ticker during a refresh
///
/// Returned items may repeat earlier ones; the orchestrator drops any whose
/// URL the ticker already owns.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_new_articles(&self, ticker: &Ticker) -> Result<Vec<NewArticle>>;
}

/// Source that never yields anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArticleSource;

#[async_trait]
impl ArticleSource for NoArticleSource {
    async fn fetch_new_articles(&self, _ticker: &Ticker) -> Result<Vec<NewArticle>> {
        Ok(Vec::new())
    }
}
