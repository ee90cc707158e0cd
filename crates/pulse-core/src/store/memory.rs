//! Volatile store used for tests and dry runs

use super::snapshot::Snapshot;
use super::{ArticleQuery, RecordStore, StoreResult, WriteBatch};
use crate::models::{Article, SentimentAnalysis, Ticker};
use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

/// Store that keeps every record in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    snapshot: RwLock<Snapshot>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }

    pub(crate) async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().await
    }

    /// Apply `batch` to a copy of the current state
    ///
    /// Returns the write guard together with the staged state so the caller
    /// can persist it before swapping it in. Dropping both discards the batch.
    pub(crate) async fn staged(
        &self,
        batch: WriteBatch,
    ) -> StoreResult<(RwLockWriteGuard<'_, Snapshot>, Snapshot)> {
        let guard = self.snapshot.write().await;
        let mut next = guard.clone();
        next.apply(batch)?;
        Ok((guard, next))
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn tickers(&self) -> StoreResult<Vec<Ticker>> {
        Ok(self.read().await.tickers())
    }

    async fn ticker(&self, symbol: &str) -> StoreResult<Option<Ticker>> {
        Ok(self.read().await.ticker(symbol))
    }

    async fn articles(&self, query: ArticleQuery) -> StoreResult<Vec<Article>> {
        Ok(self.read().await.articles(&query))
    }

    async fn article(&self, id: Uuid) -> StoreResult<Option<Article>> {
        Ok(self.read().await.article(id))
    }

    async fn analysis_for(&self, article_id: Uuid) -> StoreResult<Option<SentimentAnalysis>> {
        Ok(self.read().await.analysis_for(article_id))
    }

    async fn analyses(&self) -> StoreResult<Vec<SentimentAnalysis>> {
        Ok(self.read().await.analyses())
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let (mut guard, next) = self.staged(batch).await?;
        *guard = next;
        debug!("Committed batch to in-memory store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewArticle;
    use crate::store::StoreError;
    use chrono::Utc;

    fn article(symbol: &str) -> Article {
        Article::new(
            symbol,
            NewArticle {
                headline: "Earnings beat".to_string(),
                summary: "Revenue up".to_string(),
                published_at: Utc::now(),
                url: "https://news.example/earnings".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let store = InMemoryStore::new();
        store.insert_ticker(Ticker::new("aapl", "Apple")).await.unwrap();
        let item = article("AAPL");
        store.insert_article(item.clone()).await.unwrap();

        let ticker = store.ticker("AAPL").await.unwrap().unwrap();
        assert_eq!(ticker.article_ids(), &[item.id()]);
        assert_eq!(store.article(item.id()).await.unwrap(), Some(item));
        assert_eq!(store.articles(ArticleQuery::Unanalyzed).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_batch_changes_nothing() {
        let store = InMemoryStore::new();
        store.insert_ticker(Ticker::new("AAPL", "Apple")).await.unwrap();

        // The second insert fails, so the first must not land either
        let err = store
            .commit(
                WriteBatch::new()
                    .insert_article(article("AAPL"))
                    .insert_article(article("NOPE")),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::UnknownTicker(_)));
        assert!(store.articles(ArticleQuery::All).await.unwrap().is_empty());
        assert!(
            store
                .ticker("AAPL")
                .await
                .unwrap()
                .unwrap()
                .article_ids()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_duplicate_ticker_rejected() {
        let store = InMemoryStore::new();
        store.insert_ticker(Ticker::new("AAPL", "Apple")).await.unwrap();
        let err = store
            .insert_ticker(Ticker::new("aapl", "Apple again"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTicker(_)));
    }
}
