//! Durable store backed by a single JSON file

use super::memory::InMemoryStore;
use super::snapshot::{Snapshot, SnapshotFile};
use super::{ArticleQuery, RecordStore, StoreResult, WriteBatch};
use crate::models::{Article, SentimentAnalysis, Ticker};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Store that persists the full record set as pretty-printed JSON
///
/// Each commit writes the staged state to `<path>.tmp` and renames it over
/// the store file, so the file always holds either the old or the new state.
/// The in-memory copy is only replaced after the rename succeeds.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemoryStore,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let file: SnapshotFile = serde_json::from_str(&content)?;
                Snapshot::from_file(file)?
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "No store file yet, starting empty");
                Snapshot::default()
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path,
            inner: InMemoryStore::from_snapshot(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn persist(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(&snapshot.to_file())?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn tickers(&self) -> StoreResult<Vec<Ticker>> {
        self.inner.tickers().await
    }

    async fn ticker(&self, symbol: &str) -> StoreResult<Option<Ticker>> {
        self.inner.ticker(symbol).await
    }

    async fn articles(&self, query: ArticleQuery) -> StoreResult<Vec<Article>> {
        self.inner.articles(query).await
    }

    async fn article(&self, id: Uuid) -> StoreResult<Option<Article>> {
        self.inner.article(id).await
    }

    async fn analysis_for(&self, article_id: Uuid) -> StoreResult<Option<SentimentAnalysis>> {
        self.inner.analysis_for(article_id).await
    }

    async fn analyses(&self) -> StoreResult<Vec<SentimentAnalysis>> {
        self.inner.analyses().await
    }

    #[instrument(skip(self, batch), fields(path = %self.path.display()))]
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let (mut guard, next) = self.inner.staged(batch).await?;
        self.persist(&next).await?;
        *guard = next;
        debug!("Committed batch to store file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewArticle;
    use crate::store::StoreError;
    use chrono::Utc;

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("store.json")).await.unwrap();
        assert!(store.tickers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut item = Article::new(
            "AAPL",
            NewArticle {
                headline: "Record iPhone sales".to_string(),
                summary: "Demand strong".to_string(),
                published_at: Utc::now(),
                url: "https://news.example/iphone".to_string(),
            },
        );
        let analysis = SentimentAnalysis::new(item.id(), 0.8, "strong demand", "llama3.2", Utc::now());

        {
            let store = JsonFileStore::open(&path).await.unwrap();
            store.insert_ticker(Ticker::new("AAPL", "Apple")).await.unwrap();
            store.insert_article(item.clone()).await.unwrap();
            item.attach_analysis(&analysis).unwrap();
            store
                .commit(
                    WriteBatch::new()
                        .update_article(item.clone())
                        .insert_analysis(analysis.clone()),
                )
                .await
                .unwrap();
        }

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.article(item.id()).await.unwrap(), Some(item.clone()));
        assert_eq!(reopened.analysis_for(item.id()).await.unwrap(), Some(analysis));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let err = JsonFileStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_rejected_batch_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        store.insert_ticker(Ticker::new("AAPL", "Apple")).await.unwrap();
        let before = tokio::fs::read_to_string(&path).await.unwrap();

        let result = store.insert_ticker(Ticker::new("AAPL", "Apple")).await;

        assert!(result.is_err());
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), before);
    }
}
