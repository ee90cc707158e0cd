//! In-memory record state shared by the store implementations

use super::{ArticleQuery, StoreError, StoreResult, WriteBatch};
use crate::models::{Article, SentimentAnalysis, Ticker};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

const FILE_VERSION: u32 = 1;

/// Complete record state; batches are applied to a clone and swapped in on success
#[derive(Debug, Clone, Default)]
pub(crate) struct Snapshot {
    tickers: BTreeMap<String, Ticker>,
    articles: HashMap<Uuid, Article>,
    /// Keyed by article id, so at most one analysis per article
    analyses: HashMap<Uuid, SentimentAnalysis>,
}

/// On-disk layout of a snapshot
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SnapshotFile {
    version: u32,
    tickers: Vec<Ticker>,
    articles: Vec<Article>,
    analyses: Vec<SentimentAnalysis>,
}

impl Snapshot {
    pub(crate) fn tickers(&self) -> Vec<Ticker> {
        self.tickers.values().cloned().collect()
    }

    pub(crate) fn ticker(&self, symbol: &str) -> Option<Ticker> {
        self.tickers
            .get(&symbol.trim().to_ascii_uppercase())
            .cloned()
    }

    /// Articles grouped by ticker symbol, each group in attachment order
    pub(crate) fn articles(&self, query: &ArticleQuery) -> Vec<Article> {
        self.tickers
            .values()
            .flat_map(|ticker| ticker.article_ids.iter())
            .filter_map(|id| self.articles.get(id))
            .filter(|article| query.matches(article))
            .cloned()
            .collect()
    }

    pub(crate) fn article(&self, id: Uuid) -> Option<Article> {
        self.articles.get(&id).cloned()
    }

    pub(crate) fn analysis_for(&self, article_id: Uuid) -> Option<SentimentAnalysis> {
        self.analyses.get(&article_id).cloned()
    }

    /// Analyses ordered by completion time
    pub(crate) fn analyses(&self) -> Vec<SentimentAnalysis> {
        let mut analyses: Vec<_> = self.analyses.values().cloned().collect();
        analyses.sort_by_key(|a| a.analyzed_at);
        analyses
    }

    /// Apply a batch in place; callers run this on a clone so errors discard it
    pub(crate) fn apply(&mut self, batch: WriteBatch) -> StoreResult<()> {
        for ticker in batch.new_tickers {
            if ticker.symbol.is_empty() {
                return Err(StoreError::InvalidRecord("ticker symbol is empty".to_string()));
            }
            if !ticker.article_ids.is_empty() {
                return Err(StoreError::InvalidRecord(format!(
                    "new ticker {} must not own articles",
                    ticker.symbol
                )));
            }
            if self.tickers.contains_key(&ticker.symbol) {
                return Err(StoreError::DuplicateTicker(ticker.symbol));
            }
            self.tickers.insert(ticker.symbol.clone(), ticker);
        }

        for mut ticker in batch.ticker_updates {
            let existing = self
                .tickers
                .get(&ticker.symbol)
                .ok_or_else(|| StoreError::UnknownTicker(ticker.symbol.clone()))?;
            // Ownership lists change only through article inserts and deletes
            ticker.article_ids.clone_from(&existing.article_ids);
            self.tickers.insert(ticker.symbol.clone(), ticker);
        }

        for id in batch.deleted_articles {
            let article = self
                .articles
                .remove(&id)
                .ok_or(StoreError::UnknownArticle(id))?;
            self.analyses.remove(&id);
            if let Some(owner) = self.tickers.get_mut(article.ticker()) {
                owner.remove_article(id);
            }
        }

        for article in batch.new_articles {
            if self.articles.contains_key(&article.id()) {
                return Err(StoreError::DuplicateArticle(article.id()));
            }
            if article.is_analyzed() {
                return Err(StoreError::InvalidRecord(format!(
                    "new article {} must not be analyzed yet",
                    article.id()
                )));
            }
            let owner = self
                .tickers
                .get_mut(article.ticker())
                .ok_or_else(|| StoreError::UnknownTicker(article.ticker().to_string()))?;
            owner.push_article(article.id());
            self.articles.insert(article.id(), article);
        }

        let mut touched = Vec::with_capacity(batch.article_updates.len());
        for article in batch.article_updates {
            let existing = self
                .articles
                .get(&article.id())
                .ok_or(StoreError::UnknownArticle(article.id()))?;
            if existing.ticker() != article.ticker() {
                return Err(StoreError::InvalidRecord(format!(
                    "article {} cannot move from {} to {}",
                    article.id(),
                    existing.ticker(),
                    article.ticker()
                )));
            }
            if existing.is_analyzed() && existing.analysis_id() != article.analysis_id() {
                return Err(StoreError::AnalysisExists(article.id()));
            }
            touched.push(article.id());
            self.articles.insert(article.id(), article);
        }

        for analysis in batch.new_analyses {
            if !analysis.score.is_finite() || !(-1.0..=1.0).contains(&analysis.score) {
                return Err(StoreError::InvalidRecord(format!(
                    "analysis score {} outside [-1, 1]",
                    analysis.score
                )));
            }
            if self.analyses.contains_key(&analysis.article_id) {
                return Err(StoreError::AnalysisExists(analysis.article_id));
            }
            let article = self
                .articles
                .get(&analysis.article_id)
                .ok_or(StoreError::UnknownArticle(analysis.article_id))?;
            if article.analysis_id() != Some(analysis.id) {
                return Err(StoreError::AnalysisMismatch {
                    analysis: analysis.id,
                    article: analysis.article_id,
                });
            }
            if article.sentiment_score() != analysis.score {
                return Err(StoreError::InvalidRecord(format!(
                    "article {} caches score {} but analysis scored {}",
                    article.id(),
                    article.sentiment_score(),
                    analysis.score
                )));
            }
            self.analyses.insert(analysis.article_id, analysis);
        }

        for id in touched {
            if let Some(article) = self.articles.get(&id) {
                self.check_analysis_link(article)?;
            }
        }

        Ok(())
    }

    /// An analyzed article must point at the stored analysis for it
    fn check_analysis_link(&self, article: &Article) -> StoreResult<()> {
        let Some(analysis_id) = article.analysis_id() else {
            return Ok(());
        };
        match self.analyses.get(&article.id()) {
            Some(analysis) if analysis.id == analysis_id => Ok(()),
            _ => Err(StoreError::AnalysisMismatch {
                analysis: analysis_id,
                article: article.id(),
            }),
        }
    }

    pub(crate) fn to_file(&self) -> SnapshotFile {
        SnapshotFile {
            version: FILE_VERSION,
            tickers: self.tickers(),
            articles: self.articles(&ArticleQuery::All),
            analyses: self.analyses(),
        }
    }

    /// Rebuild from disk, rejecting files whose records do not line up
    pub(crate) fn from_file(file: SnapshotFile) -> StoreResult<Self> {
        if file.version != FILE_VERSION {
            return Err(StoreError::InvalidRecord(format!(
                "unsupported store version {}",
                file.version
            )));
        }

        let mut snapshot = Self::default();
        for ticker in file.tickers {
            if snapshot.tickers.contains_key(&ticker.symbol) {
                return Err(StoreError::DuplicateTicker(ticker.symbol));
            }
            snapshot.tickers.insert(ticker.symbol.clone(), ticker);
        }
        for article in file.articles {
            let owned = snapshot
                .tickers
                .get(article.ticker())
                .is_some_and(|owner| owner.article_ids.contains(&article.id()));
            if !owned {
                return Err(StoreError::InvalidRecord(format!(
                    "article {} is not owned by {}",
                    article.id(),
                    article.ticker()
                )));
            }
            if snapshot.articles.insert(article.id(), article.clone()).is_some() {
                return Err(StoreError::DuplicateArticle(article.id()));
            }
        }
        for analysis in file.analyses {
            if snapshot
                .analyses
                .insert(analysis.article_id, analysis.clone())
                .is_some()
            {
                return Err(StoreError::AnalysisExists(analysis.article_id));
            }
        }

        for ticker in snapshot.tickers.values() {
            if let Some(missing) = ticker
                .article_ids
                .iter()
                .find(|id| !snapshot.articles.contains_key(*id))
            {
                return Err(StoreError::UnknownArticle(*missing));
            }
        }
        for article in snapshot.articles.values() {
            snapshot.check_analysis_link(article)?;
        }
        for analysis in snapshot.analyses.values() {
            let linked = snapshot
                .articles
                .get(&analysis.article_id)
                .is_some_and(|a| a.analysis_id() == Some(analysis.id));
            if !linked {
                return Err(StoreError::AnalysisMismatch {
                    analysis: analysis.id,
                    article: analysis.article_id,
                });
            }
        }

        Ok(snapshot)
    }
}
