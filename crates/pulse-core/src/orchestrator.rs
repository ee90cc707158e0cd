//! Sentiment orchestrator
//!
//! Coordinates price refresh, article ingestion and per-article sentiment
//! analysis over a [`RecordStore`]. One async mutex guards the selected model
//! and is held for the whole of every mutating workflow, so two workflows
//! never interleave their reads and writes. Quote fetching is the exception:
//! it is pure I/O and runs before the guard is taken.
//!
//! Failure handling is asymmetric. A quote batch tolerates per-symbol
//! failures, while analysis of a ticker's articles stops at the first failure
//! and propagates it. Articles analyzed before the failure stay committed.
//! A failure while refreshing one ticker is wrapped in
//! [`SentimentError::RefreshFailed`] with its symbol.

use crate::error::{Result, SentimentError};
use crate::models::{Article, NewArticle, SentimentAnalysis, Ticker, TickerSummary, clamp_score};
use crate::prompt::SentimentPrompt;
use crate::source::{ArticleSource, NoArticleSource};
use crate::store::{ArticleQuery, RecordStore, WriteBatch};
use chrono::Utc;
use pulse_llm::InferenceProvider;
use pulse_market::{Quote, QuoteProvider, SearchHit, normalize_symbol};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Result of [`SentimentOrchestrator::analyze_article`]
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// A new analysis was written
    Analyzed(SentimentAnalysis),
    /// The article already had an analysis; nothing was done
    AlreadyAnalyzed,
}

impl AnalysisOutcome {
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Analyzed(_))
    }
}

/// What a refresh cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Tickers whose price was updated
    pub updated: Vec<String>,
    /// Quoted symbols with no stored ticker
    pub skipped: Vec<String>,
    /// Requested symbols the provider returned no quote for
    pub unquoted: Vec<String>,
    pub articles_added: usize,
    /// Articles newly analyzed across all updated tickers
    pub analyzed: usize,
}

struct WorkflowState {
    model: String,
}

/// Coordinates the quote, inference and store collaborators
pub struct SentimentOrchestrator {
    quotes: Arc<dyn QuoteProvider>,
    inference: Arc<dyn InferenceProvider>,
    store: Arc<dyn RecordStore>,
    articles: Arc<dyn ArticleSource>,
    prompt: SentimentPrompt,
    state: Mutex<WorkflowState>,
}

impl SentimentOrchestrator {
    pub fn builder() -> SentimentOrchestratorBuilder {
        SentimentOrchestratorBuilder::new()
    }

    /// Symbols of every stored ticker, in order
    pub async fn watched_symbols(&self) -> Result<Vec<String>> {
        let tickers = self.store.tickers().await?;
        Ok(tickers.into_iter().map(|t| t.symbol).collect())
    }

    /// Select the model used for subsequent analyses
    pub async fn set_model(&self, name: impl Into<String>) -> Result<()> {
        let name = validate_model(name.into())?;
        let mut state = self.state.lock().await;
        info!(from = %state.model, to = %name, "Switching model");
        state.model = name;
        Ok(())
    }

    pub async fn current_model(&self) -> String {
        self.state.lock().await.model.clone()
    }

    /// Names of the models the inference server offers
    pub async fn available_models(&self) -> Result<Vec<String>> {
        Ok(self.inference.list_models().await?)
    }

    /// Look up instruments matching free text, e.g. before watching one
    pub async fn search_symbols(&self, query: &str) -> Result<Vec<SearchHit>> {
        Ok(self.quotes.search(query).await?)
    }

    /// Start tracking a symbol
    #[instrument(skip(self, name))]
    pub async fn watch(&self, symbol: &str, name: impl Into<String>) -> Result<Ticker> {
        let symbol = normalize_symbol(symbol)?;
        let _state = self.state.lock().await;
        let ticker = Ticker::new(&symbol, name);
        self.store.insert_ticker(ticker.clone()).await?;
        info!("Watching {}", ticker.symbol);
        Ok(ticker)
    }

    /// Attach an article to an existing ticker
    ///
    /// An article whose URL the ticker already owns is not added again; the
    /// stored one is returned instead.
    #[instrument(skip(self, content), fields(url = %content.url))]
    pub async fn add_article(&self, symbol: &str, content: NewArticle) -> Result<Article> {
        let _state = self.state.lock().await;
        let ticker = self.require_ticker(symbol).await?;
        let owned = self
            .store
            .articles(ArticleQuery::owned_by(&ticker.symbol))
            .await?;
        if let Some(existing) = owned.into_iter().find(|a| a.url == content.url) {
            debug!("Article already stored as {}", existing.id());
            return Ok(existing);
        }

        let article = Article::new(&ticker.symbol, content);
        self.store.insert_article(article.clone()).await?;
        Ok(article)
    }

    /// Delete an article together with its analysis
    #[instrument(skip(self))]
    pub async fn remove_article(&self, article_id: Uuid) -> Result<Article> {
        let _state = self.state.lock().await;
        let article = self
            .store
            .article(article_id)
            .await?
            .ok_or(SentimentError::UnknownArticle(article_id))?;
        self.store
            .commit(WriteBatch::new().delete_article(article_id))
            .await?;
        Ok(article)
    }

    /// Analyze one article unless it already has an analysis
    ///
    /// Failures after the article is found are wrapped in
    /// [`SentimentError::AnalysisFailed`] and leave the store untouched.
    #[instrument(skip(self))]
    pub async fn analyze_article(&self, article_id: Uuid) -> Result<AnalysisOutcome> {
        let state = self.state.lock().await;
        let outcome = self.analyze_locked(&state.model, article_id).await;
        outcome
    }

    /// Analyze a ticker's articles in ownership order, stopping at the first failure
    ///
    /// Returns how many articles were newly analyzed.
    #[instrument(skip(self))]
    pub async fn analyze_articles_for_ticker(&self, symbol: &str) -> Result<usize> {
        let state = self.state.lock().await;
        let ticker = self.require_ticker(symbol).await?;
        let analyzed = self.analyze_ticker_locked(&state.model, &ticker.symbol).await;
        analyzed
    }

    /// Analyze every ticker's articles, stopping at the first failure
    #[instrument(skip(self))]
    pub async fn analyze_all_tickers(&self) -> Result<usize> {
        let state = self.state.lock().await;
        let mut total = 0;
        for ticker in self.store.tickers().await? {
            total += self.analyze_ticker_locked(&state.model, &ticker.symbol).await?;
        }
        info!("Analyzed {total} articles across all tickers");
        Ok(total)
    }

    /// Refresh prices for `symbols`, ingest new articles and analyze them
    ///
    /// Quotes that fail are dropped. A quote for a symbol with no stored
    /// ticker is skipped; tickers are never created here.
    #[instrument(skip(self, symbols), fields(count = symbols.len()))]
    pub async fn refresh_and_analyze(&self, symbols: &[String]) -> Result<RefreshReport> {
        let quotes = self.quotes.fetch_quotes(symbols).await;

        let state = self.state.lock().await;
        let mut report = RefreshReport::default();

        for symbol in symbols {
            let symbol = symbol.trim().to_ascii_uppercase();
            let quoted = quotes.iter().any(|q| q.symbol.eq_ignore_ascii_case(&symbol));
            if !quoted && !report.unquoted.contains(&symbol) {
                report.unquoted.push(symbol);
            }
        }

        for quote in &quotes {
            let refreshed = self
                .refresh_ticker_locked(&state.model, quote)
                .await
                .map_err(|err| SentimentError::refresh_failed(&quote.symbol, err))?;
            let Some((symbol, added, analyzed)) = refreshed else {
                report.skipped.push(quote.symbol.clone());
                continue;
            };
            report.updated.push(symbol);
            report.articles_added += added;
            report.analyzed += analyzed;
        }

        info!(
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            unquoted = report.unquoted.len(),
            analyzed = report.analyzed,
            "Refresh complete"
        );
        Ok(report)
    }

    /// Display rows for every ticker, ordered by symbol
    pub async fn ticker_summaries(&self) -> Result<Vec<TickerSummary>> {
        let mut summaries = Vec::new();
        for ticker in self.store.tickers().await? {
            let articles = self
                .store
                .articles(ArticleQuery::owned_by(&ticker.symbol))
                .await?;
            summaries.push(TickerSummary::new(&ticker, &articles));
        }
        Ok(summaries)
    }

    /// Apply one quote, then ingest and analyze for its ticker
    ///
    /// Returns `None` when no ticker is stored for the quoted symbol, otherwise
    /// the stored symbol with the number of articles added and analyzed.
    async fn refresh_ticker_locked(
        &self,
        model: &str,
        quote: &Quote,
    ) -> Result<Option<(String, usize, usize)>> {
        let Some(mut ticker) = self.store.ticker(&quote.symbol).await? else {
            debug!(symbol = %quote.symbol, "No ticker for quoted symbol, skipping");
            return Ok(None);
        };

        ticker.apply_quote(quote);
        self.store
            .commit(WriteBatch::new().update_ticker(ticker.clone()))
            .await?;

        let added = self.ingest_locked(&ticker).await?;
        let analyzed = self.analyze_ticker_locked(model, &ticker.symbol).await?;
        Ok(Some((ticker.symbol, added, analyzed)))
    }

    async fn require_ticker(&self, symbol: &str) -> Result<Ticker> {
        self.store
            .ticker(symbol)
            .await?
            .ok_or_else(|| SentimentError::UnknownTicker(symbol.trim().to_ascii_uppercase()))
    }

    /// Pull new articles from the source and attach the ones with unseen URLs
    async fn ingest_locked(&self, ticker: &Ticker) -> Result<usize> {
        let fresh = self.articles.fetch_new_articles(ticker).await?;
        if fresh.is_empty() {
            return Ok(0);
        }

        let owned = self
            .store
            .articles(ArticleQuery::owned_by(&ticker.symbol))
            .await?;
        let mut seen: HashSet<String> = owned.into_iter().map(|a| a.url).collect();

        let mut batch = WriteBatch::new();
        let mut added = 0;
        for content in fresh {
            if seen.insert(content.url.clone()) {
                batch = batch.insert_article(Article::new(&ticker.symbol, content));
                added += 1;
            }
        }
        self.store.commit(batch).await?;
        debug!("Attached {added} new articles to {}", ticker.symbol);
        Ok(added)
    }

    async fn analyze_ticker_locked(&self, model: &str, symbol: &str) -> Result<usize> {
        let articles = self.store.articles(ArticleQuery::owned_by(symbol)).await?;
        let mut analyzed = 0;
        for article in articles.iter().filter(|a| !a.is_analyzed()) {
            if self.analyze_locked(model, article.id()).await?.is_new() {
                analyzed += 1;
            }
        }
        if analyzed > 0 {
            info!("Analyzed {analyzed} articles for {symbol}");
        }
        Ok(analyzed)
    }

    async fn analyze_locked(&self, model: &str, article_id: Uuid) -> Result<AnalysisOutcome> {
        let article = self
            .store
            .article(article_id)
            .await?
            .ok_or(SentimentError::UnknownArticle(article_id))?;

        if article.is_analyzed() {
            debug!("Article {article_id} already analyzed");
            return Ok(AnalysisOutcome::AlreadyAnalyzed);
        }

        let headline = article.headline.clone();
        self.score_article(model, article)
            .await
            .map(AnalysisOutcome::Analyzed)
            .map_err(|err| SentimentError::analysis_failed(article_id, &headline, err))
    }

    async fn score_article(&self, model: &str, mut article: Article) -> Result<SentimentAnalysis> {
        let prompt = self.prompt.render(&article)?;
        let judgment = self.inference.analyze_sentiment(&prompt, model).await?;

        let score = clamp_score(judgment.score).ok_or_else(|| {
            SentimentError::InvalidSentimentResponse(format!(
                "score {} is not a finite number",
                judgment.score
            ))
        })?;
        if score != judgment.score {
            debug!("Clamped score {} to {score}", judgment.score);
        }

        let analysis = SentimentAnalysis::new(article.id(), score, judgment.summary, model, Utc::now());
        article.attach_analysis(&analysis)?;
        self.store
            .commit(
                WriteBatch::new()
                    .update_article(article)
                    .insert_analysis(analysis.clone()),
            )
            .await?;

        Ok(analysis)
    }
}

impl std::fmt::Debug for SentimentOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentOrchestrator")
            .field("inference", &self.inference.name())
            .finish_non_exhaustive()
    }
}

fn validate_model(name: String) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SentimentError::Configuration(
            "model name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Builder for [`SentimentOrchestrator`]
pub struct SentimentOrchestratorBuilder {
    quotes: Option<Arc<dyn QuoteProvider>>,
    inference: Option<Arc<dyn InferenceProvider>>,
    store: Option<Arc<dyn RecordStore>>,
    articles: Arc<dyn ArticleSource>,
    model: String,
}

impl SentimentOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            quotes: None,
            inference: None,
            store: None,
            articles: Arc::new(NoArticleSource),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn quotes(mut self, quotes: Arc<dyn QuoteProvider>) -> Self {
        self.quotes = Some(quotes);
        self
    }

    pub fn inference(mut self, inference: Arc<dyn InferenceProvider>) -> Self {
        self.inference = Some(inference);
        self
    }

    pub fn store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the default source, which yields no articles
    pub fn article_source(mut self, articles: Arc<dyn ArticleSource>) -> Self {
        self.articles = articles;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a collaborator is missing or the
    /// model name is empty
    pub fn build(self) -> Result<SentimentOrchestrator> {
        let missing = |what: &str| SentimentError::Configuration(format!("{what} not set"));

        Ok(SentimentOrchestrator {
            quotes: self.quotes.ok_or_else(|| missing("quote provider"))?,
            inference: self.inference.ok_or_else(|| missing("inference provider"))?,
            store: self.store.ok_or_else(|| missing("record store"))?,
            articles: self.articles,
            prompt: SentimentPrompt::new()?,
            state: Mutex::new(WorkflowState {
                model: validate_model(self.model)?,
            }),
        })
    }
}

impl Default for SentimentOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
