//! Shared fixtures for the orchestrator integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mockall::mock;
use pulse_core::{
    Article, ArticleQuery, InMemoryStore, NewArticle, RecordStore, SentimentAnalysis,
    SentimentOrchestrator, StoreError, StoreResult, Ticker, WriteBatch,
};
use pulse_llm::{GenerateResponse, InferenceError, InferenceProvider};
use pulse_market::{Quote, QuoteError, QuoteProvider, SearchHit};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

mock! {
    pub Quotes {}

    #[async_trait]
    impl QuoteProvider for Quotes {
        async fn fetch_quote(&self, symbol: &str) -> pulse_market::Result<Quote>;
        async fn search(&self, query: &str) -> pulse_market::Result<Vec<SearchHit>>;
    }
}

pub fn quote(symbol: &str, price: f64) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        price,
        currency: "USD".to_string(),
        observed_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    }
}

/// Quote mock that prices every symbol at 100 except those starting with `BAD`
pub fn quotes_failing_bad() -> MockQuotes {
    let mut quotes = MockQuotes::new();
    quotes.expect_fetch_quote().returning(|symbol| {
        if symbol.starts_with("BAD") {
            Err(QuoteError::HttpStatus {
                status: 404,
                body: "Not Found".to_string(),
            })
        } else {
            Ok(quote(symbol, 100.0))
        }
    });
    quotes
}

/// Inference fake that replays scripted envelopes in order
///
/// Once the script runs out it keeps returning `fallback`, or an
/// `UnexpectedResponse` error when there is none.
pub struct ScriptedInference {
    script: Mutex<VecDeque<pulse_llm::Result<GenerateResponse>>>,
    fallback: Option<GenerateResponse>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedInference {
    pub fn new(script: Vec<pulse_llm::Result<GenerateResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the given score
    pub fn always(score: f64) -> Self {
        let mut fake = Self::new(Vec::new());
        fake.fallback = Some(scored(score, "steady"));
        fake
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceProvider for ScriptedInference {
    async fn generate(&self, prompt: &str, _model: &str) -> pulse_llm::Result<GenerateResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        // Yield so concurrent callers get a chance to interleave
        tokio::task::yield_now().await;

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(reply) => reply,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| InferenceError::UnexpectedResponse("script exhausted".to_string())),
        }
    }

    async fn list_models(&self) -> pulse_llm::Result<Vec<String>> {
        Ok(vec!["llama3.2:latest".to_string(), "mistral:7b".to_string()])
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Envelope whose `response` string carries the judgment
pub fn scored(score: f64, summary: &str) -> GenerateResponse {
    GenerateResponse::from_text(json!({"score": score, "summary": summary}).to_string())
}

/// Envelope that only carries the judgment as an envelope-level object
pub fn envelope_scored(score: f64, summary: &str) -> GenerateResponse {
    GenerateResponse::from_text("The outlook seems fine.")
        .with_field("sentiment", json!({"score": score, "summary": summary}))
}

/// Store wrapper whose commits can be switched to fail
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryStore,
    pub fail_commits: AtomicBool,
}

impl FlakyStore {
    pub fn fail(&self) {
        self.fail_commits.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
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

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.commit(batch).await
    }
}

pub fn news(headline: &str) -> NewArticle {
    NewArticle {
        headline: headline.to_string(),
        summary: format!("{headline} in detail"),
        published_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        url: format!("https://news.example/{}", headline.replace(' ', "-").to_lowercase()),
    }
}

pub fn orchestrator(
    quotes: MockQuotes,
    inference: Arc<ScriptedInference>,
    store: Arc<dyn RecordStore>,
) -> SentimentOrchestrator {
    SentimentOrchestrator::builder()
        .quotes(Arc::new(quotes))
        .inference(inference)
        .store(store)
        .build()
        .unwrap()
}

/// Orchestrator over a fresh in-memory store with unused quotes
pub fn with_inference(inference: Arc<ScriptedInference>) -> (SentimentOrchestrator, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let orchestrator = orchestrator(MockQuotes::new(), inference, store.clone());
    (orchestrator, store)
}
