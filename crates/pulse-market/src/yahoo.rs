//! Yahoo Finance API client

use crate::cache::SearchCache;
use crate::config::YahooConfig;
use crate::error::{QuoteError, Result};
use crate::quote::{Quote, QuoteProvider, SearchHit, normalize_symbol};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Yahoo Finance API client
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    config: YahooConfig,
    rate_limiter: SharedRateLimiter,
    search_cache: SearchCache,
}

impl YahooClient {
    /// Create a client with custom configuration
    pub fn with_config(config: YahooConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        // A zero budget is rejected by config validation upstream
        let per_minute = NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));
        let search_cache = SearchCache::new(config.search_cache_ttl);

        Ok(Self {
            client,
            config,
            rate_limiter,
            search_cache,
        })
    }

    /// Create a client with default endpoints
    pub fn new() -> Result<Self> {
        Self::with_config(YahooConfig::default())
    }

    /// Get the current configuration
    pub fn config(&self) -> &YahooConfig {
        &self.config
    }

    /// Chart endpoint for a single symbol, one day at daily interval
    pub fn chart_url(&self, symbol: &str) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/v8/finance/chart/{}",
            self.config.chart_base.trim_end_matches('/'),
            symbol
        ))?;
        url.query_pairs_mut()
            .append_pair("interval", "1d")
            .append_pair("range", "1d");
        Ok(url)
    }

    /// Search endpoint for a free-text query
    pub fn search_url(&self, query: &str) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/v1/finance/search",
            self.config.search_base.trim_end_matches('/')
        ))?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(QuoteError::HttpStatus { status, body });
        }

        Ok(response.text().await?)
    }

    async fn search_uncached(&self, query: &str) -> Result<Vec<SearchHit>> {
        let url = self.search_url(query)?;
        let body = self.get_text(url).await?;
        parse_search(&body)
    }
}

#[async_trait]
impl QuoteProvider for YahooClient {
    #[instrument(skip(self), fields(chart_base = %self.config.chart_base))]
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = normalize_symbol(symbol)?;
        let url = self.chart_url(&symbol)?;
        debug!("Requesting chart for {}", symbol);

        let body = self.get_text(url).await?;
        parse_chart(&symbol, &body, Utc::now())
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        self.search_cache
            .get_or_fetch(query, || self.search_uncached(query))
            .await
    }
}

// ============================================================================
// Yahoo Finance response structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: Option<String>,
    currency: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
struct SearchQuote {
    symbol: Option<String>,
    #[serde(rename = "shortname")]
    short_name: Option<String>,
    #[serde(rename = "longname")]
    long_name: Option<String>,
    exchange: Option<String>,
    #[serde(rename = "quoteType")]
    quote_type: Option<String>,
}

/// Decode a chart response into a quote
///
/// `received_at` stands in for the observation time when the payload omits
/// `regularMarketTime`.
pub fn parse_chart(requested: &str, body: &str, received_at: DateTime<Utc>) -> Result<Quote> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.chart.error.filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(QuoteError::YahooFinanceError(description));
    }

    let missing = |field| QuoteError::MissingField {
        symbol: requested.to_string(),
        field,
    };

    let meta = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| missing("chart.result[0]"))?
        .meta
        .ok_or_else(|| missing("meta"))?;

    let price = meta
        .regular_market_price
        .ok_or_else(|| missing("regularMarketPrice"))?;
    let currency = meta.currency.ok_or_else(|| missing("currency"))?;
    let symbol = requested.to_ascii_uppercase();
    if let Some(reported) = meta.symbol.filter(|s| !s.eq_ignore_ascii_case(&symbol)) {
        debug!(requested = %symbol, %reported, "Chart reports a different symbol");
    }

    let observed_at = meta
        .regular_market_time
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(received_at);

    Ok(Quote {
        symbol,
        price,
        currency,
        observed_at,
    })
}

/// Decode a search response, dropping entries without a symbol
pub fn parse_search(body: &str) -> Result<Vec<SearchHit>> {
    let envelope: SearchEnvelope = serde_json::from_str(body)?;

    Ok(envelope
        .quotes
        .into_iter()
        .filter_map(|q| {
            let symbol = q.symbol?;
            Some(SearchHit {
                symbol,
                name: q.short_name.or(q.long_name),
                exchange: q.exchange,
                quote_type: q.quote_type,
            })
        })
        .collect())
}
