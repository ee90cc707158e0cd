//! Command-line interface for pulse
//!
//! Tracks a watch-list of tickers, refreshes their prices and scores attached
//! articles with a local model.
//!
//! # Usage
//!
//! ```bash
//! # Point at a local Ollama server (defaults to http://localhost:11434)
//! export OLLAMA_HOST="127.0.0.1:11434"
//!
//! pulse watch AAPL --name "Apple Inc."
//! pulse add-article AAPL --headline "Apple beats estimates" --url https://news.example/aapl
//! pulse refresh
//! pulse tickers
//! ```

mod table;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use pulse_core::{AnalysisOutcome, JsonFileStore, NewArticle, SentimentOrchestrator};
use pulse_llm::providers::{OllamaClient, OllamaConfig};
use pulse_market::{YahooClient, YahooConfig};
use pulse_utils::{Config, LogFormat};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(about = "Watch-list price refresh and local-model news sentiment", long_about = None)]
struct Cli {
    /// Model used for sentiment analysis (overrides PULSE_MODEL)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Path of the JSON record store (overrides PULSE_STORE)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start tracking a symbol
    Watch {
        symbol: String,
        /// Display name (defaults to the symbol)
        #[arg(long)]
        name: Option<String>,
    },
    /// Attach an article to a watched symbol
    AddArticle {
        symbol: String,
        #[arg(long)]
        headline: String,
        #[arg(long)]
        url: String,
        #[arg(long, default_value = "")]
        summary: String,
        /// RFC 3339 timestamp (defaults to now)
        #[arg(long, value_parser = parse_timestamp)]
        published: Option<DateTime<Utc>>,
    },
    /// Delete an article and its analysis
    RemoveArticle { id: Uuid },
    /// Refresh prices and analyze new articles (all watched symbols if none given)
    Refresh { symbols: Vec<String> },
    /// Analyze unanalyzed articles
    Analyze {
        /// Only this symbol's articles
        #[arg(long, conflicts_with = "article")]
        symbol: Option<String>,
        /// Only this article
        #[arg(long)]
        article: Option<Uuid>,
    },
    /// Show watched tickers with their average sentiment
    Tickers {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List models offered by the inference server
    Models,
    /// Search for symbols by name
    Search { query: String },
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

async fn build_orchestrator(config: &Config) -> anyhow::Result<SentimentOrchestrator> {
    let quotes = YahooClient::with_config(
        YahooConfig::new()
            .with_timeout(config.request_timeout_secs)
            .with_rate_limit(config.quote_rate_limit)
            .with_search_cache_ttl(Duration::from_secs(config.search_cache_ttl_secs)),
    )?;
    let inference = OllamaClient::with_config(
        OllamaConfig::new(&config.ollama_host).with_timeout(config.request_timeout_secs),
    )?;
    let store = JsonFileStore::open(&config.store_path)
        .await
        .with_context(|| format!("Failed to open store {}", config.store_path.display()))?;

    Ok(SentimentOrchestrator::builder()
        .quotes(Arc::new(quotes))
        .inference(Arc::new(inference))
        .store(Arc::new(store))
        .model(config.model.clone())
        .build()?)
}

async fn run(command: Command, orchestrator: &SentimentOrchestrator) -> anyhow::Result<()> {
    match command {
        Command::Watch { symbol, name } => {
            let name = name.unwrap_or_else(|| symbol.trim().to_ascii_uppercase());
            let ticker = orchestrator.watch(&symbol, name).await?;
            println!("Watching {} ({})", ticker.symbol, ticker.name);
        }
        Command::AddArticle {
            symbol,
            headline,
            url,
            summary,
            published,
        } => {
            let article = orchestrator
                .add_article(
                    &symbol,
                    NewArticle {
                        headline,
                        summary,
                        published_at: published.unwrap_or_else(Utc::now),
                        url,
                    },
                )
                .await?;
            println!("Article {} attached to {}", article.id(), article.ticker());
        }
        Command::RemoveArticle { id } => {
            let article = orchestrator.remove_article(id).await?;
            println!("Removed {:?} from {}", article.headline, article.ticker());
        }
        Command::Refresh { symbols } => {
            let symbols = if symbols.is_empty() {
                orchestrator.watched_symbols().await?
            } else {
                symbols
            };
            let report = orchestrator.refresh_and_analyze(&symbols).await?;
            println!("{}", table::refresh_report(&report));
        }
        Command::Analyze { symbol, article } => match (symbol, article) {
            (_, Some(id)) => match orchestrator.analyze_article(id).await? {
                AnalysisOutcome::Analyzed(analysis) => {
                    println!("Scored {:+.2}: {}", analysis.score, analysis.rationale);
                }
                AnalysisOutcome::AlreadyAnalyzed => println!("Article {id} was already analyzed"),
            },
            (Some(symbol), None) => {
                let count = orchestrator.analyze_articles_for_ticker(&symbol).await?;
                println!("Analyzed {count} articles for {}", symbol.to_ascii_uppercase());
            }
            (None, None) => {
                let count = orchestrator.analyze_all_tickers().await?;
                println!("Analyzed {count} articles");
            }
        },
        Command::Tickers { json } => {
            let summaries = orchestrator.ticker_summaries().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                println!("{}", table::ticker_summaries(&summaries));
            }
        }
        Command::Models => {
            let current = orchestrator.current_model().await;
            for model in orchestrator.available_models().await? {
                let marker = if model == current || model.split(':').next() == Some(current.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {model}");
            }
        }
        Command::Search { query } => {
            let hits = orchestrator.search_symbols(&query).await?;
            println!("{}", table::search_hits(&hits));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pulse_utils::init_tracing_with(LogFormat::from_env(), "warn,pulse_core=info");

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    config.validate()?;

    info!(model = %config.model, store = %config.store_path.display(), "Starting pulse");

    let orchestrator = build_orchestrator(&config).await?;
    run(cli.command, &orchestrator).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_refresh_symbols() {
        let cli = Cli::try_parse_from(["pulse", "--model", "mistral", "refresh", "AAPL", "MSFT"]).unwrap();
        assert_eq!(cli.model.as_deref(), Some("mistral"));
        match cli.command {
            Command::Refresh { symbols } => assert_eq!(symbols, vec!["AAPL", "MSFT"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_analyze_symbol_conflicts_with_article() {
        let id = Uuid::new_v4().to_string();
        let result = Cli::try_parse_from(["pulse", "analyze", "--symbol", "AAPL", "--article", &id]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2024-05-01T14:30:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T12:30:00+00:00");
        assert!(parse_timestamp("yesterday").is_err());
    }
}
