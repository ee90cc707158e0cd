//! Table rendering for command output

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use pulse_core::{RefreshReport, TickerSummary};
use pulse_market::SearchHit;

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

fn price(summary: &TickerSummary) -> String {
    match (summary.price, summary.currency.as_deref()) {
        (Some(price), Some(currency)) => format!("{price:.2} {currency}"),
        (Some(price), None) => format!("{price:.2}"),
        _ => "-".to_string(),
    }
}

pub fn ticker_summaries(summaries: &[TickerSummary]) -> Table {
    let mut table = new_table(&["Symbol", "Name", "Price", "Articles", "Analyzed", "Sentiment", "Label"]);
    for summary in summaries {
        table.add_row(vec![
            Cell::new(&summary.symbol),
            Cell::new(&summary.name),
            Cell::new(price(summary)).set_alignment(CellAlignment::Right),
            Cell::new(summary.article_count).set_alignment(CellAlignment::Right),
            Cell::new(summary.analyzed_count).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:+.2}", summary.average_sentiment)).set_alignment(CellAlignment::Right),
            Cell::new(summary.label()),
        ]);
    }
    table
}

pub fn search_hits(hits: &[SearchHit]) -> Table {
    let mut table = new_table(&["Symbol", "Name", "Exchange", "Type"]);
    for hit in hits {
        table.add_row(vec![
            hit.symbol.as_str(),
            hit.name.as_deref().unwrap_or("-"),
            hit.exchange.as_deref().unwrap_or("-"),
            hit.quote_type.as_deref().unwrap_or("-"),
        ]);
    }
    table
}

pub fn refresh_report(report: &RefreshReport) -> Table {
    let mut table = new_table(&["", "Count", "Symbols"]);
    let rows = [
        ("Updated", &report.updated),
        ("Not watched", &report.skipped),
        ("No quote", &report.unquoted),
    ];
    for (label, symbols) in rows {
        table.add_row(vec![
            label.to_string(),
            symbols.len().to_string(),
            symbols.join(", "),
        ]);
    }
    table.add_row(vec![
        "Articles added".to_string(),
        report.articles_added.to_string(),
        String::new(),
    ]);
    table.add_row(vec![
        "Articles analyzed".to_string(),
        report.analyzed.to_string(),
        String::new(),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(price: Option<f64>, average: f64) -> TickerSummary {
        TickerSummary {
            symbol: "AAPL".to_string(),
            name: "Apple Inc.".to_string(),
            price,
            currency: price.map(|_| "USD".to_string()),
            article_count: 3,
            analyzed_count: 2,
            average_sentiment: average,
        }
    }

    #[test]
    fn test_ticker_table() {
        let rendered = ticker_summaries(&[summary(Some(189.5), 0.45)]).to_string();
        assert!(rendered.contains("AAPL"));
        assert!(rendered.contains("189.50 USD"));
        assert!(rendered.contains("+0.45"));
        assert!(rendered.contains("positive"));
    }

    #[test]
    fn test_unpriced_ticker() {
        let rendered = ticker_summaries(&[summary(None, -0.1)]).to_string();
        assert!(rendered.contains("-0.10"));
        assert!(rendered.contains("neutral"));
    }

    #[test]
    fn test_refresh_report_table() {
        let report = RefreshReport {
            updated: vec!["AAPL".to_string(), "MSFT".to_string()],
            unquoted: vec!["BAD1".to_string()],
            analyzed: 4,
            ..RefreshReport::default()
        };
        let rendered = refresh_report(&report).to_string();
        assert!(rendered.contains("AAPL, MSFT"));
        assert!(rendered.contains("BAD1"));
    }
}
