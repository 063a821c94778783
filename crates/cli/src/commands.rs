use anyhow::Context;
use clap::{Subcommand, ValueEnum};
use stockscope_core::domain::market;
use stockscope_core::report;
use stockscope_core::service::StockService;
use stockscope_core::time::window;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a ticker's closing prices and compare it with sector peers.
    Analyze {
        ticker: String,

        /// First day of the window (YYYY-MM-DD). Defaults to the lookback before the end date.
        #[arg(long)]
        start_date: Option<String>,

        /// Last day of the window (YYYY-MM-DD). Defaults to today (UTC).
        #[arg(long)]
        end_date: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the latest traded price.
    Price { ticker: String },

    /// List recent news headlines.
    News { ticker: String },

    /// Look up ticker symbols by name or symbol fragment.
    Search { query: String },
}

pub async fn run(
    command: &Command,
    service: &StockService,
    lookback_days: i64,
) -> anyhow::Result<String> {
    match command {
        Command::Analyze {
            ticker,
            start_date,
            end_date,
            format,
        } => {
            let ticker = market::parse_ticker(ticker)?;
            let window = window::resolve_window(
                start_date.as_deref(),
                end_date.as_deref(),
                window::today_utc(),
                lookback_days,
            )?;
            let report = service.analyze(&ticker, window).await;
            if !report.has_price_data() {
                tracing::warn!(
                    ticker = %report.ticker,
                    start = %window.start,
                    end = %window.end,
                    "no closing prices in window; report is neutral"
                );
            }
            match format {
                OutputFormat::Text => Ok(report::render_text(&report)),
                OutputFormat::Json => report::render_json(&report),
            }
        }
        Command::Price { ticker } => {
            let ticker = market::parse_ticker(ticker)?;
            let price = service
                .current_price(&ticker)
                .await
                .with_context(|| format!("no current price available for {ticker}"))?;
            Ok(format!("{ticker}: {}", price.normalize()))
        }
        Command::News { ticker } => {
            let ticker = market::parse_ticker(ticker)?;
            let articles = service.news(&ticker).await;
            if articles.is_empty() {
                return Ok(format!("No news articles found for {ticker}."));
            }
            Ok(articles
                .iter()
                .map(|a| format!("- {} - {}", a.title, a.url))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        Command::Search { query } => {
            let matches = service.search(query).await;
            anyhow::ensure!(!matches.is_empty(), "no tickers match {query:?}");
            Ok(matches
                .iter()
                .map(|m| format!("{:<10} {}", m.ticker, m.name))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use stockscope_core::domain::{NewsArticle, PriceSeries};
    use stockscope_core::market_data::InMemoryMarketData;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn service() -> StockService {
        let source = InMemoryMarketData::new()
            .with_closing(PriceSeries::new(
                "IBM",
                [(d(2024, 1, 1), dec!(100)), (d(2024, 1, 10), dec!(97))],
            ))
            .with_current_price("IBM", dec!(165.4300))
            .with_news(
                "IBM",
                vec![NewsArticle {
                    title: "Mainframe refresh".to_string(),
                    url: "https://example.com/ibm".to_string(),
                }],
            )
            .with_listing("IBM", "International Business Machines");
        StockService::new(Arc::new(source))
    }

    fn analyze(ticker: &str, format: OutputFormat) -> Command {
        Command::Analyze {
            ticker: ticker.to_string(),
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-10".to_string()),
            format,
        }
    }

    #[tokio::test]
    async fn analyze_prints_text_report() {
        let out = run(&analyze("ibm", OutputFormat::Text), &service(), 14)
            .await
            .unwrap();

        assert!(out.contains("Stock Symbol: IBM"));
        assert!(out.contains("Percentage Change Over Period: -3.00%"));
        assert!(out.contains("Recommendation: Hold (neutral trend)"));
    }

    #[tokio::test]
    async fn analyze_prints_json_report() {
        let out = run(&analyze("IBM", OutputFormat::Json), &service(), 14)
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(v["comparison"]["target"]["recommendation"], "Hold");
    }

    #[tokio::test]
    async fn analyze_rejects_reversed_window() {
        let cmd = Command::Analyze {
            ticker: "IBM".to_string(),
            start_date: Some("2024-02-01".to_string()),
            end_date: Some("2024-01-01".to_string()),
            format: OutputFormat::Text,
        };
        assert!(run(&cmd, &service(), 14).await.is_err());
    }

    #[tokio::test]
    async fn lookups_format_results_or_fail() {
        let svc = service();

        let price = run(&Command::Price { ticker: "ibm".to_string() }, &svc, 14)
            .await
            .unwrap();
        assert_eq!(price, "IBM: 165.43");

        let missing = run(&Command::Price { ticker: "ZZZZ".to_string() }, &svc, 14).await;
        assert!(missing.is_err());

        let hostile = run(&Command::News { ticker: "IBM/../x?".to_string() }, &svc, 14).await;
        assert!(hostile.is_err());

        let news = run(&Command::News { ticker: "IBM".to_string() }, &svc, 14)
            .await
            .unwrap();
        assert_eq!(news, "- Mainframe refresh - https://example.com/ibm");

        let no_news = run(&Command::News { ticker: "AAPL".to_string() }, &svc, 14)
            .await
            .unwrap();
        assert_eq!(no_news, "No news articles found for AAPL.");

        let hits = run(&Command::Search { query: "business".to_string() }, &svc, 14)
            .await
            .unwrap();
        assert!(hits.starts_with("IBM"));
    }
}
