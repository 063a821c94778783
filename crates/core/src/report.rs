//! Text and JSON renderings of a [`StockReport`].
//!
//! This is the only place numbers get rounded.

use crate::domain::{AnalysisResult, PricePoint};
use crate::service::StockReport;
use anyhow::Context;
use rust_decimal::{Decimal, RoundingStrategy};

pub fn render_text(report: &StockReport) -> String {
    let mut out = String::new();
    let target = &report.comparison.target;

    out.push_str("Stock Analysis Summary:\n");
    out.push_str(&format!("Stock Symbol: {}\n", report.ticker));
    out.push_str(&format!("Sector: {}\n", report.sector));
    out.push_str(&format!("Start Date: {}\n", report.window.start));
    out.push_str(&format!("End Date: {}\n", report.window.end));

    out.push_str("Daily Opening and Closing Prices:\n");
    if report.daily.is_empty() {
        out.push_str(&format!("No price data available for {}.\n", report.ticker));
    }
    for day in &report.daily {
        let open = day
            .open
            .map(|p| p.normalize().to_string())
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!(
            "Date: {} | Opening Price: {} | Closing Price: {}\n",
            day.date,
            open,
            day.close.normalize()
        ));
    }

    out.push_str(&format!(
        "Percentage Change Over Period: {}%\n",
        two_places(target.percentage_change)
    ));
    out.push_str(&format!("Recommendation: {}\n", target.recommendation));
    out.push_str(&format!("Highest Closing Price: {}\n", price_point(target.highest)));
    out.push_str(&format!("Lowest Closing Price: {}\n", price_point(target.lowest)));

    out.push_str("\nComparison with Competing Stocks:\n");
    if report.comparison.is_empty() {
        out.push_str("No competing stocks available for comparison.\n");
    } else {
        out.push_str("Ticker Symbol  | Avg Closing Price | % Change\n");
        for row in std::iter::once(target).chain(&report.comparison.peers) {
            out.push_str(&comparison_row(row));
            out.push('\n');
        }
    }

    out.push_str(&format!("\nLatest News Articles for {}:\n", report.ticker));
    if report.news.is_empty() {
        out.push_str(&format!("No news articles found for {}.\n", report.ticker));
    }
    for article in &report.news {
        if article.url.is_empty() {
            out.push_str(&format!("- {}\n", article.title));
        } else {
            out.push_str(&format!("- {} - {}\n", article.title, article.url));
        }
    }

    out
}

pub fn render_json(report: &StockReport) -> anyhow::Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize stock report")
}

fn comparison_row(r: &AnalysisResult) -> String {
    format!(
        "{:<14} | {:<17} | {}%",
        r.ticker,
        two_places(r.average_price),
        two_places(r.percentage_change)
    )
}

fn price_point(p: Option<PricePoint>) -> String {
    match p {
        Some(p) => format!("{} on {}", p.price.normalize(), p.date),
        None => "n/a".to_string(),
    }
}

/// Half-away-from-zero rounding to exactly two decimal places.
pub fn two_places(v: Decimal) -> String {
    let mut r = v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    r.rescale(2);
    r.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis;
    use crate::domain::{AnalysisWindow, NewsArticle, PriceSeries};
    use crate::service::DailyQuote;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn report() -> StockReport {
        let closing = PriceSeries::new(
            "MSFT",
            [
                (d(2024, 1, 1), dec!(100)),
                (d(2024, 1, 5), dec!(80)),
                (d(2024, 1, 10), dec!(120)),
            ],
        );
        let peer = PriceSeries::new(
            "ORCL",
            [(d(2024, 1, 1), dec!(30)), (d(2024, 1, 10), dec!(31))],
        );

        StockReport {
            ticker: "MSFT".to_string(),
            sector: "SERVICES-PREPACKAGED SOFTWARE".to_string(),
            window: AnalysisWindow::new(d(2024, 1, 1), d(2024, 1, 10)).unwrap(),
            daily: vec![
                DailyQuote {
                    date: d(2024, 1, 1),
                    open: Some(dec!(99.5000)),
                    close: dec!(100),
                },
                DailyQuote {
                    date: d(2024, 1, 5),
                    open: None,
                    close: dec!(80),
                },
                DailyQuote {
                    date: d(2024, 1, 10),
                    open: Some(dec!(118)),
                    close: dec!(120),
                },
            ],
            comparison: analysis::compare_to_peers(&closing, &[peer]),
            news: vec![NewsArticle {
                title: "Cloud revenue beats".to_string(),
                url: "https://example.com/msft".to_string(),
            }],
        }
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(two_places(dec!(20)), "20.00");
        assert_eq!(two_places(dec!(3.333333)), "3.33");
        assert_eq!(two_places(dec!(2.345)), "2.35");
        assert_eq!(two_places(dec!(-2.345)), "-2.35");
    }

    #[test]
    fn text_summary_lists_metrics_and_peers() {
        let text = render_text(&report());

        assert!(text.contains("Stock Symbol: MSFT"));
        assert!(text.contains("Start Date: 2024-01-01"));
        assert!(text.contains("Date: 2024-01-01 | Opening Price: 99.5 | Closing Price: 100"));
        assert!(text.contains("Date: 2024-01-05 | Opening Price: n/a | Closing Price: 80"));
        assert!(text.contains("Percentage Change Over Period: 20.00%"));
        assert!(text.contains("Recommendation: Buy (positive trend)"));
        assert!(text.contains("Highest Closing Price: 120 on 2024-01-10"));
        assert!(text.contains("Lowest Closing Price: 80 on 2024-01-05"));
        assert!(text.contains("MSFT           | 100.00            | 20.00%"));
        assert!(text.contains("ORCL           | 30.50             | 3.33%"));
        assert!(text.contains("- Cloud revenue beats - https://example.com/msft"));

        let table = text
            .lines()
            .skip_while(|l| !l.starts_with("Ticker Symbol"))
            .take(3)
            .collect::<Vec<_>>();
        assert_eq!(table[1], "MSFT           | 100.00            | 20.00%");
        assert_eq!(table[2], "ORCL           | 30.50             | 3.33%");
    }

    #[test]
    fn empty_report_renders_neutral_values() {
        let empty = PriceSeries::empty("ZZZZ");
        let report = StockReport {
            ticker: "ZZZZ".to_string(),
            sector: "Unknown".to_string(),
            window: AnalysisWindow::new(d(2024, 2, 1), d(2024, 2, 14)).unwrap(),
            daily: Vec::new(),
            comparison: analysis::compare_to_peers(&empty, &[]),
            news: Vec::new(),
        };

        let text = render_text(&report);
        assert!(text.contains("Start Date: 2024-02-01"));
        assert!(text.contains("No price data available for ZZZZ."));
        assert!(text.contains("Percentage Change Over Period: 0.00%"));
        assert!(text.contains("Recommendation: Hold (neutral trend)"));
        assert!(text.contains("Highest Closing Price: n/a"));
        assert!(text.contains("No competing stocks available for comparison."));
        assert!(text.contains("No news articles found for ZZZZ."));
    }

    #[test]
    fn json_keeps_full_precision() {
        let json = render_json(&report()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(v["comparison"]["target"]["recommendation"], "Buy");
        let peer_change = v["comparison"]["peers"][0]["percentage_change"]
            .as_str()
            .unwrap();
        assert!(peer_change.starts_with("3.333333"));

        let back: StockReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report());
    }
}
