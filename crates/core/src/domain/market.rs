use serde::{Deserialize, Serialize};

/// Sector label returned when a provider cannot classify a ticker.
pub const UNKNOWN_SECTOR: &str = "Unknown";

const MAX_TICKER_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerMatch {
    pub ticker: String,
    pub name: String,
}

/// Trims and upper-cases a user-supplied ticker symbol.
pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Normalizes `raw` and accepts it only as a plain exchange symbol: ASCII
/// letters, digits, `.` and `-`. Tickers end up in provider URL paths.
pub fn parse_ticker(raw: &str) -> anyhow::Result<String> {
    let ticker = normalize_ticker(raw);
    anyhow::ensure!(!ticker.is_empty(), "ticker is required");
    anyhow::ensure!(
        ticker.len() <= MAX_TICKER_LEN
            && ticker
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-'),
        "invalid ticker symbol {ticker:?}"
    );
    Ok(ticker)
}

pub fn is_unknown_sector(sector: &str) -> bool {
    let s = sector.trim();
    s.is_empty() || s.eq_ignore_ascii_case(UNKNOWN_SECTOR)
}
