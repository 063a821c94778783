//! Market data collaborators.
//!
//! Sources never fail towards the caller: every upstream problem (network,
//! rate limit, unknown ticker, unexpected payload) is logged and replaced by
//! the empty value of the method's return type.

pub mod alpha_vantage;
pub mod error;
pub mod http;
pub mod memory;
pub mod polygon;

use crate::config::{ProviderKind, Settings};
use crate::domain::{AnalysisWindow, NewsArticle, PriceSeries, TickerMatch};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

pub use alpha_vantage::AlphaVantageClient;
pub use error::ProviderError;
pub use memory::InMemoryMarketData;
pub use polygon::PolygonClient;

#[async_trait::async_trait]
pub trait MarketDataSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Daily closes of `ticker` dated inside `range`.
    async fn fetch_closing_prices(&self, ticker: &str, range: &AnalysisWindow) -> PriceSeries;

    /// Daily opens of `ticker` dated inside `range`.
    async fn fetch_opening_prices(&self, ticker: &str, range: &AnalysisWindow) -> PriceSeries;

    /// Sector label, or [`crate::domain::UNKNOWN_SECTOR`].
    async fn fetch_sector(&self, ticker: &str) -> String;

    /// Closing series over `range` of tickers in `sector` other than `target`.
    /// Empty when the provider cannot enumerate peers.
    async fn fetch_peers(
        &self,
        target: &str,
        sector: &str,
        range: &AnalysisWindow,
    ) -> Vec<PriceSeries>;

    async fn fetch_current_price(&self, ticker: &str) -> Option<Decimal>;

    async fn fetch_news(&self, ticker: &str) -> Vec<NewsArticle>;

    async fn search_tickers(&self, query: &str) -> Vec<TickerMatch>;
}

/// Builds the source selected in `settings`.
pub fn from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn MarketDataSource>> {
    let source: Arc<dyn MarketDataSource> = match settings.provider {
        ProviderKind::Polygon => Arc::new(PolygonClient::from_settings(settings)?),
        ProviderKind::AlphaVantage => Arc::new(AlphaVantageClient::from_settings(settings)?),
    };
    tracing::info!(provider = source.provider_name(), "market data source configured");
    Ok(source)
}

/// Unwraps a fallible provider call, logging the failure and substituting
/// `fallback`.
pub(crate) fn or_degrade<T>(
    res: anyhow::Result<T>,
    provider: &'static str,
    operation: &'static str,
    subject: &str,
    fallback: T,
) -> T {
    match res {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!(
                provider,
                operation,
                subject,
                error = %format_args!("{err:#}"),
                "market data unavailable; using empty result"
            );
            fallback
        }
    }
}

/// Reads a price from a JSON number or numeric string without going through
/// binary floating point where possible.
pub(crate) fn decimal_from_json(v: &Value) -> Option<Decimal> {
    let text = match v {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
