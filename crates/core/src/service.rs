use crate::analysis;
use crate::domain::{market, AnalysisWindow, NewsArticle, PeerComparison, PriceSeries, TickerMatch};
use crate::market_data::MarketDataSource;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuote {
    pub date: NaiveDate,
    pub open: Option<Decimal>,
    pub close: Decimal,
}

/// Everything one analysis request produces, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReport {
    pub ticker: String,
    pub sector: String,
    pub window: AnalysisWindow,
    pub daily: Vec<DailyQuote>,
    pub comparison: PeerComparison,
    pub news: Vec<NewsArticle>,
}

impl StockReport {
    pub fn has_price_data(&self) -> bool {
        !self.daily.is_empty()
    }
}

#[derive(Clone)]
pub struct StockService {
    source: Arc<dyn MarketDataSource>,
}

impl StockService {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    pub fn provider_name(&self) -> &'static str {
        self.source.provider_name()
    }

    /// Fetches the ticker's data over `window` and runs the analysis against
    /// the ticker's sector peers over the same dates.
    pub async fn analyze(&self, ticker: &str, window: AnalysisWindow) -> StockReport {
        let ticker = market::normalize_ticker(ticker);

        // Sources may hand back dates outside `window`.
        let closing = self
            .source
            .fetch_closing_prices(&ticker, &window)
            .await
            .within(&window);
        let opening = self
            .source
            .fetch_opening_prices(&ticker, &window)
            .await
            .within(&window);
        let sector = self.source.fetch_sector(&ticker).await;

        let peers: Vec<PriceSeries> = if market::is_unknown_sector(&sector) {
            Vec::new()
        } else {
            self.source
                .fetch_peers(&ticker, &sector, &window)
                .await
                .into_iter()
                .map(|p| p.within(&window))
                .collect()
        };

        let news = self.source.fetch_news(&ticker).await;
        let comparison = analysis::compare_to_peers(&closing, &peers);

        tracing::info!(
            ticker = %ticker,
            sector = %sector,
            provider = self.source.provider_name(),
            observations = closing.len(),
            peers = comparison.peers.len(),
            recommendation = comparison.target.recommendation.label(),
            "analysis complete"
        );

        StockReport {
            daily: daily_quotes(&closing, &opening),
            ticker,
            sector,
            window,
            comparison,
            news,
        }
    }

    pub async fn current_price(&self, ticker: &str) -> Option<Decimal> {
        self.source
            .fetch_current_price(&market::normalize_ticker(ticker))
            .await
    }

    pub async fn news(&self, ticker: &str) -> Vec<NewsArticle> {
        self.source.fetch_news(&market::normalize_ticker(ticker)).await
    }

    pub async fn search(&self, query: &str) -> Vec<TickerMatch> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        self.source.search_tickers(query).await
    }
}

/// One row per closing observation; the opening price is `None` when the
/// source had none for that day.
fn daily_quotes(closing: &PriceSeries, opening: &PriceSeries) -> Vec<DailyQuote> {
    closing
        .iter()
        .map(|(date, close)| DailyQuote {
            date,
            open: opening.get(date),
            close,
        })
        .collect()
}
