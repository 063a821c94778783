use crate::domain::{market, AnalysisWindow, NewsArticle, PriceSeries, TickerMatch, UNKNOWN_SECTOR};
use crate::market_data::MarketDataSource;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Fixture-backed source. Lookups are case-insensitive on the ticker; peers
/// are returned in the order their sectors were registered.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketData {
    closing: HashMap<String, PriceSeries>,
    opening: HashMap<String, PriceSeries>,
    sectors: Vec<(String, String)>,
    prices: HashMap<String, Decimal>,
    news: HashMap<String, Vec<NewsArticle>>,
    listings: Vec<TickerMatch>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_closing(mut self, series: PriceSeries) -> Self {
        self.closing.insert(market::normalize_ticker(series.ticker()), series);
        self
    }

    pub fn with_opening(mut self, series: PriceSeries) -> Self {
        self.opening.insert(market::normalize_ticker(series.ticker()), series);
        self
    }

    pub fn with_sector(mut self, ticker: &str, sector: &str) -> Self {
        let ticker = market::normalize_ticker(ticker);
        self.sectors.retain(|(t, _)| *t != ticker);
        self.sectors.push((ticker, sector.to_string()));
        self
    }

    pub fn with_current_price(mut self, ticker: &str, price: Decimal) -> Self {
        self.prices.insert(market::normalize_ticker(ticker), price);
        self
    }

    pub fn with_news(mut self, ticker: &str, articles: Vec<NewsArticle>) -> Self {
        self.news.insert(market::normalize_ticker(ticker), articles);
        self
    }

    pub fn with_listing(mut self, ticker: &str, name: &str) -> Self {
        self.listings.push(TickerMatch {
            ticker: ticker.to_string(),
            name: name.to_string(),
        });
        self
    }

    fn series_in(
        map: &HashMap<String, PriceSeries>,
        ticker: &str,
        range: &AnalysisWindow,
    ) -> PriceSeries {
        map.get(&market::normalize_ticker(ticker))
            .map(|s| s.within(range))
            .unwrap_or_else(|| PriceSeries::empty(ticker))
    }
}

#[async_trait::async_trait]
impl MarketDataSource for InMemoryMarketData {
    fn provider_name(&self) -> &'static str {
        "in_memory"
    }

    async fn fetch_closing_prices(&self, ticker: &str, range: &AnalysisWindow) -> PriceSeries {
        Self::series_in(&self.closing, ticker, range)
    }

    async fn fetch_opening_prices(&self, ticker: &str, range: &AnalysisWindow) -> PriceSeries {
        Self::series_in(&self.opening, ticker, range)
    }

    async fn fetch_sector(&self, ticker: &str) -> String {
        let ticker = market::normalize_ticker(ticker);
        self.sectors
            .iter()
            .find(|(t, _)| *t == ticker)
            .map(|(_, s)| s.clone())
            .unwrap_or_else(|| UNKNOWN_SECTOR.to_string())
    }

    async fn fetch_peers(
        &self,
        target: &str,
        sector: &str,
        range: &AnalysisWindow,
    ) -> Vec<PriceSeries> {
        if market::is_unknown_sector(sector) {
            return Vec::new();
        }
        self.sectors
            .iter()
            .filter(|(t, s)| s.eq_ignore_ascii_case(sector) && !t.eq_ignore_ascii_case(target.trim()))
            .map(|(t, _)| Self::series_in(&self.closing, t, range))
            .collect()
    }

    async fn fetch_current_price(&self, ticker: &str) -> Option<Decimal> {
        self.prices.get(&market::normalize_ticker(ticker)).copied()
    }

    async fn fetch_news(&self, ticker: &str) -> Vec<NewsArticle> {
        self.news
            .get(&market::normalize_ticker(ticker))
            .cloned()
            .unwrap_or_default()
    }

    async fn search_tickers(&self, query: &str) -> Vec<TickerMatch> {
        let needle = query.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.listings
            .iter()
            .filter(|m| {
                m.ticker.to_ascii_lowercase().contains(&needle)
                    || m.name.to_ascii_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }
}
