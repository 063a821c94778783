use crate::config::Settings;
use crate::domain::{AnalysisWindow, NewsArticle, PriceSeries, TickerMatch, UNKNOWN_SECTOR};
use crate::market_data::error::ProviderError;
use crate::market_data::http::HttpJsonClient;
use crate::market_data::{decimal_from_json, or_degrade, MarketDataSource};
use crate::time::window::today_utc;
use anyhow::Result;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde_json::Value;

const PROVIDER: &str = "alpha_vantage";
const QUERY_PATH: &str = "/query";
const DAILY_SERIES_KEY: &str = "Time Series (Daily)";
// The compact daily series holds the latest 100 trading days.
const COMPACT_SPAN_DAYS: i64 = 140;

#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: HttpJsonClient,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_alpha_vantage_api_key()?.to_string();
        let http = HttpJsonClient::new(
            PROVIDER,
            &settings.alpha_vantage_base_url,
            settings.timeout_secs,
            settings.retries,
        )?;

        Ok(Self {
            http,
            api_key,
        })
    }

    async fn query(&self, function: &str, params: &[(&'static str, String)]) -> Result<Value> {
        let mut query = Vec::with_capacity(params.len() + 2);
        query.push(("function", function.to_string()));
        query.extend(params.iter().cloned());
        query.push(("apikey", self.api_key.clone()));

        let body = self.http.get_json(QUERY_PATH, &query).await?;
        check_api_error(&body)?;
        Ok(body)
    }

    async fn daily_series(
        &self,
        ticker: &str,
        range: &AnalysisWindow,
        price_key: &str,
    ) -> Result<PriceSeries> {
        let body = self
            .query(
                "TIME_SERIES_DAILY",
                &[
                    ("symbol", ticker.to_string()),
                    ("outputsize", output_size(range, today_utc()).to_string()),
                ],
            )
            .await?;
        parse_daily_series(ticker, &body, price_key, range)
    }

    async fn overview_sector(&self, ticker: &str) -> Result<String> {
        let body = self
            .query("OVERVIEW", &[("symbol", ticker.to_string())])
            .await?;
        Ok(parse_overview_sector(&body))
    }

    async fn global_quote(&self, ticker: &str) -> Result<Option<Decimal>> {
        let body = self
            .query("GLOBAL_QUOTE", &[("symbol", ticker.to_string())])
            .await?;
        Ok(parse_global_quote(&body))
    }

    async fn symbol_search(&self, keywords: &str) -> Result<Vec<TickerMatch>> {
        let body = self
            .query("SYMBOL_SEARCH", &[("keywords", keywords.to_string())])
            .await?;
        Ok(parse_symbol_search(&body))
    }
}

#[async_trait::async_trait]
impl MarketDataSource for AlphaVantageClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_closing_prices(&self, ticker: &str, range: &AnalysisWindow) -> PriceSeries {
        let res = self.daily_series(ticker, range, "4. close").await;
        or_degrade(res, PROVIDER, "closing_prices", ticker, PriceSeries::empty(ticker))
    }

    async fn fetch_opening_prices(&self, ticker: &str, range: &AnalysisWindow) -> PriceSeries {
        let res = self.daily_series(ticker, range, "1. open").await;
        or_degrade(res, PROVIDER, "opening_prices", ticker, PriceSeries::empty(ticker))
    }

    async fn fetch_sector(&self, ticker: &str) -> String {
        let res = self.overview_sector(ticker).await;
        or_degrade(res, PROVIDER, "sector", ticker, UNKNOWN_SECTOR.to_string())
    }

    async fn fetch_peers(
        &self,
        target: &str,
        sector: &str,
        _range: &AnalysisWindow,
    ) -> Vec<PriceSeries> {
        tracing::warn!(
            provider = PROVIDER,
            target,
            sector,
            "provider cannot enumerate sector peers; no comparison available"
        );
        Vec::new()
    }

    async fn fetch_current_price(&self, ticker: &str) -> Option<Decimal> {
        let res = self.global_quote(ticker).await;
        or_degrade(res, PROVIDER, "current_price", ticker, None)
    }

    async fn fetch_news(&self, ticker: &str) -> Vec<NewsArticle> {
        tracing::debug!(provider = PROVIDER, ticker, "news is not supported by this provider");
        Vec::new()
    }

    async fn search_tickers(&self, query: &str) -> Vec<TickerMatch> {
        let res = self.symbol_search(query).await;
        or_degrade(res, PROVIDER, "search", query, Vec::new())
    }
}

/// Alpha Vantage answers most failures with HTTP 200 and a message key.
fn check_api_error(body: &Value) -> Result<()> {
    if let Some(msg) = body.get("Error Message").and_then(Value::as_str) {
        return Err(ProviderError::new(PROVIDER, "api", msg).into());
    }
    for key in ["Note", "Information"] {
        if let Some(msg) = body.get(key).and_then(Value::as_str) {
            return Err(ProviderError::new(PROVIDER, "rate_limit", msg).into());
        }
    }
    Ok(())
}

/// `full` only when `range` reaches back past what the compact series covers.
fn output_size(range: &AnalysisWindow, today: NaiveDate) -> &'static str {
    let compact_from = Duration::try_days(COMPACT_SPAN_DAYS)
        .and_then(|span| today.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN);
    if range.start < compact_from {
        "full"
    } else {
        "compact"
    }
}

fn parse_daily_series(
    ticker: &str,
    body: &Value,
    price_key: &str,
    range: &AnalysisWindow,
) -> Result<PriceSeries> {
    let series = body
        .get(DAILY_SERIES_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| ProviderError::new(PROVIDER, "decode", "no daily time series in response"))?;

    let observations = series.iter().filter_map(|(day, values)| {
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
        if !range.contains(date) {
            return None;
        }
        let price = values.get(price_key).and_then(decimal_from_json)?;
        Some((date, price))
    });

    Ok(PriceSeries::new(ticker, observations))
}

fn parse_overview_sector(body: &Value) -> String {
    body.get("Sector")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("None"))
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_SECTOR.to_string())
}

fn parse_global_quote(body: &Value) -> Option<Decimal> {
    body.get("Global Quote")
        .and_then(|q| q.get("05. price"))
        .and_then(decimal_from_json)
        .filter(|p| *p > Decimal::ZERO)
}

fn parse_symbol_search(body: &Value) -> Vec<TickerMatch> {
    let Some(matches) = body.get("bestMatches").and_then(Value::as_array) else {
        return Vec::new();
    };
    matches
        .iter()
        .filter_map(|m| {
            let ticker = m.get("1. symbol").and_then(Value::as_str)?.trim();
            if ticker.is_empty() {
                return None;
            }
            let name = m.get("2. name").and_then(Value::as_str).unwrap_or("").trim();
            Some(TickerMatch {
                ticker: ticker.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}
