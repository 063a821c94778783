use crate::config::Settings;
use crate::domain::{market, AnalysisWindow, NewsArticle, PriceSeries, TickerMatch, UNKNOWN_SECTOR};
use crate::market_data::error::ProviderError;
use crate::market_data::http::HttpJsonClient;
use crate::market_data::{decimal_from_json, or_degrade, MarketDataSource};
use anyhow::Result;
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde_json::Value;

const PROVIDER: &str = "polygon";
const NEWS_LIMIT: usize = 5;
const SEARCH_LIMIT: usize = 20;
// Upper bound on listed tickers inspected while looking for sector peers.
const PEER_SCAN_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriceField {
    Open,
    Close,
}

impl PriceField {
    fn key(self) -> &'static str {
        match self {
            PriceField::Open => "o",
            PriceField::Close => "c",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PolygonClient {
    http: HttpJsonClient,
    api_key: String,
    max_peers: usize,
    req_delay: std::time::Duration,
}

impl PolygonClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_polygon_api_key()?.to_string();
        let http = HttpJsonClient::new(
            PROVIDER,
            &settings.polygon_base_url,
            settings.timeout_secs,
            settings.retries,
        )?;

        Ok(Self {
            http,
            api_key,
            max_peers: settings.max_peers,
            req_delay: std::time::Duration::from_millis(settings.req_delay_ms),
        })
    }

    fn auth(&self) -> (&'static str, String) {
        ("apiKey", self.api_key.clone())
    }

    async fn daily_series(
        &self,
        ticker: &str,
        range: &AnalysisWindow,
        field: PriceField,
    ) -> Result<PriceSeries> {
        let path = aggs_path(ticker, range)?;
        let body = self
            .http
            .get_json(
                &path,
                &[
                    ("adjusted", "true".to_string()),
                    ("sort", "asc".to_string()),
                    self.auth(),
                ],
            )
            .await?;
        parse_aggregates(ticker, &body, field)
    }

    async fn sector_of(&self, ticker: &str) -> Result<String> {
        let body = self
            .http
            .get_json(&details_path(ticker)?, &[self.auth()])
            .await?;
        check_status(&body)?;
        Ok(parse_sector(&body))
    }

    async fn peers_in(
        &self,
        target: &str,
        sector: &str,
        range: &AnalysisWindow,
    ) -> Result<Vec<PriceSeries>> {
        let body = self
            .http
            .get_json(
                "/v3/reference/tickers",
                &[
                    ("type", "CS".to_string()),
                    ("market", "stocks".to_string()),
                    ("active", "true".to_string()),
                    ("limit", PEER_SCAN_LIMIT.to_string()),
                    self.auth(),
                ],
            )
            .await?;
        check_status(&body)?;

        let mut peers = Vec::new();
        for (idx, listing) in peer_candidates(parse_listings(&body), target)
            .into_iter()
            .enumerate()
        {
            if peers.len() >= self.max_peers {
                break;
            }
            if idx != 0 {
                tokio::time::sleep(self.req_delay).await;
            }

            // The listing endpoint only sometimes carries the SIC description;
            // fall back to the per-ticker details lookup.
            let listed_sector = match listing.sector {
                Some(s) => s,
                None => {
                    let looked_up = self.sector_of(&listing.ticker).await;
                    or_degrade(looked_up, PROVIDER, "sector", &listing.ticker, UNKNOWN_SECTOR.to_string())
                }
            };
            if market::is_unknown_sector(&listed_sector)
                || !listed_sector.trim().eq_ignore_ascii_case(sector.trim())
            {
                continue;
            }

            tokio::time::sleep(self.req_delay).await;
            let series = self
                .daily_series(&listing.ticker, range, PriceField::Close)
                .await;
            let series = or_degrade(
                series,
                PROVIDER,
                "peer_closing_prices",
                &listing.ticker,
                PriceSeries::empty(listing.ticker.clone()),
            );
            peers.push(series);
        }

        tracing::debug!(sector, peers = peers.len(), "polygon peer scan finished");
        Ok(peers)
    }

    async fn last_trade(&self, ticker: &str) -> Result<Option<Decimal>> {
        let body = self
            .http
            .get_json(&last_trade_path(ticker)?, &[self.auth()])
            .await?;
        check_status(&body)?;
        Ok(parse_last_trade(&body))
    }

    async fn news_for(&self, ticker: &str) -> Result<Vec<NewsArticle>> {
        let body = self
            .http
            .get_json(
                "/v2/reference/news",
                &[
                    ("ticker", ticker.to_string()),
                    ("limit", NEWS_LIMIT.to_string()),
                    self.auth(),
                ],
            )
            .await?;
        check_status(&body)?;
        Ok(parse_news(&body))
    }

    async fn search(&self, query: &str) -> Result<Vec<TickerMatch>> {
        let body = self
            .http
            .get_json(
                "/v3/reference/tickers",
                &[
                    ("search", query.to_string()),
                    ("active", "true".to_string()),
                    ("limit", SEARCH_LIMIT.to_string()),
                    self.auth(),
                ],
            )
            .await?;
        check_status(&body)?;
        Ok(parse_listings(&body)
            .into_iter()
            .map(|l| TickerMatch {
                ticker: l.ticker,
                name: l.name,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl MarketDataSource for PolygonClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_closing_prices(&self, ticker: &str, range: &AnalysisWindow) -> PriceSeries {
        let res = self.daily_series(ticker, range, PriceField::Close).await;
        or_degrade(res, PROVIDER, "closing_prices", ticker, PriceSeries::empty(ticker))
    }

    async fn fetch_opening_prices(&self, ticker: &str, range: &AnalysisWindow) -> PriceSeries {
        let res = self.daily_series(ticker, range, PriceField::Open).await;
        or_degrade(res, PROVIDER, "opening_prices", ticker, PriceSeries::empty(ticker))
    }

    async fn fetch_sector(&self, ticker: &str) -> String {
        let res = self.sector_of(ticker).await;
        or_degrade(res, PROVIDER, "sector", ticker, UNKNOWN_SECTOR.to_string())
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
        let res = self.peers_in(target, sector, range).await;
        or_degrade(res, PROVIDER, "peers", sector, Vec::new())
    }

    async fn fetch_current_price(&self, ticker: &str) -> Option<Decimal> {
        let res = self.last_trade(ticker).await;
        or_degrade(res, PROVIDER, "current_price", ticker, None)
    }

    async fn fetch_news(&self, ticker: &str) -> Vec<NewsArticle> {
        let res = self.news_for(ticker).await;
        or_degrade(res, PROVIDER, "news", ticker, Vec::new())
    }

    async fn search_tickers(&self, query: &str) -> Vec<TickerMatch> {
        let res = self.search(query).await;
        or_degrade(res, PROVIDER, "search", query, Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Listing {
    ticker: String,
    name: String,
    sector: Option<String>,
}

fn aggs_path(ticker: &str, range: &AnalysisWindow) -> Result<String> {
    let ticker = path_ticker(ticker)?;
    Ok(format!(
        "/v2/aggs/ticker/{ticker}/range/1/day/{}/{}",
        range.start, range.end
    ))
}

fn details_path(ticker: &str) -> Result<String> {
    Ok(format!("/v3/reference/tickers/{}", path_ticker(ticker)?))
}

fn last_trade_path(ticker: &str) -> Result<String> {
    Ok(format!("/v2/last/trade/{}", path_ticker(ticker)?))
}

// Tickers become URL path segments; only plain symbols are allowed through.
fn path_ticker(ticker: &str) -> Result<String> {
    market::parse_ticker(ticker)
        .map_err(|err| ProviderError::new(PROVIDER, "request", format!("{err:#}")).into())
}

/// Listings worth a peer lookup: everything except the target itself.
fn peer_candidates(listings: Vec<Listing>, target: &str) -> Vec<Listing> {
    let target = target.trim();
    listings
        .into_iter()
        .filter(|l| !l.ticker.eq_ignore_ascii_case(target))
        .collect()
}

fn check_status(body: &Value) -> Result<()> {
    let status = body.get("status").and_then(Value::as_str).unwrap_or("");
    if status.eq_ignore_ascii_case("ERROR") || status.eq_ignore_ascii_case("NOT_AUTHORIZED") {
        let detail = body
            .get("error")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .unwrap_or(status);
        return Err(ProviderError::new(PROVIDER, "api", detail).into());
    }
    Ok(())
}

fn parse_aggregates(ticker: &str, body: &Value, field: PriceField) -> Result<PriceSeries> {
    check_status(body)?;

    // A window without trading days comes back without a `results` key.
    let Some(results) = body.get("results").and_then(Value::as_array) else {
        return Ok(PriceSeries::empty(ticker));
    };

    let mut observations = Vec::with_capacity(results.len());
    for bar in results {
        let Some(date) = bar.get("t").and_then(Value::as_i64).and_then(epoch_millis_to_date) else {
            continue;
        };
        let Some(price) = bar.get(field.key()).and_then(decimal_from_json) else {
            continue;
        };
        observations.push((date, price));
    }

    Ok(PriceSeries::new(ticker, observations))
}

fn epoch_millis_to_date(ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}

fn parse_sector(body: &Value) -> String {
    let results = body.get("results");
    // Details responses carry an object; list responses an array.
    let record = match results {
        Some(Value::Array(items)) => items.first(),
        other => other,
    };
    record
        .and_then(|r| r.get("sic_description"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_SECTOR.to_string())
}

fn parse_listings(body: &Value) -> Vec<Listing> {
    let Some(results) = body.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };
    results
        .iter()
        .filter_map(|r| {
            let ticker = r.get("ticker").and_then(Value::as_str)?.trim();
            if ticker.is_empty() {
                return None;
            }
            Some(Listing {
                ticker: ticker.to_string(),
                name: r
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
                sector: r
                    .get("sic_description")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            })
        })
        .collect()
}

fn parse_last_trade(body: &Value) -> Option<Decimal> {
    body.get("results")
        .and_then(|r| r.get("p"))
        .and_then(decimal_from_json)
        .filter(|p| *p > Decimal::ZERO)
}

fn parse_news(body: &Value) -> Vec<NewsArticle> {
    let Some(results) = body.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };
    results
        .iter()
        .filter_map(|a| {
            let title = a.get("title").and_then(Value::as_str)?.trim();
            let url = a.get("article_url").and_then(Value::as_str).unwrap_or("").trim();
            (!title.is_empty()).then(|| NewsArticle {
                title: title.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}
