use anyhow::ensure;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Daily prices of one ticker for one price type (open or close).
///
/// Observations are keyed by calendar date, so iteration is always in
/// ascending date order. A date missing from the map means "no data for that
/// day", never a zero price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SeriesRecord")]
pub struct PriceSeries {
    ticker: String,
    observations: BTreeMap<NaiveDate, Decimal>,
}

// Deserialization goes through `PriceSeries::new` so the positivity filter applies.
#[derive(Deserialize)]
struct SeriesRecord {
    ticker: String,
    observations: BTreeMap<NaiveDate, Decimal>,
}

impl From<SeriesRecord> for PriceSeries {
    fn from(r: SeriesRecord) -> Self {
        PriceSeries::new(r.ticker, r.observations)
    }
}

impl PriceSeries {
    /// Builds a series, dropping non-positive prices. A repeated date keeps the
    /// last price supplied for it.
    pub fn new<I>(ticker: impl Into<String>, observations: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, Decimal)>,
    {
        let ticker = ticker.into();
        let mut out = BTreeMap::new();
        for (date, price) in observations {
            if price <= Decimal::ZERO {
                tracing::debug!(ticker = %ticker, %date, %price, "dropping non-positive price");
                continue;
            }
            out.insert(date, price);
        }
        Self {
            ticker,
            observations: out,
        }
    }

    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            observations: BTreeMap::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<Decimal> {
        self.observations.get(&date).copied()
    }

    /// Chronologically first observation.
    pub fn first(&self) -> Option<(NaiveDate, Decimal)> {
        self.observations.iter().next().map(|(d, p)| (*d, *p))
    }

    /// Chronologically last observation.
    pub fn last(&self) -> Option<(NaiveDate, Decimal)> {
        self.observations.iter().next_back().map(|(d, p)| (*d, *p))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (NaiveDate, Decimal)> + '_ {
        self.observations.iter().map(|(d, p)| (*d, *p))
    }

    pub fn prices(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.observations.values().copied()
    }

    /// New series holding only the observations inside `window` (inclusive).
    pub fn within(&self, window: &AnalysisWindow) -> Self {
        Self {
            ticker: self.ticker.clone(),
            observations: self
                .observations
                .range(window.start..=window.end)
                .map(|(d, p)| (*d, *p))
                .collect(),
        }
    }
}

/// Inclusive calendar-date range a caller wants analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnalysisWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> anyhow::Result<Self> {
        ensure!(
            start <= end,
            "start date {start} must not be after end date {end}"
        );
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start..=self.end).contains(&date)
    }
}
