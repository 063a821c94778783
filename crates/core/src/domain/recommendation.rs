use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl Recommendation {
    pub fn label(self) -> &'static str {
        match self {
            Recommendation::Buy => "Buy",
            Recommendation::Sell => "Sell",
            Recommendation::Hold => "Hold",
        }
    }

    pub fn rationale(self) -> &'static str {
        match self {
            Recommendation::Buy => "positive trend",
            Recommendation::Sell => "negative trend",
            Recommendation::Hold => "neutral trend",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.rationale())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extremes {
    pub highest: PricePoint,
    pub lowest: PricePoint,
}

/// Metrics derived from a single closing-price series.
///
/// Values are kept at full decimal precision; rounding is left to whoever
/// renders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ticker: String,
    pub percentage_change: Decimal,
    pub average_price: Decimal,
    pub highest: Option<PricePoint>,
    pub lowest: Option<PricePoint>,
    pub observations: usize,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerComparison {
    pub target: AnalysisResult,
    /// One entry per competitor, in the order the peers were supplied. Never
    /// contains the target ticker.
    pub peers: Vec<AnalysisResult>,
}

impl PeerComparison {
    /// True when there was nothing to compare the target against.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_trend_rationale() {
        assert_eq!(Recommendation::Buy.to_string(), "Buy (positive trend)");
        assert_eq!(Recommendation::Sell.to_string(), "Sell (negative trend)");
        assert_eq!(Recommendation::Hold.to_string(), "Hold (neutral trend)");
    }

    #[test]
    fn serializes_as_variant_name() {
        let v = serde_json::to_value(Recommendation::Hold).unwrap();
        assert_eq!(v, serde_json::json!("Hold"));
    }
}
