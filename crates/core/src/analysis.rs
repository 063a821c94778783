//! Pure analysis over closing-price series.
//!
//! Every function here is total: an empty or degenerate series never produces
//! an error, it produces the neutral values (0% change, 0 average, no extremes,
//! `Hold`). Callers rely on that to treat "no data" as "neutral result".

use crate::domain::{AnalysisResult, Extremes, PeerComparison, PriceSeries, PricePoint, Recommendation};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const BUY_THRESHOLD: Decimal = dec!(5);
const SELL_THRESHOLD: Decimal = dec!(-5);
const HUNDRED: Decimal = dec!(100);

/// Relative move from the chronologically first to the last observation, in
/// percent.
///
/// Returns zero when the series has fewer than two observations. Arithmetic
/// overflow also yields zero.
pub fn percentage_change(series: &PriceSeries) -> Decimal {
    if series.len() < 2 {
        return Decimal::ZERO;
    }
    let (Some((_, first)), Some((_, last))) = (series.first(), series.last()) else {
        return Decimal::ZERO;
    };

    last.checked_sub(first)
        .and_then(|delta| delta.checked_div(first))
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// Arithmetic mean of every price in the series; zero for an empty series.
pub fn average_price(series: &PriceSeries) -> Decimal {
    if series.is_empty() {
        return Decimal::ZERO;
    }

    let mut total = Decimal::ZERO;
    for price in series.prices() {
        match total.checked_add(price) {
            Some(t) => total = t,
            None => return Decimal::ZERO,
        }
    }
    total
        .checked_div(Decimal::from(series.len()))
        .unwrap_or(Decimal::ZERO)
}

/// Highest and lowest observation. Scans in ascending date order, so on a tie
/// the earliest date wins.
pub fn find_extremes(series: &PriceSeries) -> Option<Extremes> {
    let mut iter = series.iter();
    let (date, price) = iter.next()?;
    let mut highest = PricePoint { date, price };
    let mut lowest = highest;

    for (date, price) in iter {
        if price > highest.price {
            highest = PricePoint { date, price };
        }
        if price < lowest.price {
            lowest = PricePoint { date, price };
        }
    }

    Some(Extremes { highest, lowest })
}

/// `> 5` is Buy, `< -5` is Sell, everything else (both bounds included) Hold.
pub fn generate_recommendation(percentage_change: Decimal) -> Recommendation {
    if percentage_change > BUY_THRESHOLD {
        Recommendation::Buy
    } else if percentage_change < SELL_THRESHOLD {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}

pub fn analyze(series: &PriceSeries) -> AnalysisResult {
    let change = percentage_change(series);
    let extremes = find_extremes(series);

    AnalysisResult {
        ticker: series.ticker().to_string(),
        percentage_change: change,
        average_price: average_price(series),
        highest: extremes.map(|e| e.highest),
        lowest: extremes.map(|e| e.lowest),
        observations: series.len(),
        recommendation: generate_recommendation(change),
    }
}

/// Analyzes the target and each peer independently. Peers keep their input
/// order; a peer carrying the target's ticker is skipped.
pub fn compare_to_peers(target: &PriceSeries, peers: &[PriceSeries]) -> PeerComparison {
    let peers = peers
        .iter()
        .filter(|peer| !peer.ticker().eq_ignore_ascii_case(target.ticker()))
        .map(analyze)
        .collect();

    PeerComparison {
        target: analyze(target),
        peers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series(ticker: &str, points: &[(NaiveDate, Decimal)]) -> PriceSeries {
        PriceSeries::new(ticker, points.iter().copied())
    }

    #[test]
    fn empty_series_is_neutral() {
        let s = PriceSeries::empty("MSFT");
        let r = analyze(&s);

        assert_eq!(r.percentage_change, Decimal::ZERO);
        assert_eq!(r.average_price, Decimal::ZERO);
        assert_eq!(r.recommendation, Recommendation::Hold);
        assert_eq!(r.highest, None);
        assert_eq!(r.lowest, None);
        assert_eq!(r.observations, 0);
    }

    #[test]
    fn single_observation_has_no_change() {
        let s = series("MSFT", &[(d(2024, 1, 1), dec!(412.5))]);

        assert_eq!(percentage_change(&s), Decimal::ZERO);
        assert_eq!(average_price(&s), dec!(412.5));
        let e = find_extremes(&s).unwrap();
        assert_eq!(e.highest, e.lowest);
    }

    #[test]
    fn rising_series_with_dip_is_buy() {
        let s = series(
            "MSFT",
            &[
                (d(2024, 1, 1), dec!(100)),
                (d(2024, 1, 5), dec!(80)),
                (d(2024, 1, 10), dec!(120)),
            ],
        );
        let r = analyze(&s);

        assert_eq!(r.percentage_change, dec!(20));
        assert_eq!(
            r.highest,
            Some(PricePoint {
                date: d(2024, 1, 10),
                price: dec!(120)
            })
        );
        assert_eq!(
            r.lowest,
            Some(PricePoint {
                date: d(2024, 1, 5),
                price: dec!(80)
            })
        );
        assert_eq!(r.average_price, dec!(100));
        assert_eq!(r.recommendation, Recommendation::Buy);
    }

    #[test]
    fn small_decline_is_hold() {
        let s = series(
            "MSFT",
            &[(d(2024, 1, 1), dec!(100)), (d(2024, 1, 10), dec!(97))],
        );

        assert_eq!(percentage_change(&s), dec!(-3));
        assert_eq!(analyze(&s).recommendation, Recommendation::Hold);
    }

    #[test]
    fn change_uses_chronological_endpoints_not_insertion_order() {
        let s = PriceSeries::new(
            "NVDA",
            [
                (d(2024, 3, 8), dec!(90)),
                (d(2024, 3, 1), dec!(60)),
                (d(2024, 3, 4), dec!(200)),
            ],
        );

        assert_eq!(percentage_change(&s), dec!(50));
    }

    #[test]
    fn change_is_exact_decimal_arithmetic() {
        let p0 = dec!(3);
        let pn = dec!(4);
        let s = series("T", &[(d(2024, 1, 1), p0), (d(2024, 1, 2), pn)]);

        assert_eq!(percentage_change(&s), (pn - p0) / p0 * dec!(100));

        let s = series(
            "T",
            &[(d(2024, 1, 1), dec!(0.1)), (d(2024, 1, 2), dec!(0.3))],
        );
        assert_eq!(percentage_change(&s), dec!(200));
    }

    #[test]
    fn recommendation_thresholds_are_strict() {
        assert_eq!(generate_recommendation(dec!(6)), Recommendation::Buy);
        assert_eq!(generate_recommendation(dec!(-6)), Recommendation::Sell);
        assert_eq!(generate_recommendation(dec!(5)), Recommendation::Hold);
        assert_eq!(generate_recommendation(dec!(-5)), Recommendation::Hold);
        assert_eq!(generate_recommendation(dec!(0)), Recommendation::Hold);
        assert_eq!(generate_recommendation(dec!(5.0001)), Recommendation::Buy);
        assert_eq!(generate_recommendation(dec!(-5.0001)), Recommendation::Sell);
    }

    #[test]
    fn ties_resolve_to_earliest_date() {
        let s = series(
            "AMD",
            &[
                (d(2024, 2, 1), dec!(50)),
                (d(2024, 2, 2), dec!(70)),
                (d(2024, 2, 3), dec!(50)),
                (d(2024, 2, 4), dec!(70)),
            ],
        );
        let e = find_extremes(&s).unwrap();

        assert_eq!(e.highest.date, d(2024, 2, 2));
        assert_eq!(e.lowest.date, d(2024, 2, 1));
    }

    #[test]
    fn peers_keep_input_order_and_skip_target() {
        let target = series(
            "INTC",
            &[(d(2024, 1, 1), dec!(40)), (d(2024, 1, 2), dec!(44))],
        );
        let peers = vec![
            series("TXN", &[(d(2024, 1, 1), dec!(100)), (d(2024, 1, 2), dec!(90))]),
            series("intc", &[(d(2024, 1, 1), dec!(1)), (d(2024, 1, 2), dec!(2))]),
            series("AMD", &[(d(2023, 6, 1), dec!(100))]),
        ];

        let cmp = compare_to_peers(&target, &peers);

        assert_eq!(cmp.target.ticker, "INTC");
        assert_eq!(cmp.target.percentage_change, dec!(10));
        let tickers: Vec<_> = cmp.peers.iter().map(|p| p.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["TXN", "AMD"]);
        assert_eq!(cmp.peers[0].recommendation, Recommendation::Sell);
        assert_eq!(cmp.peers[1].percentage_change, Decimal::ZERO);
    }

    #[test]
    fn no_peers_means_no_comparison() {
        let target = PriceSeries::empty("INTC");
        let cmp = compare_to_peers(&target, &[]);

        assert!(cmp.is_empty());
        assert_eq!(cmp.target.recommendation, Recommendation::Hold);
    }

    #[test]
    fn analysis_is_idempotent() {
        let s = series(
            "MSFT",
            &[
                (d(2024, 1, 1), dec!(101.37)),
                (d(2024, 1, 2), dec!(99.12)),
                (d(2024, 1, 3), dec!(107.9)),
            ],
        );

        assert_eq!(analyze(&s), analyze(&s));
        assert_eq!(percentage_change(&s), percentage_change(&s));
        assert_eq!(compare_to_peers(&s, &[]), compare_to_peers(&s, &[]));
    }
}
