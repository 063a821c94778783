use crate::domain::AnalysisWindow;
use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};

/// Resolves the analysis window from optional `YYYY-MM-DD` bounds.
///
/// A missing end defaults to `today`; a missing start to `lookback_days`
/// before the end.
pub fn resolve_window(
    start_arg: Option<&str>,
    end_arg: Option<&str>,
    today: NaiveDate,
    lookback_days: i64,
) -> anyhow::Result<AnalysisWindow> {
    let end = match end_arg.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_date(s).context("invalid end date")?,
        None => today,
    };
    let start = match start_arg.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_date(s).context("invalid start date")?,
        None => lookback_start(end, lookback_days)?,
    };

    AnalysisWindow::new(start, end)
}

/// The date `lookback_days` before `end`. Negative lookbacks count as zero.
pub fn lookback_start(end: NaiveDate, lookback_days: i64) -> anyhow::Result<NaiveDate> {
    Duration::try_days(lookback_days.max(0))
        .and_then(|span| end.checked_sub_signed(span))
        .with_context(|| format!("lookback of {lookback_days} days before {end} is out of range"))
}

pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("expected YYYY-MM-DD, got {s:?}"))
}

/// Current UTC calendar date.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn defaults_to_two_week_lookback_ending_today() {
        let w = resolve_window(None, None, d(2024, 3, 15), 14).unwrap();
        assert_eq!(w.start, d(2024, 3, 1));
        assert_eq!(w.end, d(2024, 3, 15));
    }

    #[test]
    fn lookback_counts_back_from_explicit_end() {
        let w = resolve_window(None, Some("2024-01-10"), d(2024, 3, 15), 9).unwrap();
        assert_eq!(w.start, d(2024, 1, 1));
        assert_eq!(w.end, d(2024, 1, 10));
    }

    #[test]
    fn blank_arguments_fall_back_to_defaults() {
        let w = resolve_window(Some(" "), Some(""), d(2024, 3, 15), 0).unwrap();
        assert_eq!(w.start, d(2024, 3, 15));
        assert_eq!(w.end, d(2024, 3, 15));
    }

    #[test]
    fn oversized_lookback_is_an_error() {
        assert!(resolve_window(None, None, d(2024, 3, 15), 200_000_000).is_err());
        assert!(resolve_window(None, None, d(2024, 3, 15), i64::MAX).is_err());
        assert!(lookback_start(d(2024, 3, 15), i64::MAX).is_err());
        assert_eq!(lookback_start(d(2024, 3, 15), -3).unwrap(), d(2024, 3, 15));
    }

    #[test]
    fn rejects_malformed_and_reversed_dates() {
        assert!(resolve_window(Some("2024/01/01"), None, d(2024, 3, 15), 14).is_err());
        assert!(resolve_window(Some("2024-02-01"), Some("2024-01-01"), d(2024, 3, 15), 14).is_err());
    }
}
