//! Calendar resampling of daily rows into weekly bars
//!
//! Buckets are seven days wide and aligned to the evaluation date: bucket `k`
//! covers `(date - 7(k+1), date - 7k]` and is stamped with its end date.

use crate::models::indicators::{Bar, PricePoint};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

/// Complete rows only, ascending by timestamp
pub fn complete_bars(series: &[PricePoint]) -> Vec<Bar> {
    let mut bars: Vec<Bar> = series.iter().filter_map(PricePoint::as_bar).collect();
    bars.sort_by_key(|b| b.timestamp);
    bars
}

/// Weekly bars ending at `end`, oldest first, at most `max_weeks` of them.
/// Rows after `end` are ignored and empty weeks are absent.
pub fn to_weekly(daily: &[Bar], end: NaiveDate, max_weeks: usize) -> Vec<Bar> {
    let mut buckets: BTreeMap<i64, Vec<&Bar>> = BTreeMap::new();
    for bar in daily.iter().filter(|b| b.timestamp <= end) {
        let days_back = (end - bar.timestamp).num_days();
        let week = days_back / 7;
        if week as usize >= max_weeks {
            continue;
        }
        buckets.entry(week).or_default().push(bar);
    }

    // BTreeMap iterates newest week first; reverse for ascending output
    let mut weekly: Vec<Bar> = buckets
        .into_iter()
        .filter_map(|(week, mut rows)| {
            rows.sort_by_key(|b| b.timestamp);
            let first = rows.first()?;
            let last = rows.last()?;
            Some(Bar {
                timestamp: end - Duration::days(week * 7),
                open: first.open,
                high: rows.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
                low: rows.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
                close: last.close,
                volume: rows.iter().map(|b| b.volume).sum(),
            })
        })
        .collect();
    weekly.reverse();
    weekly
}
