//! ERP5 composite percentile built from five component ranks

use crate::models::ranking::{Metric, RankedMetric};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const ERP5_COMPONENTS: [Metric; 5] = [
    Metric::EarningsYield,
    Metric::PbRatio,
    Metric::BookToPrice,
    Metric::ReturnOnEquity,
    Metric::EvEbitda,
];

/// Map an ordinal position among `count` symbols onto 1..=100
pub fn percentile(position: usize, count: usize) -> f64 {
    if count <= 1 {
        return 1.0;
    }
    // ties round to even
    (position as f64 / (count - 1) as f64 * 99.0).round_ties_even() + 1.0
}

/// Sum the component ranks per symbol, sort ascending and assign percentiles.
/// Symbols missing any component are left out.
pub fn erp5_percentiles(rankings: &[RankedMetric], date: NaiveDate) -> Vec<RankedMetric> {
    let mut components: BTreeMap<&str, BTreeMap<Metric, f64>> = BTreeMap::new();
    for ranked in rankings.iter().filter(|r| ERP5_COMPONENTS.contains(&r.metric)) {
        components
            .entry(ranked.symbol.as_str())
            .or_default()
            .insert(ranked.metric, ranked.rank);
    }

    let mut sums: Vec<(&str, f64)> = components
        .into_iter()
        .filter(|(_, ranks)| ranks.len() == ERP5_COMPONENTS.len())
        .map(|(symbol, ranks)| (symbol, ranks.values().sum()))
        .collect();

    sums.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });

    let count = sums.len();
    sums.into_iter()
        .enumerate()
        .map(|(i, (symbol, sum))| RankedMetric {
            symbol: symbol.to_string(),
            date,
            metric: Metric::Erp5,
            value: Some(sum),
            rank: percentile(i, count),
        })
        .collect()
}
