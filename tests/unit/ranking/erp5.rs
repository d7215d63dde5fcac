//! Unit tests for the ERP5 composite

use chrono::NaiveDate;
use regime_alerts::models::ranking::{Metric, RankedMetric};
use regime_alerts::ranking::{erp5_percentiles, percentile, ERP5_COMPONENTS};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

fn components(symbol: &str, rank: f64) -> Vec<RankedMetric> {
    ERP5_COMPONENTS
        .iter()
        .map(|&metric| RankedMetric {
            symbol: symbol.to_string(),
            date: date(),
            metric,
            value: None,
            rank,
        })
        .collect()
}

#[test]
fn test_percentile_bounds() {
    assert_eq!(percentile(0, 1), 1.0);
    assert_eq!(percentile(0, 5), 1.0);
    assert_eq!(percentile(4, 5), 100.0);
    assert_eq!(percentile(1, 3), 51.0);
}

#[test]
fn test_percentile_half_steps_round_to_even() {
    let seven: Vec<f64> = (0..7).map(|i| percentile(i, 7)).collect();
    assert_eq!(seven, vec![1.0, 17.0, 34.0, 51.0, 67.0, 83.0, 100.0]);
}

#[test]
fn test_erp5_orders_by_rank_sum() {
    let mut rankings = components("B", 2.0);
    rankings.extend(components("A", 1.0));
    rankings.extend(components("C", 3.0));

    let erp5 = erp5_percentiles(&rankings, date());
    let summary: Vec<(&str, f64, f64)> = erp5
        .iter()
        .map(|r| (r.symbol.as_str(), r.value.unwrap(), r.rank))
        .collect();
    assert_eq!(summary, vec![("A", 5.0, 1.0), ("B", 10.0, 51.0), ("C", 15.0, 100.0)]);
    assert!(erp5.iter().all(|r| r.metric == Metric::Erp5));
}

#[test]
fn test_symbols_missing_a_component_are_excluded() {
    let mut rankings = components("A", 1.0);
    rankings.extend(components("B", 2.0).into_iter().skip(1));

    let erp5 = erp5_percentiles(&rankings, date());
    assert_eq!(erp5.len(), 1);
    assert_eq!(erp5[0].symbol, "A");
    assert_eq!(erp5[0].rank, 1.0);
}

#[test]
fn test_non_component_metrics_ignored() {
    let mut rankings = components("A", 1.0);
    rankings.push(RankedMetric {
        symbol: "A".to_string(),
        date: date(),
        metric: Metric::WilliamsR,
        value: Some(-80.0),
        rank: 40.0,
    });
    let erp5 = erp5_percentiles(&rankings, date());
    assert_eq!(erp5[0].value, Some(5.0));
}
