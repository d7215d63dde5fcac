//! Cross-sectional ranking of one metric across the symbol universe

use crate::config::TiePolicy;
use crate::models::ranking::{Metric, MetricValue, RankedMetric};
use crate::ranking::catalog::{self, Direction, MetricSpec};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Rank the accepted values of `spec.metric`, best first. Equal values share
/// a rank according to `tie_policy`.
pub fn rank_values(
    values: &[MetricValue],
    spec: &MetricSpec,
    tie_policy: TiePolicy,
) -> Vec<(String, f64, f64)> {
    let mut accepted: Vec<(&str, f64)> = values
        .iter()
        .filter(|v| spec.accepts(v.value))
        .filter_map(|v| v.value.map(|x| (v.symbol.as_str(), x)))
        .collect();

    accepted.sort_by(|a, b| {
        let by_value = match spec.direction {
            Direction::LowerIsBetter => a.1.partial_cmp(&b.1),
            Direction::HigherIsBetter => b.1.partial_cmp(&a.1),
        };
        by_value.unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(b.0))
    });

    let mut ranked = Vec::with_capacity(accepted.len());
    let mut start = 0;
    while start < accepted.len() {
        let value = accepted[start].1;
        let end = accepted[start..]
            .iter()
            .position(|(_, v)| *v != value)
            .map(|offset| start + offset)
            .unwrap_or(accepted.len());

        let rank = match tie_policy {
            TiePolicy::Min => (start + 1) as f64,
            TiePolicy::Average => (start + 1 + end) as f64 / 2.0,
        };
        for (symbol, v) in &accepted[start..end] {
            ranked.push((symbol.to_string(), *v, rank));
        }
        start = end;
    }
    ranked
}

/// Rank `metric` for `date` using its catalog direction and filter
pub fn rank_metric(
    values: &[MetricValue],
    metric: Metric,
    date: NaiveDate,
    tie_policy: TiePolicy,
) -> Vec<RankedMetric> {
    let spec = catalog::spec(metric);
    rank_values(values, &spec, tie_policy)
        .into_iter()
        .map(|(symbol, value, rank)| RankedMetric {
            symbol,
            date,
            metric,
            value: Some(value),
            rank,
        })
        .collect()
}
