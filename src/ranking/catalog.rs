//! Per-metric ranking direction and validity filters

use crate::models::market::Market;
use crate::models::ranking::Metric;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSpec {
    pub metric: Metric,
    pub direction: Direction,
    /// Drop values `<= 0`
    pub positive_only: bool,
    /// Drop values below this floor
    pub floor: Option<f64>,
}

impl MetricSpec {
    fn new(metric: Metric, direction: Direction) -> Self {
        Self {
            metric,
            direction,
            positive_only: false,
            floor: None,
        }
    }

    fn positive(mut self) -> Self {
        self.positive_only = true;
        self
    }

    fn with_floor(mut self, floor: f64) -> Self {
        self.positive_only = true;
        self.floor = Some(floor);
        self
    }

    /// Whether a value takes part in the ranking
    pub fn accepts(&self, value: Option<f64>) -> bool {
        let Some(v) = value else {
            return false;
        };
        if !v.is_finite() {
            return false;
        }
        if self.positive_only && v <= 0.0 {
            return false;
        }
        match self.floor {
            Some(floor) => v >= floor,
            None => true,
        }
    }
}

pub fn spec(metric: Metric) -> MetricSpec {
    use Direction::*;
    match metric {
        Metric::PeRatio => MetricSpec::new(metric, LowerIsBetter).with_floor(0.5),
        Metric::EvEbitda => MetricSpec::new(metric, LowerIsBetter).with_floor(1.0),
        Metric::PbRatio => MetricSpec::new(metric, LowerIsBetter).with_floor(0.2),
        Metric::PegRatio => MetricSpec::new(metric, LowerIsBetter).with_floor(0.2),
        Metric::EarningsYield => MetricSpec::new(metric, HigherIsBetter).with_floor(0.005),
        Metric::BookToPrice => MetricSpec::new(metric, HigherIsBetter).with_floor(0.05),
        Metric::PriceToSales => MetricSpec::new(metric, LowerIsBetter).positive(),
        Metric::ReturnOnEquity
        | Metric::ReturnOnAssets
        | Metric::FreeCashFlowYield
        | Metric::ShareholderYield => MetricSpec::new(metric, HigherIsBetter),
        Metric::WilliamsR | Metric::WilliamsREma | Metric::ForceIndexFast | Metric::ForceIndexSlow => {
            MetricSpec::new(metric, LowerIsBetter)
        }
        // the composite sum of component ranks: smaller is better
        Metric::Erp5 => MetricSpec::new(metric, LowerIsBetter),
    }
}

/// Metrics ranked directly from stored values for a market
pub fn ranked_metrics(market: Market) -> Vec<Metric> {
    let mut metrics = Vec::new();
    if market.is_equity() {
        metrics.extend(Metric::FUNDAMENTALS);
    }
    metrics.extend(Metric::INDICATORS);
    metrics
}
