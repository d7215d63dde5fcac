use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every metric that can be ranked cross-sectionally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PeRatio,
    EvEbitda,
    PbRatio,
    PegRatio,
    EarningsYield,
    BookToPrice,
    PriceToSales,
    ReturnOnEquity,
    ReturnOnAssets,
    FreeCashFlowYield,
    ShareholderYield,
    WilliamsR,
    WilliamsREma,
    ForceIndexFast,
    ForceIndexSlow,
    Erp5,
}

impl Metric {
    pub const FUNDAMENTALS: [Metric; 11] = [
        Metric::PeRatio,
        Metric::EvEbitda,
        Metric::PbRatio,
        Metric::PegRatio,
        Metric::EarningsYield,
        Metric::BookToPrice,
        Metric::PriceToSales,
        Metric::ReturnOnEquity,
        Metric::ReturnOnAssets,
        Metric::FreeCashFlowYield,
        Metric::ShareholderYield,
    ];

    pub const INDICATORS: [Metric; 4] = [
        Metric::WilliamsR,
        Metric::WilliamsREma,
        Metric::ForceIndexFast,
        Metric::ForceIndexSlow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::PeRatio => "pe_ratio",
            Metric::EvEbitda => "ev_ebitda",
            Metric::PbRatio => "pb_ratio",
            Metric::PegRatio => "peg_ratio",
            Metric::EarningsYield => "earnings_yield",
            Metric::BookToPrice => "book_to_price",
            Metric::PriceToSales => "price_to_sales",
            Metric::ReturnOnEquity => "return_on_equity",
            Metric::ReturnOnAssets => "return_on_assets",
            Metric::FreeCashFlowYield => "free_cash_flow_yield",
            Metric::ShareholderYield => "shareholder_yield",
            Metric::WilliamsR => "williams_r",
            Metric::WilliamsREma => "williams_r_ema",
            Metric::ForceIndexFast => "force_index_fast",
            Metric::ForceIndexSlow => "force_index_slow",
            Metric::Erp5 => "erp5",
        }
    }

    pub fn is_fundamental(&self) -> bool {
        Self::FUNDAMENTALS.contains(self)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::FUNDAMENTALS
            .iter()
            .chain(Self::INDICATORS.iter())
            .chain(std::iter::once(&Metric::Erp5))
            .find(|m| m.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown metric: {}", s))
    }
}

/// Valuation and quality figures for one symbol, as supplied by ingestion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub pe_ratio: Option<f64>,
    pub ev_ebitda: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub earnings_yield: Option<f64>,
    pub book_to_price: Option<f64>,
    pub price_to_sales: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub free_cash_flow_yield: Option<f64>,
    pub shareholder_yield: Option<f64>,
}

impl Fundamentals {
    /// Value of a fundamentals metric. Earnings yield and book-to-price fall
    /// back to the reciprocals of P/E and P/B.
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::PeRatio => self.pe_ratio,
            Metric::EvEbitda => self.ev_ebitda,
            Metric::PbRatio => self.pb_ratio,
            Metric::PegRatio => self.peg_ratio,
            Metric::EarningsYield => self.earnings_yield.or_else(|| reciprocal(self.pe_ratio)),
            Metric::BookToPrice => self.book_to_price.or_else(|| reciprocal(self.pb_ratio)),
            Metric::PriceToSales => self.price_to_sales,
            Metric::ReturnOnEquity => self.return_on_equity,
            Metric::ReturnOnAssets => self.return_on_assets,
            Metric::FreeCashFlowYield => self.free_cash_flow_yield,
            Metric::ShareholderYield => self.shareholder_yield,
            _ => None,
        }
    }
}

fn reciprocal(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && v.is_finite()).map(|v| 1.0 / v)
}

/// Raw value of a metric for one symbol on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub symbol: String,
    pub value: Option<f64>,
}

impl MetricValue {
    pub fn new(symbol: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            value,
        }
    }
}

/// Position of a symbol within the cross-section, 1 = best.
/// For `Metric::Erp5` the rank holds the 1-100 percentile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMetric {
    pub symbol: String,
    pub date: NaiveDate,
    pub metric: Metric,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub rank: f64,
}
