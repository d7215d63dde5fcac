//! Cross-sectional ranking: per-metric catalog, tie-aware ranking, ERP5

pub mod catalog;
pub mod engine;
pub mod erp5;

pub use catalog::{ranked_metrics, spec, Direction, MetricSpec};
pub use engine::{rank_metric, rank_values};
pub use erp5::{erp5_percentiles, percentile, ERP5_COMPONENTS};
