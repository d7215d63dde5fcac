//! Shared data models spanning the engine layers.

pub mod alert;
pub mod indicators;
pub mod market;
pub mod ranking;

pub use alert::{Alert, AlertKind, AlertLedgerEntry};
pub use indicators::{
    parse_numeric, AnchoredObvReading, Bar, CandleColor, ColorChange, ForceIndexReading,
    ForceIndexState, HeikinAshiCandle, MomentumState, ObvCross, PricePoint, PriorForceIndex,
    PriorState, SymbolReadings, WilliamsRReading,
};
pub use market::{BaseCurrency, Market, MarketKey, SeriesKey, SymbolInfo};
pub use ranking::{Fundamentals, Metric, MetricValue, RankedMetric};
