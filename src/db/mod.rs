//! Persistence seam for prices, indicator readings, rankings and the alert ledger
//!
//! Every write is an upsert keyed by (market, base, symbol, date) so reruns
//! and concurrent writers converge on the last write.

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::models::alert::AlertLedgerEntry;
use crate::models::indicators::{
    AnchoredObvReading, ForceIndexReading, IndicatorKind, PricePoint, PriorState, SymbolReadings,
    WilliamsRReading,
};
use crate::models::market::{MarketKey, SeriesKey, SymbolInfo};
use crate::models::ranking::{Fundamentals, Metric, MetricValue, RankedMetric};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Fundamentals older than this are not used for ranking
pub const FUNDAMENTALS_MAX_AGE_DAYS: i64 = 180;

#[async_trait]
pub trait IndicatorStore: Send + Sync {
    async fn upsert_symbol(&self, key: &SeriesKey, name: &str) -> Result<(), StoreError>;

    /// Symbols with at least one price row in `[from, to]`, ordered by symbol
    async fn list_symbols(
        &self,
        market: MarketKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SymbolInfo>, StoreError>;

    async fn upsert_prices(&self, key: &SeriesKey, points: &[PricePoint]) -> Result<(), StoreError>;

    /// Price rows in `[from, to]`, ascending
    async fn load_prices(
        &self,
        key: &SeriesKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, StoreError>;

    async fn upsert_fundamentals(
        &self,
        key: &SeriesKey,
        date: NaiveDate,
        fundamentals: &Fundamentals,
    ) -> Result<(), StoreError>;

    /// Most recent stored state of each engine strictly before `before`
    async fn load_prior_state(&self, key: &SeriesKey, before: NaiveDate) -> Result<PriorState, StoreError>;

    async fn upsert_williams_r(&self, key: &SeriesKey, reading: &WilliamsRReading) -> Result<(), StoreError>;

    async fn upsert_force_index(&self, key: &SeriesKey, reading: &ForceIndexReading) -> Result<(), StoreError>;

    async fn upsert_anchored_obv(
        &self,
        key: &SeriesKey,
        reading: &AnchoredObvReading,
    ) -> Result<(), StoreError>;

    /// Remove the readings `kinds` stored for `date`. A row left with no
    /// reading is deleted.
    async fn clear_readings(
        &self,
        key: &SeriesKey,
        date: NaiveDate,
        kinds: &[IndicatorKind],
    ) -> Result<(), StoreError>;

    async fn load_readings(&self, key: &SeriesKey, date: NaiveDate) -> Result<SymbolReadings, StoreError>;

    /// One value per symbol for `metric` on `date`. Fundamentals use each
    /// symbol's latest row within `FUNDAMENTALS_MAX_AGE_DAYS`.
    async fn load_metric_values(
        &self,
        market: MarketKey,
        date: NaiveDate,
        metric: Metric,
    ) -> Result<Vec<MetricValue>, StoreError>;

    /// Replace every ranking row of `metric` on `date` with `rankings`
    async fn replace_rankings(
        &self,
        market: MarketKey,
        date: NaiveDate,
        metric: Metric,
        rankings: &[RankedMetric],
    ) -> Result<(), StoreError>;

    async fn load_rankings(&self, market: MarketKey, date: NaiveDate) -> Result<Vec<RankedMetric>, StoreError>;

    async fn load_alert_entry(
        &self,
        key: &SeriesKey,
        date: NaiveDate,
    ) -> Result<Option<AlertLedgerEntry>, StoreError>;

    async fn upsert_alert_entry(&self, market: MarketKey, entry: &AlertLedgerEntry) -> Result<(), StoreError>;

    /// Latest readings row per symbol
    async fn latest_readings(&self, market: MarketKey) -> Result<Vec<SymbolReadings>, StoreError>;

    /// Latest ranking per symbol and metric
    async fn latest_rankings(&self, market: MarketKey) -> Result<Vec<RankedMetric>, StoreError>;

    /// Ledger entries dated on or after `since`, newest first
    async fn recent_alerts(
        &self,
        market: MarketKey,
        since: NaiveDate,
    ) -> Result<Vec<AlertLedgerEntry>, StoreError>;
}
