//! Test utilities for worker integration tests

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use regime_alerts::config::EngineConfig;
use regime_alerts::core::runtime::{BatchRuntime, RuntimeConfig};
use regime_alerts::db::{IndicatorStore, MemoryStore, StoreError};
use regime_alerts::jobs::context::JobContext;
use regime_alerts::metrics::Metrics;
use regime_alerts::models::alert::AlertLedgerEntry;
use regime_alerts::models::indicators::{
    AnchoredObvReading, ForceIndexReading, IndicatorKind, PricePoint, PriorState, SymbolReadings,
    WilliamsRReading,
};
use regime_alerts::models::market::{MarketKey, SeriesKey, SymbolInfo};
use regime_alerts::models::ranking::{Fundamentals, Metric, MetricValue, RankedMetric};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const SCENARIO_WEEKS: usize = 35;

pub fn scenario_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()
}

pub fn scenario_date(index: usize) -> NaiveDate {
    scenario_start() + Duration::days(7 * index as i64)
}

/// The date of the uptick week, 2024-09-01
pub fn uptick_date() -> NaiveDate {
    scenario_date(SCENARIO_WEEKS - 1)
}

/// Dates evaluated by the scenario: the decline and the uptick
pub fn scenario_dates() -> Vec<NaiveDate> {
    (24..SCENARIO_WEEKS).map(scenario_date).collect()
}

/// One row per week: an oscillating warmup, a ten-week decline and a
/// high-volume uptick in the final week
pub fn scenario_rows() -> Vec<PricePoint> {
    (0..SCENARIO_WEEKS)
        .map(|i| {
            let close = match i {
                0..=23 if i % 2 == 0 => 100.0,
                0..=23 => 104.0,
                24..=33 => 100.0 - 3.0 * (i as f64 - 23.0),
                _ => 85.0,
            };
            let volume = if i == SCENARIO_WEEKS - 1 { 5000.0 } else { 1000.0 };
            PricePoint::new(scenario_date(i), close, close + 2.0, close - 2.0, close, volume)
        })
        .collect()
}

pub fn flat_rows(close: f64) -> Vec<PricePoint> {
    (0..SCENARIO_WEEKS)
        .map(|i| PricePoint::new(scenario_date(i), close, close, close, close, 1.0))
        .collect()
}

/// Short Force Index spans so the scenario has enough weekly history
pub fn test_config() -> EngineConfig {
    EngineConfig {
        force_index_override: Some((2, 4)),
        ..EngineConfig::default()
    }
}

pub async fn seed(store: &dyn IndicatorStore, market: MarketKey, symbol: &str, rows: &[PricePoint]) {
    let key = market.series(symbol);
    store.upsert_symbol(&key, symbol).await.expect("Should upsert symbol");
    store.upsert_prices(&key, rows).await.expect("Should upsert prices");
}

pub fn runtime(store: Arc<dyn IndicatorStore>, config: EngineConfig) -> BatchRuntime {
    let metrics = Arc::new(Metrics::new().expect("Should create metrics"));
    let runtime_config = RuntimeConfig {
        retry_min_delay: std::time::Duration::from_millis(1),
        ..RuntimeConfig::from(&config)
    };
    let job_context = Arc::new(JobContext::new(store, Arc::new(config), Some(metrics)));
    BatchRuntime::new(runtime_config, job_context)
}

/// How `FaultyStore::load_prices` misbehaves
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Every call reports a lost connection
    Unavailable,
    /// The first `n` calls report a write conflict
    Conflicts(usize),
}

/// Delegates to a `MemoryStore`, injecting faults into price loads
pub struct FaultyStore {
    pub inner: MemoryStore,
    fault: Fault,
    calls: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore, fault: Fault) -> Self {
        Self {
            inner,
            fault,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn price_loads(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndicatorStore for FaultyStore {
    async fn upsert_symbol(&self, key: &SeriesKey, name: &str) -> Result<(), StoreError> {
        self.inner.upsert_symbol(key, name).await
    }

    async fn list_symbols(
        &self,
        market: MarketKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SymbolInfo>, StoreError> {
        self.inner.list_symbols(market, from, to).await
    }

    async fn upsert_prices(&self, key: &SeriesKey, points: &[PricePoint]) -> Result<(), StoreError> {
        self.inner.upsert_prices(key, points).await
    }

    async fn load_prices(
        &self,
        key: &SeriesKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, StoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fault {
            Fault::Unavailable => Err(StoreError::Unavailable("connection reset".to_string())),
            Fault::Conflicts(n) if call < n => Err(StoreError::Conflict("serialization failure".to_string())),
            Fault::Conflicts(_) => self.inner.load_prices(key, from, to).await,
        }
    }

    async fn upsert_fundamentals(
        &self,
        key: &SeriesKey,
        date: NaiveDate,
        fundamentals: &Fundamentals,
    ) -> Result<(), StoreError> {
        self.inner.upsert_fundamentals(key, date, fundamentals).await
    }

    async fn load_prior_state(&self, key: &SeriesKey, before: NaiveDate) -> Result<PriorState, StoreError> {
        self.inner.load_prior_state(key, before).await
    }

    async fn upsert_williams_r(&self, key: &SeriesKey, reading: &WilliamsRReading) -> Result<(), StoreError> {
        self.inner.upsert_williams_r(key, reading).await
    }

    async fn upsert_force_index(&self, key: &SeriesKey, reading: &ForceIndexReading) -> Result<(), StoreError> {
        self.inner.upsert_force_index(key, reading).await
    }

    async fn upsert_anchored_obv(
        &self,
        key: &SeriesKey,
        reading: &AnchoredObvReading,
    ) -> Result<(), StoreError> {
        self.inner.upsert_anchored_obv(key, reading).await
    }

    async fn clear_readings(
        &self,
        key: &SeriesKey,
        date: NaiveDate,
        kinds: &[IndicatorKind],
    ) -> Result<(), StoreError> {
        self.inner.clear_readings(key, date, kinds).await
    }

    async fn load_readings(&self, key: &SeriesKey, date: NaiveDate) -> Result<SymbolReadings, StoreError> {
        self.inner.load_readings(key, date).await
    }

    async fn load_metric_values(
        &self,
        market: MarketKey,
        date: NaiveDate,
        metric: Metric,
    ) -> Result<Vec<MetricValue>, StoreError> {
        self.inner.load_metric_values(market, date, metric).await
    }

    async fn replace_rankings(
        &self,
        market: MarketKey,
        date: NaiveDate,
        metric: Metric,
        rankings: &[RankedMetric],
    ) -> Result<(), StoreError> {
        self.inner.replace_rankings(market, date, metric, rankings).await
    }

    async fn load_rankings(&self, market: MarketKey, date: NaiveDate) -> Result<Vec<RankedMetric>, StoreError> {
        self.inner.load_rankings(market, date).await
    }

    async fn load_alert_entry(
        &self,
        key: &SeriesKey,
        date: NaiveDate,
    ) -> Result<Option<AlertLedgerEntry>, StoreError> {
        self.inner.load_alert_entry(key, date).await
    }

    async fn upsert_alert_entry(&self, market: MarketKey, entry: &AlertLedgerEntry) -> Result<(), StoreError> {
        self.inner.upsert_alert_entry(market, entry).await
    }

    async fn latest_readings(&self, market: MarketKey) -> Result<Vec<SymbolReadings>, StoreError> {
        self.inner.latest_readings(market).await
    }

    async fn latest_rankings(&self, market: MarketKey) -> Result<Vec<RankedMetric>, StoreError> {
        self.inner.latest_rankings(market).await
    }

    async fn recent_alerts(
        &self,
        market: MarketKey,
        since: NaiveDate,
    ) -> Result<Vec<AlertLedgerEntry>, StoreError> {
        self.inner.recent_alerts(market, since).await
    }
}
