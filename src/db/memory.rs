//! In-process store with the same upsert semantics as PostgreSQL

use crate::db::error::StoreError;
use crate::db::{IndicatorStore, FUNDAMENTALS_MAX_AGE_DAYS};
use crate::models::alert::AlertLedgerEntry;
use crate::models::indicators::{
    AnchoredObvReading, ForceIndexReading, IndicatorKind, PricePoint, PriorState, SymbolReadings,
    WilliamsRReading,
};
use crate::models::market::{MarketKey, SeriesKey, SymbolInfo};
use crate::models::ranking::{Fundamentals, Metric, MetricValue, RankedMetric};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    names: BTreeMap<SeriesKey, String>,
    prices: BTreeMap<SeriesKey, BTreeMap<NaiveDate, PricePoint>>,
    fundamentals: BTreeMap<SeriesKey, BTreeMap<NaiveDate, Fundamentals>>,
    readings: BTreeMap<SeriesKey, BTreeMap<NaiveDate, SymbolReadings>>,
    rankings: BTreeMap<(MarketKey, NaiveDate, Metric), Vec<RankedMetric>>,
    ledger: BTreeMap<(MarketKey, NaiveDate, String), AlertLedgerEntry>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call fail as if the connection had dropped
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store marked unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn reading_entry<'a>(
        state: &'a mut MemoryState,
        key: &SeriesKey,
        date: NaiveDate,
    ) -> &'a mut SymbolReadings {
        state
            .readings
            .entry(key.clone())
            .or_default()
            .entry(date)
            .or_insert_with(|| SymbolReadings::empty(key.symbol.clone(), date))
    }

    fn keys_for(state: &MemoryState, market: MarketKey) -> BTreeSet<SeriesKey> {
        state
            .prices
            .keys()
            .chain(state.readings.keys())
            .filter(|k| k.market_key() == market)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl IndicatorStore for MemoryStore {
    async fn upsert_symbol(&self, key: &SeriesKey, name: &str) -> Result<(), StoreError> {
        self.check()?;
        self.state.write().await.names.insert(key.clone(), name.to_string());
        Ok(())
    }

    async fn list_symbols(
        &self,
        market: MarketKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SymbolInfo>, StoreError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .prices
            .iter()
            .filter(|(key, rows)| key.market_key() == market && rows.range(from..=to).next().is_some())
            .map(|(key, _)| {
                let info = SymbolInfo::new(key.symbol.clone());
                match state.names.get(key) {
                    Some(name) => info.with_name(name.clone()),
                    None => info,
                }
            })
            .collect())
    }

    async fn upsert_prices(&self, key: &SeriesKey, points: &[PricePoint]) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.write().await;
        let rows = state.prices.entry(key.clone()).or_default();
        for p in points {
            rows.insert(p.timestamp, p.clone());
        }
        Ok(())
    }

    async fn load_prices(
        &self,
        key: &SeriesKey,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, StoreError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .prices
            .get(key)
            .map(|rows| rows.range(from..=to).map(|(_, p)| p.clone()).collect())
            .unwrap_or_default())
    }

    async fn upsert_fundamentals(
        &self,
        key: &SeriesKey,
        date: NaiveDate,
        fundamentals: &Fundamentals,
    ) -> Result<(), StoreError> {
        self.check()?;
        self.state
            .write()
            .await
            .fundamentals
            .entry(key.clone())
            .or_default()
            .insert(date, fundamentals.clone());
        Ok(())
    }

    async fn load_prior_state(&self, key: &SeriesKey, before: NaiveDate) -> Result<PriorState, StoreError> {
        self.check()?;
        let state = self.state.read().await;
        let mut prior = PriorState::default();
        let Some(rows) = state.readings.get(key) else {
            return Ok(prior);
        };

        let earlier = || rows.range(..before).rev().map(|(_, r)| r);
        prior.williams_r = earlier().find_map(|r| r.williams_r.as_ref().map(|w| w.state));
        if let Some(fi) = earlier().find_map(|r| r.force_index.as_ref()) {
            prior = prior.with_force_index(fi.fast, fi.slow, fi.state);
        }
        prior.anchored_obv = earlier().find_map(|r| r.anchored_obv.as_ref().map(|o| o.anchored_obv));
        Ok(prior)
    }

    async fn upsert_williams_r(&self, key: &SeriesKey, reading: &WilliamsRReading) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.write().await;
        Self::reading_entry(&mut state, key, reading.timestamp).williams_r = Some(reading.clone());
        Ok(())
    }

    async fn upsert_force_index(&self, key: &SeriesKey, reading: &ForceIndexReading) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.write().await;
        Self::reading_entry(&mut state, key, reading.timestamp).force_index = Some(reading.clone());
        Ok(())
    }

    async fn upsert_anchored_obv(
        &self,
        key: &SeriesKey,
        reading: &AnchoredObvReading,
    ) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.write().await;
        Self::reading_entry(&mut state, key, reading.timestamp).anchored_obv = Some(reading.clone());
        Ok(())
    }

    async fn clear_readings(
        &self,
        key: &SeriesKey,
        date: NaiveDate,
        kinds: &[IndicatorKind],
    ) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.write().await;
        let Some(rows) = state.readings.get_mut(key) else {
            return Ok(());
        };
        if let Some(readings) = rows.get_mut(&date) {
            for &kind in kinds {
                readings.clear(kind);
            }
            if readings.is_empty() {
                rows.remove(&date);
            }
        }
        Ok(())
    }

    async fn load_readings(&self, key: &SeriesKey, date: NaiveDate) -> Result<SymbolReadings, StoreError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .readings
            .get(key)
            .and_then(|rows| rows.get(&date))
            .cloned()
            .unwrap_or_else(|| SymbolReadings::empty(key.symbol.clone(), date)))
    }

    async fn load_metric_values(
        &self,
        market: MarketKey,
        date: NaiveDate,
        metric: Metric,
    ) -> Result<Vec<MetricValue>, StoreError> {
        self.check()?;
        let state = self.state.read().await;

        if metric.is_fundamental() {
            let oldest = date - Duration::days(FUNDAMENTALS_MAX_AGE_DAYS);
            return Ok(state
                .fundamentals
                .iter()
                .filter(|(key, _)| key.market_key() == market)
                .filter_map(|(key, rows)| {
                    let (when, f) = rows.range(..=date).next_back()?;
                    (*when > oldest).then(|| MetricValue::new(key.symbol.clone(), f.value(metric)))
                })
                .collect());
        }

        let pick = |r: &SymbolReadings| -> Option<f64> {
            match metric {
                Metric::WilliamsR => r.williams_r.as_ref().map(|w| w.williams_r),
                Metric::WilliamsREma => r.williams_r.as_ref().map(|w| w.williams_r_ema),
                Metric::ForceIndexFast => r.force_index.as_ref().map(|f| f.fast),
                Metric::ForceIndexSlow => r.force_index.as_ref().map(|f| f.slow),
                _ => None,
            }
        };

        Ok(state
            .readings
            .iter()
            .filter(|(key, _)| key.market_key() == market)
            .filter_map(|(key, rows)| {
                let r = rows.get(&date)?;
                Some(MetricValue::new(key.symbol.clone(), pick(r)))
            })
            .collect())
    }

    async fn replace_rankings(
        &self,
        market: MarketKey,
        date: NaiveDate,
        metric: Metric,
        rankings: &[RankedMetric],
    ) -> Result<(), StoreError> {
        self.check()?;
        self.state
            .write()
            .await
            .rankings
            .insert((market, date, metric), rankings.to_vec());
        Ok(())
    }

    async fn load_rankings(&self, market: MarketKey, date: NaiveDate) -> Result<Vec<RankedMetric>, StoreError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .rankings
            .iter()
            .filter(|((m, d, _), _)| *m == market && *d == date)
            .flat_map(|(_, rows)| rows.iter().cloned())
            .collect())
    }

    async fn load_alert_entry(
        &self,
        key: &SeriesKey,
        date: NaiveDate,
    ) -> Result<Option<AlertLedgerEntry>, StoreError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .ledger
            .get(&(key.market_key(), date, key.symbol.clone()))
            .cloned())
    }

    async fn upsert_alert_entry(&self, market: MarketKey, entry: &AlertLedgerEntry) -> Result<(), StoreError> {
        self.check()?;
        self.state
            .write()
            .await
            .ledger
            .insert((market, entry.date, entry.symbol.clone()), entry.clone());
        Ok(())
    }

    async fn latest_readings(&self, market: MarketKey) -> Result<Vec<SymbolReadings>, StoreError> {
        self.check()?;
        let state = self.state.read().await;
        Ok(Self::keys_for(&state, market)
            .iter()
            .filter_map(|key| state.readings.get(key)?.values().next_back().cloned())
            .collect())
    }

    async fn latest_rankings(&self, market: MarketKey) -> Result<Vec<RankedMetric>, StoreError> {
        self.check()?;
        let state = self.state.read().await;
        let mut latest: BTreeMap<(String, Metric), RankedMetric> = BTreeMap::new();
        for ((m, _, _), rows) in state.rankings.iter() {
            if *m != market {
                continue;
            }
            for r in rows {
                let slot = latest.entry((r.symbol.clone(), r.metric)).or_insert_with(|| r.clone());
                if r.date > slot.date {
                    *slot = r.clone();
                }
            }
        }
        Ok(latest.into_values().collect())
    }

    async fn recent_alerts(
        &self,
        market: MarketKey,
        since: NaiveDate,
    ) -> Result<Vec<AlertLedgerEntry>, StoreError> {
        self.check()?;
        let state = self.state.read().await;
        let mut entries: Vec<AlertLedgerEntry> = state
            .ledger
            .iter()
            .filter(|((m, d, _), _)| *m == market && *d >= since)
            .map(|(_, e)| e.clone())
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.symbol.cmp(&b.symbol)));
        Ok(entries)
    }
}
