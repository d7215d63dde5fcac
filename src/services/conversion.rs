//! Re-pricing USD crypto series into ETH or BTC terms
//!
//! The base token's USD closes are loaded once per run into a
//! `BasePriceCache` and shared by every symbol of that run.

use crate::db::{IndicatorStore, StoreError};
use crate::models::indicators::PricePoint;
use crate::models::market::{BaseCurrency, Market, MarketKey};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct BasePriceCache {
    base: BaseCurrency,
    closes: BTreeMap<NaiveDate, f64>,
}

impl BasePriceCache {
    /// Build from the base token's USD series. Rows without a positive close
    /// are skipped.
    pub fn from_series(base: BaseCurrency, series: &[PricePoint]) -> Self {
        let closes = series
            .iter()
            .filter_map(|p| {
                let close = p.close.filter(|c| c.is_finite() && *c > 0.0)?;
                Some((p.timestamp, close))
            })
            .collect();
        Self { base, closes }
    }

    /// Load the base token's USD closes for `[from, to]`
    pub async fn load(
        store: &dyn IndicatorStore,
        base: BaseCurrency,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Option<Self>, StoreError> {
        let Some(token) = base.token_symbol() else {
            return Ok(None);
        };
        let usd = MarketKey {
            market: Market::Crypto,
            base: BaseCurrency::Usd,
        };
        let series = store.load_prices(&usd.series(token), from, to).await?;
        let cache = Self::from_series(base, &series);
        debug!(base = %base, token = %token, days = cache.len(), "Loaded base price cache");
        Ok(Some(cache))
    }

    pub fn base(&self) -> BaseCurrency {
        self.base
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.closes.get(&date).copied()
    }

    /// Divide prices and volume by the base close of the same date. Dates
    /// without a base close are dropped.
    pub fn convert(&self, series: &[PricePoint]) -> Vec<PricePoint> {
        series
            .iter()
            .filter_map(|p| {
                let divisor = self.close_on(p.timestamp)?;
                Some(PricePoint {
                    timestamp: p.timestamp,
                    open: p.open.map(|v| v / divisor),
                    high: p.high.map(|v| v / divisor),
                    low: p.low.map(|v| v / divisor),
                    close: p.close.map(|v| v / divisor),
                    volume: p.volume.map(|v| v / divisor),
                })
            })
            .collect()
    }
}
