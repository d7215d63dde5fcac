//! Job payloads for the evaluation workflow

use crate::models::market::{MarketKey, SeriesKey, SymbolInfo};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Evaluate every engine for one symbol and merge its alerts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateSymbolJob {
    pub market: MarketKey,
    pub symbol: String,
    pub name: String,
    pub date: NaiveDate,
}

impl EvaluateSymbolJob {
    pub fn new(market: MarketKey, info: SymbolInfo, date: NaiveDate) -> Self {
        Self {
            market,
            symbol: info.symbol,
            name: info.name,
            date,
        }
    }

    pub fn series_key(&self) -> SeriesKey {
        self.market.series(self.symbol.clone())
    }
}

/// Rank the whole universe of a market for one date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankDateJob {
    pub market: MarketKey,
    pub date: NaiveDate,
}
