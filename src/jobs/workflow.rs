//! Outcomes of the evaluation workflow
//!
//! The chain per date is: EvaluateSymbolJob for every symbol → RankDateJob.
//! Results are collected into a `BatchReport` that always describes partial
//! success rather than failing the whole batch.

use crate::error::EngineError;
use crate::models::market::MarketKey;
use chrono::NaiveDate;
use serde::Serialize;

/// Result of evaluating one symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SymbolOutcome {
    /// At least one weekly engine wrote a reading
    Evaluated {
        alerts_added: usize,
        /// Engines skipped for lack of history
        insufficient: Vec<String>,
    },
    /// No weekly engine had enough history
    Skipped { alerts_added: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankingSummary {
    pub metrics_ranked: usize,
    pub rows_written: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub market: MarketKey,
    pub date: NaiveDate,
    pub succeeded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<SymbolFailure>,
    /// Never started because the batch halted on a fatal error
    pub cancelled: Vec<String>,
    pub halted: bool,
    pub alerts_added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking: Option<RankingSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking_error: Option<String>,
}

impl BatchReport {
    pub fn new(market: MarketKey, date: NaiveDate) -> Self {
        Self {
            market,
            date,
            succeeded: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            cancelled: Vec::new(),
            halted: false,
            alerts_added: 0,
            ranking: None,
            ranking_error: None,
        }
    }

    pub fn record(&mut self, symbol: String, result: Result<SymbolOutcome, EngineError>) {
        match result {
            Ok(SymbolOutcome::Evaluated { alerts_added, .. }) => {
                self.alerts_added += alerts_added;
                self.succeeded.push(symbol);
            }
            Ok(SymbolOutcome::Skipped { alerts_added, .. }) => {
                self.alerts_added += alerts_added;
                self.skipped.push(symbol);
            }
            Err(e) => self.failed.push(SymbolFailure {
                symbol,
                error: e.to_string(),
            }),
        }
    }

    pub fn cancel(&mut self, symbol: String) {
        self.cancelled.push(symbol);
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.skipped.len() + self.failed.len() + self.cancelled.len()
    }

    /// Sort symbol lists so reports are stable regardless of completion order
    pub fn finish(mut self) -> Self {
        self.succeeded.sort();
        self.skipped.sort();
        self.cancelled.sort();
        self.failed.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        self
    }
}
