//! Batch runtime: evaluates a market's universe for a date, then ranks it

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::jobs::context::JobContext;
use crate::jobs::handlers;
use crate::jobs::types::{EvaluateSymbolJob, RankDateJob};
use crate::jobs::workflow::{BatchReport, SymbolOutcome};
use crate::models::market::{BaseCurrency, MarketKey, SymbolInfo};
use crate::services::conversion::BasePriceCache;
use backon::{ExponentialBuilder, Retryable};
use chrono::{Duration as ChronoDuration, NaiveDate};
use futures_util::future::join_all;
use futures_util::{FutureExt, StreamExt};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Configuration for the batch runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub concurrency: usize,
    pub retry_attempts: usize,
    pub retry_min_delay: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            retry_attempts: 3,
            retry_min_delay: Duration::from_millis(100),
        }
    }
}

impl From<&EngineConfig> for RuntimeConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            retry_attempts: config.retry_attempts,
            ..Self::default()
        }
    }
}

pub struct BatchRuntime {
    config: RuntimeConfig,
    job_context: Arc<JobContext>,
}

impl BatchRuntime {
    pub fn new(config: RuntimeConfig, job_context: Arc<JobContext>) -> Self {
        Self { config, job_context }
    }

    /// Set custom concurrency (default comes from the config)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.config.retry_min_delay)
            .with_max_times(self.config.retry_attempts)
    }

    /// Symbols to evaluate. Derived crypto bases use the USD universe minus
    /// the base token itself.
    async fn universe(&self, market: MarketKey, date: NaiveDate) -> Result<Vec<SymbolInfo>, EngineError> {
        let ctx = &self.job_context;
        let from = date - ChronoDuration::days(ctx.config.history_days);

        if market.is_derived_base() && ctx.config.derive_crypto_bases {
            let usd = MarketKey {
                market: market.market,
                base: BaseCurrency::Usd,
            };
            let token = market.base.token_symbol();
            let symbols = ctx.store.list_symbols(usd, from, date).await?;
            return Ok(symbols
                .into_iter()
                .filter(|s| Some(s.symbol.as_str()) != token)
                .collect());
        }

        Ok(ctx.store.list_symbols(market, from, date).await?)
    }

    async fn evaluate_with_retry(
        &self,
        job: &EvaluateSymbolJob,
        base_prices: Option<&BasePriceCache>,
    ) -> Result<SymbolOutcome, EngineError> {
        let ctx = self.job_context.as_ref();
        let attempt = move || async move {
            AssertUnwindSafe(handlers::handle_evaluate_symbol(job, ctx, base_prices))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(EngineError::Unexpected("symbol evaluation panicked".to_string())))
        };

        attempt
            .retry(self.backoff())
            .when(|e: &EngineError| e.is_retryable())
            .notify(|e: &EngineError, delay: Duration| {
                warn!(symbol = %job.symbol, error = %e, delay_ms = delay.as_millis() as u64, "Retrying symbol");
            })
            .await
    }

    /// Evaluate every symbol of `market` for `date`, then rank the date.
    ///
    /// Per-symbol failures are recorded in the report. A fatal store error
    /// stops scheduling further symbols and skips ranking.
    pub async fn run(&self, market: MarketKey, date: NaiveDate) -> Result<BatchReport, EngineError> {
        let ctx = &self.job_context;
        let symbols = self.universe(market, date).await?;
        info!(
            market = %market,
            date = %date,
            symbols = symbols.len(),
            concurrency = self.config.concurrency,
            "BatchRuntime: evaluating {} symbols",
            symbols.len()
        );

        let base_prices = if market.is_derived_base() && ctx.config.derive_crypto_bases {
            let from = date - ChronoDuration::days(ctx.config.history_days);
            let cache = BasePriceCache::load(ctx.store.as_ref(), market.base, from, date).await?;
            if cache.as_ref().map(|c| c.is_empty()).unwrap_or(false) {
                warn!(market = %market, "No base token prices; every symbol will be skipped");
            }
            cache
        } else {
            None
        };

        let halted = AtomicBool::new(false);
        let halted_ref = &halted;
        let base_ref = base_prices.as_ref();

        let results: Vec<(String, Option<Result<SymbolOutcome, EngineError>>)> =
            futures_util::stream::iter(symbols)
                .map(|info| async move {
                    let symbol = info.symbol.clone();
                    if halted_ref.load(Ordering::SeqCst) {
                        return (symbol, None);
                    }
                    let job = EvaluateSymbolJob::new(market, info, date);
                    let result = self.evaluate_with_retry(&job, base_ref).await;
                    if let Err(ref e) = result {
                        if e.is_fatal() {
                            halted_ref.store(true, Ordering::SeqCst);
                        }
                        error!(symbol = %symbol, date = %date, error = %e, "Symbol evaluation failed");
                    }
                    (symbol, Some(result))
                })
                .buffer_unordered(self.config.concurrency.max(1))
                .collect()
                .await;

        let mut report = BatchReport::new(market, date);
        for (symbol, result) in results {
            match result {
                Some(result) => report.record(symbol, result),
                None => report.cancel(symbol),
            }
        }

        if halted.load(Ordering::SeqCst) {
            report.halted = true;
            error!(
                market = %market,
                date = %date,
                cancelled = report.cancelled.len(),
                "BatchRuntime: halted on fatal error, ranking skipped"
            );
            return Ok(report.finish());
        }

        let rank_job = &RankDateJob { market, date };
        let ctx = ctx.as_ref();
        let ranking = (move || handlers::handle_rank_date(rank_job, ctx))
            .retry(self.backoff())
            .when(|e: &EngineError| e.is_retryable())
            .await;
        match ranking {
            Ok(summary) => report.ranking = Some(summary),
            Err(e) => {
                error!(market = %market, date = %date, error = %e, "Ranking failed");
                report.ranking_error = Some(e.to_string());
            }
        }

        let report = report.finish();
        info!(
            market = %market,
            date = %date,
            succeeded = report.succeeded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            alerts = report.alerts_added,
            "BatchRuntime: batch complete"
        );
        Ok(report)
    }

    /// Run several market keys for the same date concurrently
    pub async fn run_all(
        &self,
        markets: &[MarketKey],
        date: NaiveDate,
    ) -> Vec<(MarketKey, Result<BatchReport, EngineError>)> {
        let runs = markets.iter().map(|&market| async move { (market, self.run(market, date).await) });
        join_all(runs).await
    }

    /// Run dates in ascending order; each date depends on state written by the
    /// previous one. Stops after a date that hit a fatal error.
    pub async fn run_range(
        &self,
        markets: &[MarketKey],
        dates: &[NaiveDate],
    ) -> Vec<(MarketKey, Result<BatchReport, EngineError>)> {
        let mut dates = dates.to_vec();
        dates.sort();
        dates.dedup();

        let mut all = Vec::new();
        for date in dates {
            let results = self.run_all(markets, date).await;
            let fatal = results.iter().any(|(_, r)| match r {
                Ok(report) => report.halted,
                Err(e) => e.is_fatal(),
            });
            all.extend(results);
            if fatal {
                error!(date = %date, "BatchRuntime: stopping date range after fatal error");
                break;
            }
        }
        all
    }
}

/// The last `weeks` weekly evaluation dates ending at `end`, oldest first
pub fn weekly_dates(end: NaiveDate, weeks: usize) -> Vec<NaiveDate> {
    (0..weeks.max(1))
        .rev()
        .map(|k| end - ChronoDuration::days(7 * k as i64))
        .collect()
}
