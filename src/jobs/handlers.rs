//! Job handlers for the evaluation workflow

use crate::error::EngineError;
use crate::indicators::error::IndicatorError;
use crate::indicators::momentum::calculate_williams_r;
use crate::indicators::resample::{complete_bars, to_weekly};
use crate::indicators::trend::{detect_alert, HeikinAshiTimeframe};
use crate::indicators::volume::{calculate_anchored_obv, calculate_force_index};
use crate::jobs::context::JobContext;
use crate::jobs::types::{EvaluateSymbolJob, RankDateJob};
use crate::jobs::workflow::{RankingSummary, SymbolOutcome};
use crate::models::alert::{Alert, AlertLedgerEntry};
use crate::models::indicators::{IndicatorKind, PricePoint, SymbolReadings};
use crate::models::market::{BaseCurrency, MarketKey, SeriesKey};
use crate::models::ranking::{Metric, RankedMetric};
use crate::ranking::{erp5_percentiles, rank_metric, ranked_metrics, ERP5_COMPONENTS};
use crate::services::conversion::BasePriceCache;
use crate::signals::{merge_alerts, AlertAggregator, AlertInputs};
use chrono::{Duration, NaiveDate};
use std::time::Instant;
use tracing::{debug, info};

/// Load the daily series for a job, re-pricing derived crypto bases through
/// `base_prices` when given.
async fn load_daily_series(
    job: &EvaluateSymbolJob,
    ctx: &JobContext,
    base_prices: Option<&BasePriceCache>,
) -> Result<Vec<PricePoint>, EngineError> {
    let from = job.date - Duration::days(ctx.config.history_days);

    match base_prices {
        Some(cache) if job.market.is_derived_base() => {
            let usd = MarketKey {
                market: job.market.market,
                base: BaseCurrency::Usd,
            };
            let series = ctx.store.load_prices(&usd.series(job.symbol.clone()), from, job.date).await?;
            Ok(cache.convert(&series))
        }
        _ => Ok(ctx.store.load_prices(&job.series_key(), from, job.date).await?),
    }
}

/// Separate an engine result into a reading or an "insufficient data" note.
/// Any other indicator error is returned.
fn settle<T>(
    kind: IndicatorKind,
    result: Result<T, IndicatorError>,
    insufficient: &mut Vec<IndicatorKind>,
    symbol: &str,
) -> Result<Option<T>, EngineError> {
    match result {
        Ok(reading) => Ok(Some(reading)),
        Err(e) if e.is_insufficient_data() => {
            debug!(symbol = %symbol, engine = %kind, reason = %e, "Engine skipped for insufficient data");
            insufficient.push(kind);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Handler for evaluating one symbol
///
/// Runs the Williams %R, Force Index and anchored OBV engines against the
/// weekly series, upserts their readings, then merges alerts into the ledger.
pub async fn handle_evaluate_symbol(
    job: &EvaluateSymbolJob,
    ctx: &JobContext,
    base_prices: Option<&BasePriceCache>,
) -> Result<SymbolOutcome, EngineError> {
    let start = Instant::now();
    if let Some(ref metrics) = ctx.metrics {
        metrics.evaluations_active.inc();
    }

    let result = evaluate_symbol(job, ctx, base_prices).await;

    if let Some(ref metrics) = ctx.metrics {
        metrics.evaluations_active.dec();
        metrics
            .symbol_evaluation_seconds
            .observe(start.elapsed().as_secs_f64());
        match &result {
            Ok(SymbolOutcome::Evaluated { alerts_added, .. }) => {
                metrics.symbols_evaluated_total.inc();
                metrics.alerts_written_total.inc_by(*alerts_added as u64);
            }
            Ok(SymbolOutcome::Skipped { alerts_added, .. }) => {
                metrics.symbols_skipped_total.inc();
                metrics.alerts_written_total.inc_by(*alerts_added as u64);
            }
            Err(_) => metrics.symbols_failed_total.inc(),
        }
    }

    result
}

async fn evaluate_symbol(
    job: &EvaluateSymbolJob,
    ctx: &JobContext,
    base_prices: Option<&BasePriceCache>,
) -> Result<SymbolOutcome, EngineError> {
    let key = job.series_key();
    let config = &ctx.config;

    let daily = load_daily_series(job, ctx, base_prices).await?;
    let prior = ctx.store.load_prior_state(&key, job.date).await?;

    let bars = complete_bars(&daily);
    if bars.len() < daily.len() {
        debug!(
            symbol = %job.symbol,
            dropped = daily.len() - bars.len(),
            "EvaluateSymbolJob: dropped incomplete price rows"
        );
    }
    let weekly = to_weekly(&bars, job.date, config.max_weeks);
    debug!(
        symbol = %job.symbol,
        daily = bars.len(),
        weekly = weekly.len(),
        "EvaluateSymbolJob: evaluating {} on {}",
        job.symbol,
        job.date
    );

    let mut insufficient = Vec::new();
    let williams = settle(
        IndicatorKind::WilliamsR,
        calculate_williams_r(&weekly, &config.williams_r, prior.williams_r),
        &mut insufficient,
        &job.symbol,
    )?;
    let force = settle(
        IndicatorKind::ForceIndex,
        calculate_force_index(&weekly, &config.force_index(job.market.market), prior.force_index.as_ref()),
        &mut insufficient,
        &job.symbol,
    )?;
    let obv = settle(
        IndicatorKind::AnchoredObv,
        calculate_anchored_obv(&weekly, job.date, prior.anchored_obv),
        &mut insufficient,
        &job.symbol,
    )?;

    // every reading is keyed by the evaluation date, even when the latest week has no rows
    let williams = williams.map(|mut r| {
        r.timestamp = job.date;
        r
    });
    let force = force.map(|mut r| {
        r.timestamp = job.date;
        r
    });

    let store = &ctx.store;
    tokio::try_join!(
        async {
            match &williams {
                Some(r) => store.upsert_williams_r(&key, r).await,
                None => Ok(()),
            }
        },
        async {
            match &force {
                Some(r) => store.upsert_force_index(&key, r).await,
                None => Ok(()),
            }
        },
        async {
            match &obv {
                Some(r) => store.upsert_anchored_obv(&key, r).await,
                None => Ok(()),
            }
        },
        // a rerun after corrected prices must not leave an older reading behind
        store.clear_readings(&key, job.date, &insufficient),
    )?;

    let readings = SymbolReadings {
        symbol: job.symbol.clone(),
        timestamp: job.date,
        williams_r: williams,
        force_index: force,
        anchored_obv: obv,
    };
    let heikin_ashi = heikin_ashi_alerts(&daily, job.date);
    let alerts_added = handle_aggregate_alerts(job, ctx, &readings, heikin_ashi).await?;

    let insufficient: Vec<String> = insufficient.iter().map(|kind| kind.to_string()).collect();
    if readings.is_empty() {
        return Ok(SymbolOutcome::Skipped {
            alerts_added,
            reason: format!("insufficient data for {}", insufficient.join(", ")),
        });
    }

    Ok(SymbolOutcome::Evaluated {
        alerts_added,
        insufficient,
    })
}

/// 3-day and 2-week Heikin-Ashi color-change alerts for the daily series
pub fn heikin_ashi_alerts(daily: &[PricePoint], date: NaiveDate) -> Vec<Alert> {
    [HeikinAshiTimeframe::ThreeDay, HeikinAshiTimeframe::TwoWeek]
        .into_iter()
        .filter_map(|timeframe| {
            let from = date - Duration::days(timeframe.history_days());
            let window: Vec<PricePoint> = daily
                .iter()
                .filter(|p| p.timestamp > from && p.timestamp <= date)
                .cloned()
                .collect();
            detect_alert(&window, timeframe)
        })
        .collect()
}

/// Handler for merging alerts into the ledger
///
/// Composes alerts from the readings written for the job's date and appends
/// the types not already recorded. Returns how many were added.
pub async fn handle_aggregate_alerts(
    job: &EvaluateSymbolJob,
    ctx: &JobContext,
    readings: &SymbolReadings,
    heikin_ashi: Vec<Alert>,
) -> Result<usize, EngineError> {
    let key: SeriesKey = job.series_key();
    let inputs = AlertInputs::from_readings(readings, heikin_ashi);
    let alerts = AlertAggregator::new(ctx.config.obv_requires_oversold).compose(&inputs);
    if alerts.is_empty() {
        return Ok(0);
    }

    let mut entry = ctx
        .store
        .load_alert_entry(&key, job.date)
        .await?
        .unwrap_or_else(|| AlertLedgerEntry::new(job.symbol.clone(), job.date, job.name.clone()));
    let added = merge_alerts(&mut entry, alerts);
    if added == 0 {
        debug!(symbol = %job.symbol, date = %job.date, "Alert ledger already up to date");
        return Ok(0);
    }

    ctx.store.upsert_alert_entry(job.market, &entry).await?;
    info!(
        symbol = %job.symbol,
        date = %job.date,
        added = added,
        alerts = ?entry.alerts.iter().map(|a| a.kind.as_str()).collect::<Vec<_>>(),
        "Alert ledger updated for {}",
        job.symbol
    );
    Ok(added)
}

/// Handler for the per-date ranking pass
///
/// Must run after every symbol of the date has been evaluated. Each metric's
/// ranking for the date is replaced wholesale, then ERP5 is derived for
/// equity markets.
pub async fn handle_rank_date(job: &RankDateJob, ctx: &JobContext) -> Result<RankingSummary, EngineError> {
    let mut summary = RankingSummary::default();
    let mut components: Vec<RankedMetric> = Vec::new();

    for metric in ranked_metrics(job.market.market) {
        let values = ctx.store.load_metric_values(job.market, job.date, metric).await?;
        let ranked = rank_metric(&values, metric, job.date, ctx.config.tie_policy);
        ctx.store
            .replace_rankings(job.market, job.date, metric, &ranked)
            .await?;
        debug!(
            market = %job.market,
            metric = %metric,
            candidates = values.len(),
            ranked = ranked.len(),
            "RankDateJob: ranked {}",
            metric
        );

        summary.metrics_ranked += 1;
        summary.rows_written += ranked.len();
        if ERP5_COMPONENTS.contains(&metric) {
            components.extend(ranked);
        }
    }

    if job.market.market.is_equity() {
        let erp5 = erp5_percentiles(&components, job.date);
        ctx.store
            .replace_rankings(job.market, job.date, Metric::Erp5, &erp5)
            .await?;
        summary.metrics_ranked += 1;
        summary.rows_written += erp5.len();
    }

    if let Some(ref metrics) = ctx.metrics {
        metrics.rankings_written_total.inc_by(summary.rows_written as u64);
    }

    info!(
        market = %job.market,
        date = %job.date,
        metrics = summary.metrics_ranked,
        rows = summary.rows_written,
        "RankDateJob: rankings replaced"
    );
    Ok(summary)
}
