//! Regime Alerts Worker
//!
//! Evaluates the configured markets for one weekly date (or a range of
//! weekly dates ending at it), writing readings, rankings and alerts to
//! PostgreSQL.

use chrono::{NaiveDate, Utc};
use dotenvy::dotenv;
use regime_alerts::config::{self, EngineConfig};
use regime_alerts::core::runtime::{weekly_dates, BatchRuntime, RuntimeConfig};
use regime_alerts::db::{IndicatorStore, PostgresStore};
use regime_alerts::jobs::context::JobContext;
use regime_alerts::logging;
use regime_alerts::metrics::Metrics;
use std::env;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let environment = config::get_environment();
    info!("Starting Regime Alerts Worker");
    info!(environment = %environment, "Environment");

    let engine_config = EngineConfig::from_env();
    let markets = config::get_market_keys();

    let end_date = match env::var("EVALUATION_DATE") {
        Ok(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|e| format!("Invalid EVALUATION_DATE '{}': {}", raw, e))?,
        Err(_) => Utc::now().date_naive(),
    };
    let weeks: usize = env::var("EVALUATION_WEEKS")
        .ok()
        .and_then(|w| w.parse().ok())
        .unwrap_or(1);
    let dates = weekly_dates(end_date, weeks);

    let metrics = Arc::new(Metrics::new()?);

    info!("Initializing PostgreSQL connection...");
    let store: Arc<dyn IndicatorStore> = match PostgresStore::new().await {
        Ok(store) => {
            info!("PostgreSQL connected");
            metrics.database_connected.set(1.0);
            Arc::new(store)
        }
        Err(e) => {
            error!(error = %e, "Failed to connect to PostgreSQL");
            return Err(format!("PostgreSQL connection required for worker: {}", e).into());
        }
    };

    let runtime_config = RuntimeConfig::from(&engine_config);
    let job_context = Arc::new(JobContext::new(
        store,
        Arc::new(engine_config),
        Some(metrics.clone()),
    ));
    let runtime = BatchRuntime::new(runtime_config, job_context);

    info!(
        markets = ?markets.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
        from = %dates.first().copied().unwrap_or(end_date),
        to = %end_date,
        weeks = dates.len(),
        "Evaluating {} market(s) over {} week(s)",
        markets.len(),
        dates.len()
    );

    let results = tokio::select! {
        results = runtime.run_range(&markets, &dates) => results,
        _ = signal::ctrl_c() => {
            warn!("Received shutdown signal, abandoning the remaining batches");
            return Ok(());
        }
    };

    let mut failures = 0usize;
    for (market, result) in &results {
        match result {
            Ok(report) => {
                info!(
                    market = %market,
                    date = %report.date,
                    succeeded = report.succeeded.len(),
                    skipped = report.skipped.len(),
                    failed = report.failed.len(),
                    cancelled = report.cancelled.len(),
                    alerts = report.alerts_added,
                    rankings = report.ranking.as_ref().map(|r| r.rows_written).unwrap_or(0),
                    "Batch report"
                );
                for failure in &report.failed {
                    warn!(market = %market, symbol = %failure.symbol, error = %failure.error, "Symbol failed");
                }
                if report.halted || report.ranking_error.is_some() {
                    failures += 1;
                }
            }
            Err(e) => {
                error!(market = %market, error = %e, "Batch failed");
                failures += 1;
            }
        }
    }

    match metrics.export() {
        Ok(text) => tracing::debug!(metrics = %text, "Final metrics"),
        Err(e) => warn!(error = %e, "Failed to export metrics"),
    }

    if failures > 0 {
        return Err(format!("{} batch(es) did not complete", failures).into());
    }

    info!("Worker finished");
    Ok(())
}
