//! Prometheus metrics for batch evaluation

use prometheus::{Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub symbols_evaluated_total: IntCounter,
    pub symbols_skipped_total: IntCounter,
    pub symbols_failed_total: IntCounter,
    pub alerts_written_total: IntCounter,
    pub rankings_written_total: IntCounter,
    pub evaluations_active: IntGauge,
    pub symbol_evaluation_seconds: Histogram,
    pub database_connected: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("regime_alerts".to_string()), None)?;

        let symbols_evaluated_total =
            IntCounter::new("symbols_evaluated_total", "Symbols whose engines all produced a reading")?;
        let symbols_skipped_total = IntCounter::new(
            "symbols_skipped_total",
            "Symbols skipped for insufficient history",
        )?;
        let symbols_failed_total =
            IntCounter::new("symbols_failed_total", "Symbols whose evaluation errored")?;
        let alerts_written_total =
            IntCounter::new("alerts_written_total", "Alerts appended to the ledger")?;
        let rankings_written_total =
            IntCounter::new("rankings_written_total", "Ranking rows written")?;
        let evaluations_active =
            IntGauge::new("evaluations_active", "Symbol evaluations currently running")?;
        let symbol_evaluation_seconds = Histogram::with_opts(
            HistogramOpts::new("symbol_evaluation_seconds", "Wall time of one symbol evaluation")
                .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        let database_connected = Gauge::new("database_connected", "1 when the store is reachable")?;

        registry.register(Box::new(symbols_evaluated_total.clone()))?;
        registry.register(Box::new(symbols_skipped_total.clone()))?;
        registry.register(Box::new(symbols_failed_total.clone()))?;
        registry.register(Box::new(alerts_written_total.clone()))?;
        registry.register(Box::new(rankings_written_total.clone()))?;
        registry.register(Box::new(evaluations_active.clone()))?;
        registry.register(Box::new(symbol_evaluation_seconds.clone()))?;
        registry.register(Box::new(database_connected.clone()))?;

        Ok(Self {
            registry,
            symbols_evaluated_total,
            symbols_skipped_total,
            symbols_failed_total,
            alerts_written_total,
            rankings_written_total,
            evaluations_active,
            symbol_evaluation_seconds,
            database_connected,
        })
    }

    /// Text exposition format of every registered metric
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
