//! Integration tests for the Worker
//!
//! Runs the batch runtime against the in-memory store: weekly evaluation,
//! alert ledger, ranking and failure handling.

#[path = "worker/test_utils.rs"]
pub mod test_utils;

use chrono::Duration;
use regime_alerts::db::{IndicatorStore, MemoryStore};
use regime_alerts::models::alert::AlertKind;
use regime_alerts::models::indicators::{ForceIndexState, MomentumState, PricePoint};
use regime_alerts::models::market::{BaseCurrency, Market, MarketKey};
use regime_alerts::models::ranking::{Fundamentals, Metric};
use std::sync::Arc;

use test_utils::{
    flat_rows, runtime, scenario_date, scenario_dates, scenario_rows, seed, test_config, uptick_date, Fault,
    FaultyStore,
};

fn eth() -> MarketKey {
    MarketKey {
        market: Market::Crypto,
        base: BaseCurrency::Eth,
    }
}

fn crypto_usd() -> MarketKey {
    MarketKey {
        market: Market::Crypto,
        base: BaseCurrency::Usd,
    }
}

#[tokio::test]
async fn oversold_alert_fires_on_uptick_week_only() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref(), MarketKey::us(), "AAPL", &scenario_rows()).await;
    let runtime = runtime(store.clone(), test_config());

    let results = runtime.run_range(&[MarketKey::us()], &scenario_dates()).await;
    assert_eq!(results.len(), scenario_dates().len());
    for (_, result) in &results {
        let report = result.as_ref().expect("Batch should complete");
        assert_eq!(report.succeeded, vec!["AAPL".to_string()]);
        assert!(report.ranking.is_some());
    }

    let entries = store
        .recent_alerts(MarketKey::us(), scenario_date(0))
        .await
        .expect("Should load alerts");
    let oversold: Vec<_> = entries.iter().filter(|e| e.has(&AlertKind::Oversold)).collect();
    assert_eq!(oversold.len(), 1);
    assert_eq!(oversold[0].date, uptick_date());
    assert_eq!(oversold[0].name, "AAPL");

    let key = MarketKey::us().series("AAPL");
    let uptick = store.load_readings(&key, uptick_date()).await.unwrap();
    let williams = uptick.williams_r.expect("Williams %R reading");
    assert_eq!(williams.state, MomentumState::Fresh);
    assert!(williams.williams_r > williams.williams_r_ema);
    let force = uptick.force_index.expect("Force Index reading");
    assert_eq!(force.state, ForceIndexState::Fresh);
    assert!(force.fast > force.slow);
    assert!(force.previous_fast <= force.previous_slow);

    let decline = store
        .load_readings(&key, uptick_date() - Duration::days(7))
        .await
        .unwrap();
    assert_eq!(decline.williams_r.unwrap().state, MomentumState::Inactive);
    assert_eq!(decline.force_index.unwrap().state, ForceIndexState::Inactive);
}

#[tokio::test]
async fn rerunning_a_date_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref(), MarketKey::us(), "AAPL", &scenario_rows()).await;
    let runtime = runtime(store.clone(), test_config());

    runtime.run_range(&[MarketKey::us()], &scenario_dates()).await;
    let key = MarketKey::us().series("AAPL");
    let ledger = store.load_alert_entry(&key, uptick_date()).await.unwrap();
    let readings = store.load_readings(&key, uptick_date()).await.unwrap();

    let report = runtime
        .run(MarketKey::us(), uptick_date())
        .await
        .expect("Re-run should complete");
    assert_eq!(report.alerts_added, 0);
    assert_eq!(store.load_alert_entry(&key, uptick_date()).await.unwrap(), ledger);
    assert_eq!(store.load_readings(&key, uptick_date()).await.unwrap(), readings);
}

#[tokio::test]
async fn symbols_without_history_are_skipped() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref(), MarketKey::us(), "AAPL", &scenario_rows()).await;
    seed(store.as_ref(), MarketKey::us(), "NEWCO", &scenario_rows()[..3]).await;
    let runtime = runtime(store.clone(), test_config());

    let report = runtime.run(MarketKey::us(), uptick_date()).await.unwrap();
    assert_eq!(report.succeeded, vec!["AAPL".to_string()]);
    assert_eq!(report.skipped, vec!["NEWCO".to_string()]);
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn ranking_includes_fundamentals_and_erp5() {
    let store = Arc::new(MemoryStore::new());
    let fundamentals = [
        ("AAA", 10.0, 1.0, 0.20, 5.0),
        ("BBB", 20.0, 2.0, 0.10, 8.0),
        ("CCC", 40.0, 4.0, 0.05, 12.0),
    ];
    for (symbol, pe, pb, roe, ev) in fundamentals {
        seed(store.as_ref(), MarketKey::us(), symbol, &scenario_rows()).await;
        store
            .upsert_fundamentals(
                &MarketKey::us().series(symbol),
                uptick_date() - Duration::days(2),
                &Fundamentals {
                    pe_ratio: Some(pe),
                    pb_ratio: Some(pb),
                    return_on_equity: Some(roe),
                    ev_ebitda: Some(ev),
                    ..Fundamentals::default()
                },
            )
            .await
            .unwrap();
    }
    // no fundamentals: ranked on indicators only
    seed(store.as_ref(), MarketKey::us(), "DDD", &scenario_rows()).await;

    let runtime = runtime(store.clone(), test_config());
    let report = runtime.run(MarketKey::us(), uptick_date()).await.unwrap();
    let summary = report.ranking.expect("Ranking should run");
    assert_eq!(
        summary.metrics_ranked,
        Metric::FUNDAMENTALS.len() + Metric::INDICATORS.len() + 1
    );

    let rankings = store.load_rankings(MarketKey::us(), uptick_date()).await.unwrap();
    let mut erp5: Vec<(String, f64)> = rankings
        .iter()
        .filter(|r| r.metric == Metric::Erp5)
        .map(|r| (r.symbol.clone(), r.rank))
        .collect();
    erp5.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        erp5,
        vec![
            ("AAA".to_string(), 1.0),
            ("BBB".to_string(), 51.0),
            ("CCC".to_string(), 100.0)
        ]
    );

    // identical price histories tie on every indicator
    let williams: Vec<f64> = rankings
        .iter()
        .filter(|r| r.metric == Metric::WilliamsR)
        .map(|r| r.rank)
        .collect();
    assert_eq!(williams, vec![1.0; 4]);
}

#[tokio::test]
async fn crypto_ranking_skips_fundamentals() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref(), crypto_usd(), "X:SOLUSD", &scenario_rows()).await;
    let runtime = runtime(store.clone(), test_config());

    let report = runtime.run(crypto_usd(), uptick_date()).await.unwrap();
    assert_eq!(report.ranking.unwrap().metrics_ranked, Metric::INDICATORS.len());
    let rankings = store.load_rankings(crypto_usd(), uptick_date()).await.unwrap();
    assert!(rankings.iter().all(|r| !r.metric.is_fundamental() && r.metric != Metric::Erp5));
}

#[tokio::test]
async fn derived_base_reprices_usd_series() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref(), crypto_usd(), "X:ETHUSD", &flat_rows(2000.0)).await;
    seed(store.as_ref(), crypto_usd(), "X:SOLUSD", &scenario_rows()).await;
    let runtime = runtime(store.clone(), test_config());

    let results = runtime.run_all(&[crypto_usd(), eth()], uptick_date()).await;
    let eth_report = results
        .iter()
        .find(|(m, _)| *m == eth())
        .and_then(|(_, r)| r.as_ref().ok())
        .expect("ETH batch should complete");
    assert_eq!(eth_report.succeeded, vec!["X:SOLUSD".to_string()]);

    let usd = store
        .load_readings(&crypto_usd().series("X:SOLUSD"), uptick_date())
        .await
        .unwrap();
    let in_eth = store
        .load_readings(&eth().series("X:SOLUSD"), uptick_date())
        .await
        .unwrap();

    // %R is scale free; Force Index scales with price times volume
    let (usd_wr, eth_wr) = (usd.williams_r.unwrap(), in_eth.williams_r.unwrap());
    assert!((usd_wr.williams_r - eth_wr.williams_r).abs() < 1e-9);
    let (usd_fi, eth_fi) = (usd.force_index.unwrap(), in_eth.force_index.unwrap());
    assert!((usd_fi.fast / 4_000_000.0 - eth_fi.fast).abs() < 1e-9);
}

#[tokio::test]
async fn derived_base_without_token_prices_skips_everything() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref(), crypto_usd(), "X:SOLUSD", &scenario_rows()).await;
    let runtime = runtime(store.clone(), test_config());

    let report = runtime.run(eth(), uptick_date()).await.unwrap();
    assert!(report.succeeded.is_empty());
    assert_eq!(report.skipped, vec!["X:SOLUSD".to_string()]);
}

#[tokio::test]
async fn fatal_store_error_halts_the_batch() {
    let memory = MemoryStore::new();
    for symbol in ["AAA", "BBB", "CCC"] {
        seed(&memory, MarketKey::us(), symbol, &scenario_rows()).await;
    }
    let store = Arc::new(FaultyStore::new(memory, Fault::Unavailable));
    let runtime = runtime(store.clone(), test_config()).with_concurrency(1);

    let results = runtime
        .run_range(&[MarketKey::us()], &[uptick_date() - Duration::days(7), uptick_date()])
        .await;
    assert_eq!(results.len(), 1, "date range should stop after a halted batch");

    let report = results[0].1.as_ref().expect("Halted batch still reports");
    assert!(report.halted);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].symbol, "AAA");
    assert_eq!(report.cancelled, vec!["BBB".to_string(), "CCC".to_string()]);
    assert!(report.ranking.is_none());
    assert_eq!(report.total(), 3);
    // unavailable is not retried
    assert_eq!(store.price_loads(), 1);
}

#[tokio::test]
async fn conflicts_are_retried() {
    let memory = MemoryStore::new();
    seed(&memory, MarketKey::us(), "AAPL", &scenario_rows()).await;
    let store = Arc::new(FaultyStore::new(memory, Fault::Conflicts(2)));
    let runtime = runtime(store.clone(), test_config());

    let report = runtime.run(MarketKey::us(), uptick_date()).await.unwrap();
    assert_eq!(report.succeeded, vec!["AAPL".to_string()]);
    assert_eq!(store.price_loads(), 3);
}

#[tokio::test]
async fn incomplete_rows_are_ignored() {
    let store = Arc::new(MemoryStore::new());
    let mut rows = scenario_rows();
    rows.push(PricePoint::from_text(
        uptick_date() - Duration::days(1),
        "85",
        "",
        "84",
        "n/a",
        "1,000",
    ));
    seed(store.as_ref(), MarketKey::us(), "AAPL", &rows).await;
    let runtime = runtime(store.clone(), test_config());

    let report = runtime.run(MarketKey::us(), uptick_date()).await.unwrap();
    assert_eq!(report.succeeded, vec!["AAPL".to_string()]);
}

#[tokio::test]
async fn rerun_after_price_correction_drops_stale_readings() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref(), MarketKey::us(), "AAPL", &scenario_rows()).await;
    let runtime = runtime(store.clone(), test_config());
    let key = MarketKey::us().series("AAPL");

    runtime.run(MarketKey::us(), uptick_date()).await.unwrap();
    let before = store.load_readings(&key, uptick_date()).await.unwrap();
    assert!(before.williams_r.is_some());

    // the vendor withdrew the early history, leaving too few weeks for %R
    let withdrawn: Vec<PricePoint> = (0..21)
        .map(|i| PricePoint::from_text(scenario_date(i), "", "", "", "", ""))
        .collect();
    store.upsert_prices(&key, &withdrawn).await.unwrap();

    let report = runtime.run(MarketKey::us(), uptick_date()).await.unwrap();
    assert_eq!(report.succeeded, vec!["AAPL".to_string()]);

    let after = store.load_readings(&key, uptick_date()).await.unwrap();
    assert!(after.williams_r.is_none());
    assert!(after.force_index.is_some());
    assert!(after.anchored_obv.is_some());
    let prior = store
        .load_prior_state(&key, uptick_date() + Duration::days(7))
        .await
        .unwrap();
    assert!(prior.williams_r.is_none());
}
