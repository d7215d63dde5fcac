//! Unit tests for base-currency conversion

use chrono::{Duration, NaiveDate};
use regime_alerts::db::{IndicatorStore, MemoryStore};
use regime_alerts::models::indicators::PricePoint;
use regime_alerts::models::market::{BaseCurrency, MarketKey};
use regime_alerts::services::BasePriceCache;

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Duration::days(offset)
}

#[test]
fn test_convert_divides_by_same_day_close() {
    let eth = vec![
        PricePoint::new(day(0), 1.0, 1.0, 1.0, 2000.0, 1.0),
        PricePoint::new(day(1), 1.0, 1.0, 1.0, 2500.0, 1.0),
    ];
    let cache = BasePriceCache::from_series(BaseCurrency::Eth, &eth);
    assert_eq!(cache.len(), 2);

    let sol = vec![
        PricePoint::new(day(0), 100.0, 120.0, 80.0, 110.0, 4000.0),
        PricePoint::new(day(1), 110.0, 125.0, 100.0, 125.0, 5000.0),
        PricePoint::new(day(2), 125.0, 130.0, 120.0, 128.0, 1000.0),
    ];
    let converted = cache.convert(&sol);
    assert_eq!(converted.len(), 2);
    assert_eq!(converted[0].close, Some(110.0 / 2000.0));
    assert_eq!(converted[0].volume, Some(2.0));
    assert_eq!(converted[1].high, Some(125.0 / 2500.0));
}

#[test]
fn test_base_rows_without_positive_close_are_skipped() {
    let bad = PricePoint::new(day(1), 1.0, 1.0, 1.0, 0.0, 1.0);
    let eth = vec![PricePoint::new(day(0), 1.0, 1.0, 1.0, 2000.0, 1.0), bad];
    let cache = BasePriceCache::from_series(BaseCurrency::Eth, &eth);
    assert_eq!(cache.len(), 1);
    assert!(cache.close_on(day(1)).is_none());
}

#[test]
fn test_load_from_store() {
    tokio_test::block_on(async {
        let store = MemoryStore::new();
        let usd = MarketKey::crypto()[0];
        store
            .upsert_prices(
                &usd.series("X:BTCUSD"),
                &[PricePoint::new(day(0), 1.0, 1.0, 1.0, 60000.0, 1.0)],
            )
            .await
            .unwrap();

        let cache = BasePriceCache::load(&store, BaseCurrency::Btc, day(-10), day(10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cache.base(), BaseCurrency::Btc);
        assert_eq!(cache.close_on(day(0)), Some(60000.0));

        let none = BasePriceCache::load(&store, BaseCurrency::Usd, day(-10), day(10)).await.unwrap();
        assert!(none.is_none());
    });
}
