//! Unit tests for Heikin-Ashi candles and color-change alerts

use chrono::{Duration, NaiveDate};
use regime_alerts::indicators::trend::{
    aggregate_to_period, detect_alert, detect_color_change, transform, HeikinAshiTimeframe,
};
use regime_alerts::models::alert::AlertKind;
use regime_alerts::models::indicators::{CandleColor, ColorChange, PricePoint};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn rows(ohlc: &[(f64, f64, f64, f64)]) -> Vec<PricePoint> {
    ohlc.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| PricePoint::new(start() + Duration::days(i as i64), o, h, l, c, 100.0))
        .collect()
}

fn zigzag(count: usize) -> Vec<PricePoint> {
    let ohlc: Vec<(f64, f64, f64, f64)> = (0..count)
        .map(|i| {
            let base = 100.0 + if i % 3 == 0 { 5.0 } else { -2.0 } + i as f64 * 0.3;
            (base, base + 3.0, base - 4.0, base + if i % 2 == 0 { 2.0 } else { -2.5 })
        })
        .collect();
    rows(&ohlc)
}

#[test]
fn test_candles_bound_open_and_close() {
    for candle in transform(&zigzag(40)) {
        let (open, close) = (candle.ha_open.unwrap(), candle.ha_close.unwrap());
        assert!(candle.ha_high.unwrap() >= open.max(close));
        assert!(candle.ha_low.unwrap() <= open.min(close));
    }
}

#[test]
fn test_first_candle_seeds_with_open() {
    let candles = transform(&rows(&[(10.0, 12.0, 8.0, 11.0), (11.0, 13.0, 10.0, 12.0)]));
    assert_eq!(candles[0].ha_open, Some(10.0));
    assert_eq!(candles[0].ha_close, Some(10.25));
    assert_eq!(candles[0].ha_color, Some(CandleColor::Green));
    // (10 + 10.25) / 2
    assert_eq!(candles[1].ha_open, Some(10.125));
}

#[test]
fn test_null_row_yields_null_candle_and_recurrence_resumes() {
    let mut series = rows(&[(10.0, 12.0, 8.0, 11.0), (0.0, 0.0, 0.0, 0.0), (11.0, 13.0, 10.0, 12.0)]);
    series[1].close = None;

    let candles = transform(&series);
    assert_eq!(candles.len(), 3);
    assert!(candles[1].ha_open.is_none());
    assert!(candles[1].ha_color.is_none());
    assert_eq!(candles[2].ha_open, Some(10.125));
}

#[test]
fn test_aggregate_drops_partial_period() {
    assert_eq!(aggregate_to_period(&zigzag(9), 3).len(), 3);
    assert_eq!(aggregate_to_period(&zigzag(10), 3).len(), 3);
    assert!(aggregate_to_period(&zigzag(10), 0).is_empty());
}

#[test]
fn test_aggregate_period_values() {
    let series = rows(&[(10.0, 12.0, 8.0, 11.0), (11.0, 15.0, 9.0, 14.0), (14.0, 14.5, 7.0, 13.0)]);
    let periods = aggregate_to_period(&series, 3);
    assert_eq!(periods.len(), 1);
    let p = &periods[0];
    assert_eq!(p.timestamp, series[2].timestamp);
    assert_eq!(p.open, Some(10.0));
    assert_eq!(p.high, Some(15.0));
    assert_eq!(p.low, Some(7.0));
    assert_eq!(p.close, Some(13.0));
    assert_eq!(p.volume, Some(300.0));
}

#[test]
fn test_color_change_detection() {
    assert_eq!(
        detect_color_change(CandleColor::Green, CandleColor::Red),
        Some(ColorChange::RedToGreen)
    );
    assert_eq!(
        detect_color_change(CandleColor::Red, CandleColor::Green),
        Some(ColorChange::GreenToRed)
    );
    assert_eq!(detect_color_change(CandleColor::Green, CandleColor::Green), None);
}

#[test]
fn test_three_day_bullish_alert() {
    let series = rows(&[
        (110.0, 111.0, 104.0, 106.0),
        (106.0, 107.0, 102.0, 103.0),
        (103.0, 104.0, 99.0, 100.0),
        (100.0, 106.0, 99.0, 105.0),
        (105.0, 113.0, 104.0, 112.0),
        (112.0, 121.0, 111.0, 120.0),
    ]);
    let alert = detect_alert(&series, HeikinAshiTimeframe::ThreeDay).unwrap();
    assert_eq!(alert.kind, AlertKind::HeikinAshi3dBullish);
    assert_eq!(alert.value, "red_to_green");
    assert_eq!(alert.description, "3-day Heikin-Ashi color change: red_to_green");
}

#[test]
fn test_three_day_needs_six_rows() {
    let series = rows(&[
        (110.0, 111.0, 104.0, 106.0),
        (106.0, 107.0, 102.0, 103.0),
        (103.0, 104.0, 99.0, 100.0),
        (100.0, 106.0, 99.0, 105.0),
        (105.0, 113.0, 104.0, 112.0),
    ]);
    assert!(detect_alert(&series, HeikinAshiTimeframe::ThreeDay).is_none());
}

#[test]
fn test_two_week_bearish_alert() {
    let mut ohlc = Vec::new();
    for i in 0..10 {
        let open = 100.0 + 3.0 * i as f64;
        let close = open + 3.0;
        ohlc.push((open, close + 1.0, open - 1.0, close));
    }
    for j in 0..10 {
        let open = 130.0 - 6.0 * j as f64;
        let close = open - 6.0;
        ohlc.push((open, open + 1.0, close - 1.0, close));
    }

    let alert = detect_alert(&rows(&ohlc), HeikinAshiTimeframe::TwoWeek).unwrap();
    assert_eq!(alert.kind, AlertKind::HeikinAshi2wBearish);
    assert_eq!(alert.value, "green_to_red");
}

#[test]
fn test_two_week_needs_two_periods() {
    assert!(detect_alert(&zigzag(9), HeikinAshiTimeframe::TwoWeek).is_none());
    assert!(detect_alert(&zigzag(15), HeikinAshiTimeframe::TwoWeek).is_none());
}
