//! Unit tests for quarter-anchored OBV

use chrono::{Duration, NaiveDate};
use regime_alerts::indicators::volume::{
    calculate_anchored_obv, confidence, detect_cross, obv_series, quarter_anchor,
};
use regime_alerts::models::indicators::{Bar, ObvCross};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn weekly(start: NaiveDate, closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(start + Duration::days(7 * i as i64), c, c + 1.0, c - 1.0, c, 100.0))
        .collect()
}

#[test]
fn test_quarter_anchor() {
    assert_eq!(quarter_anchor(date(2024, 5, 15)), date(2024, 4, 1));
    assert_eq!(quarter_anchor(date(2024, 1, 1)), date(2024, 1, 1));
    assert_eq!(quarter_anchor(date(2024, 12, 31)), date(2024, 10, 1));
}

#[test]
fn test_obv_series() {
    let bars = weekly(date(2024, 1, 7), &[10.0, 11.0, 11.0, 9.0]);
    assert_eq!(obv_series(&bars), vec![0.0, 100.0, 100.0, 0.0]);
}

#[test]
fn test_confidence() {
    let anchor = date(2024, 7, 1);
    let eval = date(2024, 9, 1);
    assert_eq!(confidence(9, anchor, eval), 100.0);
    assert!((confidence(3, anchor, eval) - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(confidence(20, anchor, eval), 100.0);
}

#[test]
fn test_zero_line_crosses() {
    assert_eq!(detect_cross(5.0, Some(-1.0)), ObvCross::PositiveCross);
    assert_eq!(detect_cross(5.0, Some(0.0)), ObvCross::PositiveCross);
    assert_eq!(detect_cross(-5.0, Some(2.0)), ObvCross::NegativeCross);
    assert_eq!(detect_cross(5.0, Some(2.0)), ObvCross::None);
    assert_eq!(detect_cross(5.0, None), ObvCross::None);
}

#[test]
fn test_no_bars_since_anchor() {
    let bars = weekly(date(2024, 5, 5), &[10.0, 11.0]);
    let err = calculate_anchored_obv(&bars, date(2024, 7, 3), None).unwrap_err();
    assert!(err.is_insufficient_data());
}

#[test]
fn test_single_bar_since_anchor_is_zero() {
    let bars = weekly(date(2024, 6, 30), &[10.0, 11.0]);
    let reading = calculate_anchored_obv(&bars, date(2024, 7, 7), Some(-500.0)).unwrap();
    assert_eq!(reading.anchored_obv, 0.0);
    assert_eq!(reading.cross, ObvCross::None);
}

#[test]
fn test_accumulates_from_anchor() {
    // the June bar is before the Q3 anchor and does not count
    let bars = weekly(date(2024, 6, 30), &[50.0, 10.0, 11.0, 12.0]);
    let eval = date(2024, 7, 21);
    let reading = calculate_anchored_obv(&bars, eval, Some(-100.0)).unwrap();
    assert_eq!(reading.anchor_date, date(2024, 7, 1));
    assert_eq!(reading.timestamp, eval);
    assert_eq!(reading.anchored_obv, 200.0);
    assert_eq!(reading.cross, ObvCross::PositiveCross);
    assert_eq!(reading.confidence, 100.0);
}
