//! Unit tests for numeric helpers

use regime_alerts::common::math::{alpha, ema_series_seeded_first, ema_sma_seeded, rolling_max, rolling_min, sma};

#[test]
fn test_alpha() {
    assert!((alpha(1) - 1.0).abs() < 1e-12);
    assert!((alpha(3) - 0.5).abs() < 1e-12);
}

#[test]
fn test_ema_seeded_first_starts_at_first_value() {
    let ema = ema_series_seeded_first(&[10.0, 20.0, 30.0], 3);
    assert_eq!(ema.len(), 3);
    assert_eq!(ema[0], 10.0);
    assert!((ema[1] - 15.0).abs() < 1e-12);
    assert!((ema[2] - 22.5).abs() < 1e-12);
}

#[test]
fn test_ema_sma_seeded() {
    // seed = mean(1, 2, 3) = 2, then 2 + (6 - 2) * 0.5 = 4
    let ema = ema_sma_seeded(&[1.0, 2.0, 3.0, 6.0], 3).unwrap();
    assert!((ema - 4.0).abs() < 1e-12);
}

#[test]
fn test_ema_sma_seeded_insufficient() {
    assert!(ema_sma_seeded(&[1.0, 2.0], 3).is_none());
    assert!(ema_sma_seeded(&[1.0, 2.0], 0).is_none());
}

#[test]
fn test_sma() {
    assert_eq!(sma(&[2.0, 4.0]), Some(3.0));
    assert_eq!(sma(&[]), None);
}

#[test]
fn test_rolling_windows_allow_partial() {
    let values = [3.0, 1.0, 4.0, 1.0, 5.0];
    assert_eq!(rolling_max(&values, 3), vec![3.0, 3.0, 4.0, 4.0, 5.0]);
    assert_eq!(rolling_min(&values, 3), vec![3.0, 1.0, 1.0, 1.0, 1.0]);
}
