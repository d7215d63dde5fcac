//! Quarter-anchored On-Balance-Volume

use crate::indicators::error::IndicatorError;
use crate::models::indicators::{AnchoredObvReading, Bar, ObvCross};
use chrono::{Datelike, NaiveDate};

const NAME: &str = "anchored_obv";

/// First day of the calendar quarter containing `date`
pub fn quarter_anchor(date: NaiveDate) -> NaiveDate {
    let month = ((date.month() - 1) / 3) * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
}

/// Cumulative OBV over ascending bars, starting at zero on the first bar
pub fn obv_series(bars: &[Bar]) -> Vec<f64> {
    let mut out = Vec::with_capacity(bars.len());
    let mut obv = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        if i > 0 {
            let prev_close = bars[i - 1].close;
            if bar.close > prev_close {
                obv += bar.volume;
            } else if bar.close < prev_close {
                obv -= bar.volume;
            }
        }
        out.push(obv);
    }
    out
}

/// Share of expected weekly bars present since the anchor, 0-100
pub fn confidence(bars_since_anchor: usize, anchor: NaiveDate, evaluation_date: NaiveDate) -> f64 {
    let days = (evaluation_date - anchor).num_days();
    if days < 0 {
        return 0.0;
    }
    let expected = (days / 7 + 1) as f64;
    (bars_since_anchor as f64 / expected * 100.0).min(100.0)
}

pub fn detect_cross(current: f64, previous: Option<f64>) -> ObvCross {
    match previous {
        Some(prev) if current > 0.0 && prev <= 0.0 => ObvCross::PositiveCross,
        Some(prev) if current < 0.0 && prev >= 0.0 => ObvCross::NegativeCross,
        _ => ObvCross::None,
    }
}

/// OBV accumulated from the quarter anchor of `evaluation_date` over weekly
/// `bars`. Fewer than two bars since the anchor gives an OBV of zero.
pub fn calculate_anchored_obv(
    bars: &[Bar],
    evaluation_date: NaiveDate,
    previous_obv: Option<f64>,
) -> Result<AnchoredObvReading, IndicatorError> {
    let anchor = quarter_anchor(evaluation_date);
    let anchored: Vec<Bar> = bars
        .iter()
        .filter(|b| b.timestamp >= anchor && b.timestamp <= evaluation_date)
        .copied()
        .collect();

    if anchored.is_empty() {
        return Err(IndicatorError::insufficient(NAME, 1, 0));
    }

    let anchored_obv = if anchored.len() < 2 {
        0.0
    } else {
        obv_series(&anchored).last().copied().unwrap_or(0.0)
    };

    Ok(AnchoredObvReading {
        timestamp: evaluation_date,
        anchored_obv,
        anchor_date: anchor,
        confidence: confidence(anchored.len(), anchor, evaluation_date),
        cross: detect_cross(anchored_obv, previous_obv),
    })
}
