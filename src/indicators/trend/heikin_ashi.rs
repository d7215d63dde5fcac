//! Heikin-Ashi candles, period aggregation and color-change alerts

use crate::models::alert::{Alert, AlertKind};
use crate::models::indicators::{CandleColor, ColorChange, HeikinAshiCandle, PricePoint};

/// Convert ascending price rows into Heikin-Ashi candles.
///
/// `ha_open` follows the recurrence `(ha_open[i-1] + ha_close[i-1]) / 2`,
/// seeded with the first row's open. A row with a missing or non-finite
/// price yields a candle with null fields; the recurrence resumes from the
/// last complete candle.
pub fn transform(series: &[PricePoint]) -> Vec<HeikinAshiCandle> {
    let mut previous: Option<(f64, f64)> = None;
    let mut candles = Vec::with_capacity(series.len());

    for point in series {
        let prices = match (point.open, point.high, point.low, point.close) {
            (Some(o), Some(h), Some(l), Some(c))
                if o.is_finite() && h.is_finite() && l.is_finite() && c.is_finite() =>
            {
                Some((o, h, l, c))
            }
            _ => None,
        };

        let Some((open, high, low, close)) = prices else {
            candles.push(HeikinAshiCandle {
                timestamp: point.timestamp,
                ha_open: None,
                ha_high: None,
                ha_low: None,
                ha_close: None,
                ha_color: None,
            });
            continue;
        };

        let ha_close = (open + high + low + close) / 4.0;
        let ha_open = match previous {
            Some((prev_open, prev_close)) => (prev_open + prev_close) / 2.0,
            None => open,
        };
        let ha_high = high.max(ha_open).max(ha_close);
        let ha_low = low.min(ha_open).min(ha_close);
        let color = if ha_close >= ha_open {
            CandleColor::Green
        } else {
            CandleColor::Red
        };

        previous = Some((ha_open, ha_close));
        candles.push(HeikinAshiCandle {
            timestamp: point.timestamp,
            ha_open: Some(ha_open),
            ha_high: Some(ha_high),
            ha_low: Some(ha_low),
            ha_close: Some(ha_close),
            ha_color: Some(color),
        });
    }

    candles
}

/// Group consecutive rows into periods of exactly `n`. A trailing partial
/// period is dropped.
pub fn aggregate_to_period(series: &[PricePoint], n: usize) -> Vec<PricePoint> {
    if n == 0 {
        return Vec::new();
    }

    series
        .chunks_exact(n)
        .filter_map(|chunk| {
            let first = chunk.first()?;
            let last = chunk.last()?;
            Some(PricePoint {
                timestamp: last.timestamp,
                open: first.open,
                high: fold_present(chunk.iter().map(|p| p.high), f64::max),
                low: fold_present(chunk.iter().map(|p| p.low), f64::min),
                close: last.close,
                volume: fold_present(chunk.iter().map(|p| p.volume), |a, b| a + b),
            })
        })
        .collect()
}

fn fold_present(values: impl Iterator<Item = Option<f64>>, f: fn(f64, f64) -> f64) -> Option<f64> {
    values
        .flatten()
        .filter(|v| v.is_finite())
        .reduce(f)
}

pub fn detect_color_change(current: CandleColor, previous: CandleColor) -> Option<ColorChange> {
    match (previous, current) {
        (CandleColor::Red, CandleColor::Green) => Some(ColorChange::RedToGreen),
        (CandleColor::Green, CandleColor::Red) => Some(ColorChange::GreenToRed),
        _ => None,
    }
}

/// Granularities at which color changes are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeikinAshiTimeframe {
    ThreeDay,
    TwoWeek,
}

impl HeikinAshiTimeframe {
    /// Minimum daily rows before detection is attempted
    pub fn min_rows(&self) -> usize {
        match self {
            HeikinAshiTimeframe::ThreeDay => 6,
            HeikinAshiTimeframe::TwoWeek => 10,
        }
    }

    /// Calendar days of daily history to load
    pub fn history_days(&self) -> i64 {
        match self {
            HeikinAshiTimeframe::ThreeDay => 180,
            HeikinAshiTimeframe::TwoWeek => 200,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            HeikinAshiTimeframe::ThreeDay => "3-day",
            HeikinAshiTimeframe::TwoWeek => "2-week",
        }
    }

    fn alert_kind(&self, change: ColorChange) -> AlertKind {
        match (self, change) {
            (HeikinAshiTimeframe::ThreeDay, ColorChange::RedToGreen) => AlertKind::HeikinAshi3dBullish,
            (HeikinAshiTimeframe::ThreeDay, ColorChange::GreenToRed) => AlertKind::HeikinAshi3dBearish,
            (HeikinAshiTimeframe::TwoWeek, ColorChange::RedToGreen) => AlertKind::HeikinAshi2wBullish,
            (HeikinAshiTimeframe::TwoWeek, ColorChange::GreenToRed) => AlertKind::HeikinAshi2wBearish,
        }
    }

    /// Aggregate ascending daily rows to this timeframe
    pub fn aggregate(&self, daily: &[PricePoint]) -> Vec<PricePoint> {
        match self {
            HeikinAshiTimeframe::ThreeDay => aggregate_to_period(daily, 3),
            HeikinAshiTimeframe::TwoWeek => {
                let weekly = aggregate_to_period(daily, 5);
                aggregate_to_period(&weekly, 2)
            }
        }
    }
}

/// Compare the last two Heikin-Ashi candles at `timeframe` and build an alert
/// when their colors differ. Too little history yields `None`.
pub fn detect_alert(daily: &[PricePoint], timeframe: HeikinAshiTimeframe) -> Option<Alert> {
    if daily.len() < timeframe.min_rows() {
        return None;
    }

    let periods = timeframe.aggregate(daily);
    if periods.len() < 2 {
        return None;
    }

    let candles = transform(&periods);
    let current = candles.last()?.ha_color?;
    let previous = candles.get(candles.len() - 2)?.ha_color?;
    let change = detect_color_change(current, previous)?;

    Some(Alert::new(
        timeframe.alert_kind(change),
        change.as_str(),
        format!("{} Heikin-Ashi color change: {}", timeframe.label(), change),
    ))
}
