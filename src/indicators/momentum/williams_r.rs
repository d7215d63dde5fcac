//! Williams %R over weekly bars, smoothed with a first-value-seeded EMA

use crate::common::math;
use crate::config::WilliamsRConfig;
use crate::indicators::error::IndicatorError;
use crate::models::indicators::{Bar, MomentumState, WilliamsRReading};

const NAME: &str = "williams_r";

/// %R per bar using a trailing window of up to `lookback` bars.
/// Bars whose window has no range produce `None`.
pub fn williams_r_series(bars: &[Bar], lookback: usize) -> Vec<Option<f64>> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let highest = math::rolling_max(&highs, lookback);
    let lowest = math::rolling_min(&lows, lookback);

    bars.iter()
        .zip(highest.iter().zip(lowest.iter()))
        .map(|(bar, (&hh, &ll))| {
            let range = hh - ll;
            if range > 0.0 && range.is_finite() {
                Some((hh - bar.close) / range * -100.0)
            } else {
                None
            }
        })
        .collect()
}

/// Advance the alert machine by one run
pub fn next_state(previous: Option<MomentumState>, meets: bool) -> MomentumState {
    match previous {
        None | Some(MomentumState::Inactive) => {
            if meets {
                MomentumState::Fresh
            } else {
                MomentumState::Inactive
            }
        }
        Some(MomentumState::Fresh) | Some(MomentumState::Continuation) => {
            if meets {
                MomentumState::Continuation
            } else {
                MomentumState::Inactive
            }
        }
    }
}

/// Latest %R and its EMA for ascending weekly `bars`, with the alert state
/// derived from `previous`.
pub fn calculate_williams_r(
    bars: &[Bar],
    config: &WilliamsRConfig,
    previous: Option<MomentumState>,
) -> Result<WilliamsRReading, IndicatorError> {
    if config.lookback == 0 || config.ema_length == 0 {
        return Err(IndicatorError::invalid(NAME, "lookback and ema_length must be positive"));
    }

    let series = williams_r_series(bars, config.lookback);
    let values: Vec<f64> = series.iter().flatten().copied().collect();
    if values.len() < config.ema_length {
        return Err(IndicatorError::insufficient(NAME, config.ema_length, values.len()));
    }

    // the reading describes the latest bar; a flat window there has no %R
    let Some(Some(williams_r)) = series.last().copied() else {
        return Err(IndicatorError::insufficient(NAME, config.ema_length, 0));
    };
    let ema = math::ema_series_seeded_first(&values, config.ema_length);
    let (Some(&williams_r_ema), Some(last)) = (ema.last(), bars.last()) else {
        return Err(IndicatorError::insufficient(NAME, config.ema_length, 0));
    };

    let meets = williams_r > williams_r_ema && williams_r < config.threshold;

    Ok(WilliamsRReading {
        timestamp: last.timestamp,
        williams_r,
        williams_r_ema,
        state: next_state(previous, meets),
    })
}
