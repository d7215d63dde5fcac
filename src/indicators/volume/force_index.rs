//! Force Index with fast/slow EMA crossover detection
//!
//! Crossovers compare the current fast/slow values against the values stored
//! by the previous run, not against the previous bar of the current window.

use crate::common::math;
use crate::config::{CrossoverMode, ForceIndexConfig};
use crate::indicators::error::IndicatorError;
use crate::models::indicators::{Bar, ForceIndexReading, ForceIndexState, PriorForceIndex};

const NAME: &str = "force_index";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    Up,
    Down,
}

/// `(close[i] - close[i-1]) * volume[i]` for every bar after the first
pub fn force_index_series(bars: &[Bar]) -> Vec<f64> {
    bars.windows(2)
        .map(|w| (w[1].close - w[0].close) * w[1].volume)
        .collect()
}

pub fn detect_crossover(prev_fast: f64, prev_slow: f64, fast: f64, slow: f64) -> Option<Crossover> {
    if prev_fast <= prev_slow && fast > slow {
        Some(Crossover::Up)
    } else if prev_fast >= prev_slow && fast < slow {
        Some(Crossover::Down)
    } else {
        None
    }
}

pub fn next_state(
    mode: CrossoverMode,
    previous: Option<ForceIndexState>,
    crossover: Option<Crossover>,
) -> ForceIndexState {
    let Some(direction) = crossover else {
        return ForceIndexState::Inactive;
    };

    match mode {
        CrossoverMode::Continuation => match previous {
            Some(state) if state.is_active() => ForceIndexState::Continuation,
            _ => ForceIndexState::Fresh,
        },
        CrossoverMode::Directional => match direction {
            Crossover::Up => ForceIndexState::FreshUp,
            Crossover::Down => ForceIndexState::FreshDown,
        },
    }
}

pub fn calculate_force_index(
    bars: &[Bar],
    config: &ForceIndexConfig,
    prior: Option<&PriorForceIndex>,
) -> Result<ForceIndexReading, IndicatorError> {
    if config.fast == 0 || config.slow == 0 {
        return Err(IndicatorError::invalid(NAME, "spans must be positive"));
    }

    let required = config.fast.max(config.slow) + 1;
    if bars.len() < required {
        return Err(IndicatorError::insufficient(NAME, required, bars.len()));
    }

    let series = force_index_series(bars);
    let fast = math::ema_sma_seeded(&series, config.fast)
        .ok_or_else(|| IndicatorError::insufficient(NAME, required, bars.len()))?;
    let slow = math::ema_sma_seeded(&series, config.slow)
        .ok_or_else(|| IndicatorError::insufficient(NAME, required, bars.len()))?;
    let timestamp = bars
        .last()
        .map(|b| b.timestamp)
        .ok_or_else(|| IndicatorError::insufficient(NAME, required, 0))?;

    // first run for the symbol: nothing to cross against
    let (previous_fast, previous_slow) = prior.map(|p| (p.fast, p.slow)).unwrap_or((fast, slow));
    let crossover = detect_crossover(previous_fast, previous_slow, fast, slow);

    Ok(ForceIndexReading {
        timestamp,
        fast,
        slow,
        previous_fast,
        previous_slow,
        state: next_state(config.mode, prior.map(|p| p.state), crossover),
    })
}
