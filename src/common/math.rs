//! Numeric helpers shared by the indicator engines

/// Smoothing factor for a span-based EMA
pub fn alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// EMA series where the first value seeds the average and every row
/// participates from the start.
pub fn ema_series_seeded_first(values: &[f64], span: usize) -> Vec<f64> {
    let a = alpha(span);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            None => v,
            Some(p) => v * a + p * (1.0 - a),
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// Final value of an EMA seeded with the simple mean of the first `span`
/// values. Returns `None` when fewer than `span` values exist.
pub fn ema_sma_seeded(values: &[f64], span: usize) -> Option<f64> {
    if span == 0 || values.len() < span {
        return None;
    }
    let a = alpha(span);
    let mut ema = sma(&values[..span])?;
    for &v in &values[span..] {
        ema += (v - ema) * a;
    }
    Some(ema)
}

pub fn sma(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Rolling maximum over a trailing window of up to `window` rows
pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, f64::max)
}

/// Rolling minimum over a trailing window of up to `window` rows
pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, f64::min)
}

fn rolling(values: &[f64], window: usize, pick: fn(f64, f64) -> f64) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            values[start..=i]
                .iter()
                .copied()
                .reduce(pick)
                .unwrap_or(f64::NAN)
        })
        .collect()
}
