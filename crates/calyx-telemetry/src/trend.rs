//! Trend derivation on demand (spec §4.9): rolling mean(20), velocity of
//! mean(last10) vs mean(prev10), classified with a ±2 threshold.

pub const TREND_WINDOW: usize = 20;
pub const TREND_HALF_WINDOW: usize = 10;
pub const TREND_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Copy)]
pub struct Trend {
    pub mean: f64,
    pub velocity: f64,
    pub direction: TrendDirection,
}

/// `values` must be in chronological order (oldest first); only the last
/// `TREND_WINDOW` entries are considered.
pub fn derive_trend(values: &[f64]) -> Option<Trend> {
    if values.len() < 2 {
        return None;
    }
    let window = &values[values.len().saturating_sub(TREND_WINDOW)..];
    let mean = mean_of(window);

    let last10 = &window[window.len().saturating_sub(TREND_HALF_WINDOW)..];
    let prev_end = window.len().saturating_sub(TREND_HALF_WINDOW);
    let prev10 = &window[prev_end.saturating_sub(TREND_HALF_WINDOW)..prev_end];

    let velocity = if prev10.is_empty() {
        0.0
    } else {
        mean_of(last10) - mean_of(prev10)
    };

    let direction = if velocity >= TREND_THRESHOLD {
        TrendDirection::Improving
    } else if velocity <= -TREND_THRESHOLD {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };

    Some(Trend { mean, velocity, direction })
}

fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
