//! Anomaly detection (spec §4.9): per-metric baselines (mean, stdev, min,
//! max) over a sliding window, flagging |z-score| > 2, severity=high at > 3.

pub const BASELINE_WINDOW: usize = 50;
pub const ANOMALY_Z_THRESHOLD: f64 = 2.0;
pub const HIGH_SEVERITY_Z_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub mean: f64,
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalySeverity {
    Normal,
    Low,
    High,
}

/// `history` must be chronological (oldest first); only the trailing
/// `BASELINE_WINDOW` samples are used.
pub fn compute_baseline(history: &[f64]) -> Option<Baseline> {
    if history.is_empty() {
        return None;
    }
    let window = &history[history.len().saturating_sub(BASELINE_WINDOW)..];
    let n = window.len();
    let mean = window.iter().sum::<f64>() / n as f64;
    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let stdev = variance.sqrt();
    let min = window.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Some(Baseline { mean, stdev, min, max, n })
}

pub fn z_score(value: f64, baseline: &Baseline) -> f64 {
    if baseline.stdev == 0.0 {
        0.0
    } else {
        (value - baseline.mean) / baseline.stdev
    }
}

/// Classifies `value` against `baseline`: `|z| > 3` is high severity,
/// `|z| > 2` is low severity, otherwise normal.
pub fn classify(value: f64, baseline: &Baseline) -> AnomalySeverity {
    let z = z_score(value, baseline).abs();
    if z > HIGH_SEVERITY_Z_THRESHOLD {
        AnomalySeverity::High
    } else if z > ANOMALY_Z_THRESHOLD {
        AnomalySeverity::Low
    } else {
        AnomalySeverity::Normal
    }
}
