//! Early warnings (spec §4.9), emitted at most once per window per kind:
//! TES decline, high memory, elevated failure risk, predicted resource
//! exhaustion.
//!
//! The predictive module referenced by the spec (failure risk from recent
//! stabilities, resource-exhaustion projection) was not carried over by the
//! distillation in enough detail to replicate verbatim; the formulas below
//! are a direct, documented choice — see DESIGN.md.

use std::collections::HashMap;
use std::time::Duration;

pub const TES_DECLINE_THRESHOLD: f64 = 5.0;
pub const TES_DECLINE_HIGH_SEVERITY: f64 = 10.0;
pub const MEMORY_HIGH_THRESHOLD: f64 = 75.0;
pub const MEMORY_HIGH_SEVERITY: f64 = 80.0;
pub const FAILURE_RISK_THRESHOLD: f64 = 0.3;
pub const FAILURE_RISK_HIGH_SEVERITY: f64 = 0.5;
pub const EXHAUSTION_LIMIT_PERCENT: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    TesDecline,
    MemoryHigh,
    FailureRisk,
    ResourceExhaustion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub severity: Severity,
    pub message: String,
}

/// `tes_history` chronological, oldest first; checks the drop across the
/// trailing 10 samples (oldest-of-window minus latest), per the predictive
/// module's decline check.
pub fn check_tes_decline(tes_history: &[f64]) -> Option<Warning> {
    if tes_history.len() < 10 {
        return None;
    }
    let recent = &tes_history[tes_history.len() - 10..];
    let decline = recent[0] - recent[recent.len() - 1];
    if decline >= TES_DECLINE_THRESHOLD {
        let severity = if decline >= TES_DECLINE_HIGH_SEVERITY { Severity::High } else { Severity::Medium };
        Some(Warning {
            kind: WarningKind::TesDecline,
            severity,
            message: format!("TES declining: {:.1} -> {:.1} ({:.1} point drop)", recent[0], recent[recent.len() - 1], decline),
        })
    } else {
        None
    }
}

pub fn check_memory_high(memory_percent: f64) -> Option<Warning> {
    if memory_percent >= MEMORY_HIGH_THRESHOLD {
        let severity = if memory_percent >= MEMORY_HIGH_SEVERITY { Severity::High } else { Severity::Medium };
        Some(Warning {
            kind: WarningKind::MemoryHigh,
            severity,
            message: format!("Memory usage high: {:.1}%", memory_percent),
        })
    } else {
        None
    }
}

/// Failure risk as the fraction of the trailing window (default last 10)
/// with graduated stability below 0.5 — a run either failed outright or
/// only recovered via a degraded autonomy mode.
pub fn failure_risk(recent_stabilities: &[f64]) -> f64 {
    if recent_stabilities.is_empty() {
        return 0.0;
    }
    let window = &recent_stabilities[recent_stabilities.len().saturating_sub(10)..];
    let failing = window.iter().filter(|s| **s < 0.5).count();
    failing as f64 / window.len() as f64
}

pub fn check_failure_risk(risk: f64) -> Option<Warning> {
    if risk >= FAILURE_RISK_THRESHOLD {
        let severity = if risk >= FAILURE_RISK_HIGH_SEVERITY { Severity::High } else { Severity::Medium };
        Some(Warning {
            kind: WarningKind::FailureRisk,
            severity,
            message: format!("Failure risk elevated: {:.1}%", risk * 100.0),
        })
    } else {
        None
    }
}

/// Linear extrapolation from the two most recent memory samples to the
/// point `EXHAUSTION_LIMIT_PERCENT` is crossed. `samples` are
/// `(seconds_since_epoch, memory_percent)`, chronological.
pub fn predict_resource_exhaustion(samples: &[(f64, f64)]) -> Option<Duration> {
    if samples.len() < 2 {
        return None;
    }
    let (t0, m0) = samples[samples.len() - 2];
    let (t1, m1) = samples[samples.len() - 1];
    let dt = t1 - t0;
    if dt <= 0.0 {
        return None;
    }
    let rate_per_sec = (m1 - m0) / dt;
    if rate_per_sec <= 0.0 || m1 >= EXHAUSTION_LIMIT_PERCENT {
        return None;
    }
    let seconds_to_limit = (EXHAUSTION_LIMIT_PERCENT - m1) / rate_per_sec;
    Some(Duration::from_secs_f64(seconds_to_limit.max(0.0)))
}

pub fn check_resource_exhaustion(samples: &[(f64, f64)]) -> Option<Warning> {
    predict_resource_exhaustion(samples).map(|eta| Warning {
        kind: WarningKind::ResourceExhaustion,
        severity: Severity::High,
        message: format!("Resource exhaustion predicted within {:.0} minutes", eta.as_secs_f64() / 60.0),
    })
}

/// De-duplicates warnings so each kind fires at most once per window.
pub struct WarningTracker {
    window: Duration,
    last_emitted: HashMap<WarningKind, f64>,
}

impl WarningTracker {
    pub fn new(window: Duration) -> Self {
        Self { window, last_emitted: HashMap::new() }
    }

    /// Returns `true` (and records `now`) iff this kind has not already
    /// fired within the tracker's window.
    pub fn should_emit(&mut self, kind: WarningKind, now: f64) -> bool {
        match self.last_emitted.get(&kind) {
            Some(last) if now - last < self.window.as_secs_f64() => false,
            _ => {
                self.last_emitted.insert(kind, now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tes_decline_below_threshold_is_silent() {
        let history: Vec<f64> = (0..10).map(|_| 90.0).collect();
        assert!(check_tes_decline(&history).is_none());
    }

    #[test]
    fn tes_decline_of_five_or_more_warns() {
        let mut history = vec![90.0; 9];
        history.push(84.0);
        let warning = check_tes_decline(&history).unwrap();
        assert_eq!(warning.severity, Severity::Medium);
    }

    #[test]
    fn tes_decline_of_ten_or_more_is_high_severity() {
        let mut history = vec![95.0; 9];
        history.push(80.0);
        let warning = check_tes_decline(&history).unwrap();
        assert_eq!(warning.severity, Severity::High);
    }

    #[test]
    fn failure_risk_counts_fraction_below_half() {
        let stabilities = vec![1.0, 1.0, 0.2, 0.2, 0.2, 1.0, 1.0, 1.0, 1.0, 1.0];
        assert!((failure_risk(&stabilities) - 0.3).abs() < 1e-9);
        assert!(check_failure_risk(failure_risk(&stabilities)).is_some());
    }

    #[test]
    fn rising_memory_trend_predicts_exhaustion() {
        let samples = vec![(0.0, 70.0), (60.0, 75.0)];
        let eta = predict_resource_exhaustion(&samples).unwrap();
        assert!(eta.as_secs_f64() > 0.0);
    }

    #[test]
    fn flat_memory_trend_never_predicts_exhaustion() {
        let samples = vec![(0.0, 70.0), (60.0, 70.0)];
        assert!(predict_resource_exhaustion(&samples).is_none());
    }

    #[test]
    fn tracker_suppresses_duplicate_kind_within_window() {
        let mut tracker = WarningTracker::new(Duration::from_secs(600));
        assert!(tracker.should_emit(WarningKind::MemoryHigh, 1000.0));
        assert!(!tracker.should_emit(WarningKind::MemoryHigh, 1100.0));
        assert!(tracker.should_emit(WarningKind::MemoryHigh, 1700.0));
    }
}
