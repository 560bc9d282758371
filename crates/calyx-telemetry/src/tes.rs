//! Per-run TES scoring (spec §4.9): stability (graduated, see
//! `calyx_core::entities::run_record::graduated_stability`) plus piecewise
//! velocity/footprint, combined into v2 and v3 composites.

use calyx_core::entities::AutonomyMode;

pub const FAST_SECS: f64 = 90.0;
pub const SLOW_SECS: f64 = 900.0;
pub const MIN_FILES: f64 = 1.0;
pub const MAX_FILES: f64 = 10.0;

/// 1.0 at duration <= fast, 0.0 at duration >= slow, linear between.
pub fn velocity(duration_s: f64) -> f64 {
    piecewise_linear_desc(duration_s, FAST_SECS, SLOW_SECS)
}

/// 1.0 at changed_files <= 1, 0.0 at changed_files >= 10, linear between.
pub fn footprint(changed_files: u32) -> f64 {
    piecewise_linear_desc(changed_files as f64, MIN_FILES, MAX_FILES)
}

fn piecewise_linear_desc(x: f64, hi_at_one: f64, zero_at: f64) -> f64 {
    if x <= hi_at_one {
        1.0
    } else if x >= zero_at {
        0.0
    } else {
        1.0 - (x - hi_at_one) / (zero_at - hi_at_one)
    }
}

pub fn tes_v2(stability: f64, velocity: f64, footprint: f64) -> f64 {
    100.0 * (0.5 * stability + 0.3 * velocity + 0.2 * footprint)
}

/// compliance/coherence default to `stability` when not populated (spec §4.9,
/// also the Design Notes' explicit fallback for the degenerate v2 case).
pub fn tes_v3(
    stability: f64,
    velocity: f64,
    footprint: f64,
    compliance: Option<f64>,
    coherence: Option<f64>,
) -> f64 {
    let compliance = compliance.unwrap_or(stability);
    let coherence = coherence.unwrap_or(stability);
    100.0 * (0.4 * stability + 0.2 * velocity + 0.15 * footprint + 0.15 * compliance + 0.10 * coherence)
}

/// "if stability >= 0.8 and velocity >= 0.5 and mode=safe, suggest enabling
/// tests; if mode=tests, suggest enabling apply+tests" (spec §4.9).
pub fn hint(stability: f64, velocity: f64, mode: AutonomyMode) -> Option<&'static str> {
    if stability >= 0.8 && velocity >= 0.5 {
        match mode {
            AutonomyMode::Safe => Some("Consider enabling --run-tests"),
            AutonomyMode::Tests => Some("Consider enabling --apply --run-tests"),
            _ => None,
        }
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_is_one_at_or_below_fast() {
        assert_eq!(velocity(30.0), 1.0);
        assert_eq!(velocity(FAST_SECS), 1.0);
    }

    #[test]
    fn velocity_is_zero_at_or_above_slow() {
        assert_eq!(velocity(SLOW_SECS), 0.0);
        assert_eq!(velocity(2000.0), 0.0);
    }

    #[test]
    fn velocity_is_monotonic_between_bounds() {
        let mid = velocity((FAST_SECS + SLOW_SECS) / 2.0);
        assert!(mid > 0.0 && mid < 1.0);
        assert!(velocity(200.0) > velocity(800.0));
    }

    #[test]
    fn footprint_bounds() {
        assert_eq!(footprint(1), 1.0);
        assert_eq!(footprint(0), 1.0);
        assert_eq!(footprint(10), 0.0);
        assert_eq!(footprint(15), 0.0);
    }

    #[test]
    fn tes_v2_matches_weighted_formula() {
        let score = tes_v2(1.0, 1.0, 1.0);
        assert!((score - 100.0).abs() < 1e-9);
        let score = tes_v2(0.0, 0.0, 0.0);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn tes_v3_falls_back_to_stability_when_missing() {
        let with_defaults = tes_v3(0.9, 1.0, 1.0, None, None);
        let explicit = tes_v3(0.9, 1.0, 1.0, Some(0.9), Some(0.9));
        assert!((with_defaults - explicit).abs() < 1e-9);
    }

    #[test]
    fn hint_follows_safe_then_tests_progression() {
        assert_eq!(hint(0.9, 0.6, AutonomyMode::Safe), Some("Consider enabling --run-tests"));
        assert_eq!(hint(0.9, 0.6, AutonomyMode::Tests), Some("Consider enabling --apply --run-tests"));
        assert_eq!(hint(0.9, 0.6, AutonomyMode::ApplyTests), None);
        assert_eq!(hint(0.5, 0.6, AutonomyMode::Safe), None);
    }
}
