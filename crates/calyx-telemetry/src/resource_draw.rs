//! Resource-draw heuristics supplementing the core TES formula (spec §4.9,
//! grounded in `tes_monitor.py`'s long-duration/model-compute/run-frequency/
//! TES-surge checks).

use calyx_core::entities::{AutonomyMode, RunRecord};

pub const DURATION_HIGH_SECS: f64 = 300.0;
pub const LLM_TIME_HIGH_SECS: f64 = 20.0;
pub const LLM_CALLS_HIGH: usize = 5;
pub const FREQ_WINDOW: usize = 5;
pub const MIN_SPACING_SECS: f64 = 180.0;
pub const FREQ_SLACK: f64 = 0.8;
pub const SURGE_WINDOW: usize = 4;
pub const SURGE_DELTA: f64 = 3.0;
pub const SURGE_FLOOR: f64 = 95.0;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawNote {
    LongDuration { duration_s: f64 },
    HighModelCompute { llm_time_s: f64, llm_calls: usize },
    HighAutonomy,
    HighRunFrequency { avg_spacing_s: f64 },
    TesSurge { latest: f64, avg: f64 },
}

/// Per-audit LLM usage, parsed out of `audit.json`'s `llm_calls` array
/// (each entry carrying a `duration_s`); degrades to `(0.0, 0)` on any
/// read/parse failure rather than aborting the scan.
pub fn audit_llm_stats(audit_json: &serde_json::Value) -> (f64, usize) {
    let calls = match audit_json.get("llm_calls").and_then(|v| v.as_array()) {
        Some(arr) => arr,
        None => return (0.0, 0),
    };
    let total: f64 = calls
        .iter()
        .filter_map(|c| c.get("duration_s").and_then(|v| v.as_f64()))
        .sum();
    (total, calls.len())
}

/// One run's resource-draw notes: long duration, high model compute, and
/// high-autonomy mode (apply_tests).
pub fn warn_on_resource_draw(record: &RunRecord, llm_time_s: f64, llm_calls: usize) -> Vec<DrawNote> {
    let mut notes = Vec::new();
    if record.duration_s > DURATION_HIGH_SECS {
        notes.push(DrawNote::LongDuration { duration_s: record.duration_s });
    }
    if llm_time_s > LLM_TIME_HIGH_SECS || llm_calls > LLM_CALLS_HIGH {
        notes.push(DrawNote::HighModelCompute { llm_time_s, llm_calls });
    }
    if record.autonomy_mode == AutonomyMode::ApplyTests {
        notes.push(DrawNote::HighAutonomy);
    }
    notes
}

/// `timestamps` chronological (oldest first), unix seconds. Flags if the
/// trailing window's average spacing is under 80% of the 3-minute target.
pub fn warn_on_frequency(timestamps: &[f64]) -> Option<DrawNote> {
    if timestamps.len() < 2 {
        return None;
    }
    let recent = &timestamps[timestamps.len().saturating_sub(FREQ_WINDOW)..];
    let gaps: Vec<f64> = recent.windows(2).map(|w| w[1] - w[0]).filter(|d| *d > 0.0).collect();
    if gaps.is_empty() {
        return None;
    }
    let avg = gaps.iter().sum::<f64>() / gaps.len() as f64;
    if avg < MIN_SPACING_SECS * FREQ_SLACK {
        Some(DrawNote::HighRunFrequency { avg_spacing_s: avg })
    } else {
        None
    }
}

/// `tes_history` chronological; compares the latest reading against the
/// mean of the prior `SURGE_WINDOW` readings.
pub fn warn_on_tes_surge(tes_history: &[f64]) -> Option<DrawNote> {
    if tes_history.len() < SURGE_WINDOW + 1 {
        return None;
    }
    let latest = tes_history[tes_history.len() - 1];
    let window = &tes_history[tes_history.len() - 1 - SURGE_WINDOW..tes_history.len() - 1];
    let avg = window.iter().sum::<f64>() / window.len() as f64;
    if latest >= avg + SURGE_DELTA && latest >= SURGE_FLOOR {
        Some(DrawNote::TesSurge { latest, avg })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calyx_core::entities::{AutonomyMode, RunStatus};

    fn sample_record(duration_s: f64, mode: AutonomyMode) -> RunRecord {
        RunRecord {
            iso_ts: "2026-07-27T00:00:00Z".to_string(),
            tes: 90.0,
            stability: 1.0,
            velocity: 1.0,
            footprint: 1.0,
            duration_s,
            status: RunStatus::Done,
            applied: true,
            changed_files: 1,
            run_tests: true,
            autonomy_mode: mode,
            model_id: "test-model".to_string(),
            run_dir: "outgoing/agent_run_1".to_string(),
            hint: None,
            compliance: None,
            ethics: None,
            coherence: None,
            tes_v3: None,
            schema_version: 1,
            had_failure: false,
        }
    }

    #[test]
    fn long_duration_is_noted() {
        let record = sample_record(400.0, AutonomyMode::Safe);
        let notes = warn_on_resource_draw(&record, 0.0, 0);
        assert!(notes.iter().any(|n| matches!(n, DrawNote::LongDuration { .. })));
    }

    #[test]
    fn high_autonomy_mode_is_noted() {
        let record = sample_record(10.0, AutonomyMode::ApplyTests);
        let notes = warn_on_resource_draw(&record, 0.0, 0);
        assert!(notes.iter().any(|n| matches!(n, DrawNote::HighAutonomy)));
    }

    #[test]
    fn clean_run_has_no_notes() {
        let record = sample_record(10.0, AutonomyMode::Safe);
        assert!(warn_on_resource_draw(&record, 0.0, 0).is_empty());
    }

    #[test]
    fn audit_llm_stats_sums_durations() {
        let audit = serde_json::json!({"llm_calls": [{"duration_s": 5.0}, {"duration_s": 10.0}]});
        assert_eq!(audit_llm_stats(&audit), (15.0, 2));
    }

    #[test]
    fn audit_llm_stats_degrades_on_missing_field() {
        assert_eq!(audit_llm_stats(&serde_json::json!({})), (0.0, 0));
    }

    #[test]
    fn tight_spacing_triggers_frequency_warning() {
        let timestamps = vec![0.0, 60.0, 120.0, 180.0, 240.0];
        assert!(warn_on_frequency(&timestamps).is_some());
    }

    #[test]
    fn wide_spacing_is_silent() {
        let timestamps = vec![0.0, 200.0, 400.0, 600.0, 800.0];
        assert!(warn_on_frequency(&timestamps).is_none());
    }

    #[test]
    fn tes_surge_detected_against_recent_average() {
        let history = vec![80.0, 82.0, 81.0, 80.0, 96.0];
        assert!(warn_on_tes_surge(&history).is_some());
    }

    #[test]
    fn modest_tes_increase_is_not_a_surge() {
        let history = vec![80.0, 82.0, 81.0, 80.0, 83.0];
        assert!(warn_on_tes_surge(&history).is_none());
    }
}
