//! Ties per-run scoring into a [`RunRecord`] and appends it to both the
//! flat TES log and the per-agent granular log (spec §4.9).

use crate::tes::{footprint, hint, tes_v2, tes_v3, velocity};
use calyx_core::entities::run_record::RUN_RECORD_SCHEMA_VERSION;
use calyx_core::entities::{graduated_stability, AutonomyMode, RunRecord, RunStatus, RUN_RECORD_CSV_HEADERS};
use calyx_fabric::FabricError;
use std::path::Path;

pub struct RunInputs {
    pub iso_ts: String,
    pub duration_s: f64,
    pub status: RunStatus,
    pub had_failure: bool,
    pub applied: bool,
    pub changed_files: u32,
    pub run_tests: bool,
    pub autonomy_mode: AutonomyMode,
    pub model_id: String,
    pub run_dir: String,
    pub compliance: Option<f64>,
    pub coherence: Option<f64>,
}

/// Scores one run and produces the full [`RunRecord`], without writing it —
/// separated from `score_and_log` so callers can inspect the hint/tes
/// before committing it to the append-only logs.
pub fn score_run(inputs: RunInputs) -> RunRecord {
    let stability = graduated_stability(inputs.status, inputs.had_failure, inputs.autonomy_mode, inputs.applied);
    let velocity = velocity(inputs.duration_s);
    let footprint = footprint(inputs.changed_files);
    let tes = tes_v2(stability, velocity, footprint);
    let tes_v3 = tes_v3(stability, velocity, footprint, inputs.compliance, inputs.coherence);
    let hint = hint(stability, velocity, inputs.autonomy_mode).map(str::to_string);

    RunRecord {
        iso_ts: inputs.iso_ts,
        tes,
        stability,
        velocity,
        footprint,
        duration_s: inputs.duration_s,
        status: inputs.status,
        applied: inputs.applied,
        changed_files: inputs.changed_files,
        run_tests: inputs.run_tests,
        autonomy_mode: inputs.autonomy_mode,
        model_id: inputs.model_id,
        run_dir: inputs.run_dir,
        hint,
        compliance: inputs.compliance,
        ethics: None,
        coherence: inputs.coherence,
        tes_v3: Some(tes_v3),
        schema_version: RUN_RECORD_SCHEMA_VERSION,
        had_failure: inputs.had_failure,
    }
}

/// Scores the run and appends it to `csv_path` (flat TES log) and
/// `granular_path` (per-agent JSONL), matching spec §6's two sinks.
pub fn score_and_log(inputs: RunInputs, csv_path: &Path, granular_path: &Path) -> Result<RunRecord, FabricError> {
    let record = score_run(inputs);
    calyx_fabric::append_csv(csv_path, RUN_RECORD_CSV_HEADERS, &record.to_csv_row())?;
    calyx_fabric::append_jsonl(granular_path, &record)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_inputs() -> RunInputs {
        RunInputs {
            iso_ts: "2026-07-27T00:00:00Z".to_string(),
            duration_s: 60.0,
            status: RunStatus::Done,
            had_failure: false,
            applied: true,
            changed_files: 1,
            run_tests: true,
            autonomy_mode: AutonomyMode::Safe,
            model_id: "test-model".to_string(),
            run_dir: "outgoing/agent_run_1".to_string(),
            compliance: None,
            coherence: None,
        }
    }

    #[test]
    fn clean_fast_run_scores_near_perfect() {
        let record = score_run(sample_inputs());
        assert!((record.tes - 100.0).abs() < 1e-9);
        assert_eq!(record.hint.as_deref(), Some("Consider enabling --run-tests"));
    }

    #[test]
    fn score_and_log_appends_to_both_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("agent_metrics.csv");
        let granular_path = dir.path().join("agent1.jsonl");
        score_and_log(sample_inputs(), &csv_path, &granular_path).unwrap();
        assert!(csv_path.exists());
        assert!(granular_path.exists());
        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv_text.lines().count(), 2);
    }
}
