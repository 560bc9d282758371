//! Run Record / TES row (spec §3) — one per agent execution.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutonomyMode {
    Safe,
    Tests,
    Apply,
    ApplyTests,
}

impl AutonomyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutonomyMode::Safe => "safe",
            AutonomyMode::Tests => "tests",
            AutonomyMode::Apply => "apply",
            AutonomyMode::ApplyTests => "apply_tests",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "safe" => Some(AutonomyMode::Safe),
            "tests" => Some(AutonomyMode::Tests),
            "apply" => Some(AutonomyMode::Apply),
            "apply_tests" => Some(AutonomyMode::ApplyTests),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Done,
    Failed,
    Timeout,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Done => "done",
            RunStatus::Failed => "failed",
            RunStatus::Timeout => "timeout",
            RunStatus::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "done" => Some(RunStatus::Done),
            "failed" => Some(RunStatus::Failed),
            "timeout" => Some(RunStatus::Timeout),
            "error" => Some(RunStatus::Error),
            _ => None,
        }
    }
}

/// One row appended per agent execution (spec §3 "Run Record (TES row)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub iso_ts: String,
    pub tes: f64,
    pub stability: f64,
    pub velocity: f64,
    pub footprint: f64,
    pub duration_s: f64,
    pub status: RunStatus,
    pub applied: bool,
    pub changed_files: u32,
    pub run_tests: bool,
    pub autonomy_mode: AutonomyMode,
    pub model_id: String,
    pub run_dir: String,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub compliance: Option<f64>,
    #[serde(default)]
    pub ethics: Option<f64>,
    #[serde(default)]
    pub coherence: Option<f64>,
    #[serde(default)]
    pub tes_v3: Option<f64>,
    pub schema_version: u32,
    /// Did this run have a recorded failure in its audit trail? Drives the
    /// graduated stability score (spec §3) together with `status`/`mode`/`applied`.
    #[serde(default)]
    pub had_failure: bool,
}

pub const RUN_RECORD_SCHEMA_VERSION: u32 = 1;

/// Graduated stability scoring (spec §3):
/// - status != done -> 0.0
/// - done, no failure -> 1.0
/// - done + failure, mode=tests, not applied -> 0.6
/// - done + failure, mode in {apply, apply_tests}, applied -> 0.2
/// - other failure -> 0.0
pub fn graduated_stability(status: RunStatus, had_failure: bool, mode: AutonomyMode, applied: bool) -> f64 {
    if status != RunStatus::Done {
        return 0.0;
    }
    if !had_failure {
        return 1.0;
    }
    match (mode, applied) {
        (AutonomyMode::Tests, false) => 0.6,
        (AutonomyMode::Apply, true) | (AutonomyMode::ApplyTests, true) => 0.2,
        _ => 0.0,
    }
}

/// The CSV header order for `logs/agent_metrics.csv` (spec §6).
pub const RUN_RECORD_CSV_HEADERS: &[&str] = &[
    "iso_ts",
    "tes",
    "stability",
    "velocity",
    "footprint",
    "duration_s",
    "status",
    "applied",
    "changed_files",
    "run_tests",
    "autonomy_mode",
    "model_id",
    "run_dir",
    "hint",
    "compliance",
    "ethics",
    "coherence",
    "tes_v3",
    "schema_version",
];

impl RunRecord {
    /// Renders this record as a CSV row matching `RUN_RECORD_CSV_HEADERS`.
    pub fn to_csv_row(&self) -> Vec<String> {
        vec![
            self.iso_ts.clone(),
            format!("{:.4}", self.tes),
            format!("{:.4}", self.stability),
            format!("{:.4}", self.velocity),
            format!("{:.4}", self.footprint),
            format!("{:.3}", self.duration_s),
            self.status.as_str().to_string(),
            (self.applied as u8).to_string(),
            self.changed_files.to_string(),
            (self.run_tests as u8).to_string(),
            self.autonomy_mode.as_str().to_string(),
            self.model_id.clone(),
            self.run_dir.clone(),
            self.hint.clone().unwrap_or_default(),
            self.compliance.map(|v| format!("{:.4}", v)).unwrap_or_default(),
            self.ethics.map(|v| format!("{:.4}", v)).unwrap_or_default(),
            self.coherence.map(|v| format!("{:.4}", v)).unwrap_or_default(),
            self.tes_v3.map(|v| format!("{:.4}", v)).unwrap_or_default(),
            self.schema_version.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stability_not_done_is_zero() {
        assert_eq!(graduated_stability(RunStatus::Failed, true, AutonomyMode::Safe, false), 0.0);
    }

    #[test]
    fn stability_done_no_failure_is_one() {
        assert_eq!(graduated_stability(RunStatus::Done, false, AutonomyMode::Apply, true), 1.0);
    }

    #[test]
    fn stability_done_failure_tests_not_applied() {
        assert_eq!(graduated_stability(RunStatus::Done, true, AutonomyMode::Tests, false), 0.6);
    }

    #[test]
    fn stability_done_failure_apply_applied() {
        assert_eq!(graduated_stability(RunStatus::Done, true, AutonomyMode::ApplyTests, true), 0.2);
    }

    #[test]
    fn stability_other_failure_is_zero() {
        assert_eq!(graduated_stability(RunStatus::Done, true, AutonomyMode::Safe, false), 0.0);
    }
}
