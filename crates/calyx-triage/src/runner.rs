//! Phase A — Proposer/Validator (spec §4.8): invokes the configured agent
//! runner with the intent's goal in apply+dry-run, producing a deterministic
//! plan+diff in a fresh run directory.

use crate::error::TriageError;
use crate::subprocess::{run_with_timeout, ProcOutcome};
use async_trait::async_trait;
use calyx_core::entities::Intent;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Phase A's result: whether the invocation succeeded, and where its
/// artifacts (`plan.json`, `audit.json`, `diffs/*.patch`) landed.
#[derive(Debug, Clone)]
pub struct PhaseAResult {
    pub ok: bool,
    pub run_dir: PathBuf,
    pub proc: ProcOutcome,
}

/// The pluggable "agent runner" the Design Notes (spec §9) call for: the
/// only sanctioned way to invoke an external tool, here the proposer that
/// turns an intent's goal into a plan + diff. A real implementation shells
/// out to the configured agent binary; tests supply a fake that writes
/// fixture artifacts directly.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn propose(&self, intent: &Intent, run_dir: &Path, max_steps: u32) -> Result<PhaseAResult, TriageError>;
}

/// Default runner: invokes an external agent binary via subprocess with a
/// timeout, in apply+dry-run mode, trusting it to populate `run_dir`.
pub struct SubprocessAgentRunner {
    pub binary: String,
    pub timeout: Duration,
}

impl SubprocessAgentRunner {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self { binary: binary.into(), timeout }
    }
}

#[async_trait]
impl AgentRunner for SubprocessAgentRunner {
    async fn propose(&self, intent: &Intent, run_dir: &Path, max_steps: u32) -> Result<PhaseAResult, TriageError> {
        std::fs::create_dir_all(run_dir)?;
        let args = vec![
            "--goal".to_string(),
            intent.goal.clone(),
            "--run-dir".to_string(),
            run_dir.display().to_string(),
            "--max-steps".to_string(),
            max_steps.to_string(),
            "--apply".to_string(),
            "--dry-run".to_string(),
        ];
        let proc = run_with_timeout(&self.binary, &args, None, self.timeout).await?;
        Ok(PhaseAResult { ok: proc.ok, run_dir: run_dir.to_path_buf(), proc })
    }
}

/// Allocates a fresh, content-addressable-by-time run directory under
/// `outgoing/` (spec §6 `outgoing/agent_run_<ts>/`).
pub fn new_run_dir(outgoing_dir: &Path, ts: f64) -> PathBuf {
    outgoing_dir.join(format!("agent_run_{}", ts as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calyx_core::entities::{IntentStatus, IntentType, RiskLevel};

    fn sample_intent() -> Intent {
        Intent {
            intent_id: "i1".to_string(),
            proposed_by: "agent1".to_string(),
            intent_type: IntentType::CodeChange,
            goal: "optimize hot loop".to_string(),
            change_set: vec!["optimize.py".to_string()],
            risk_level: RiskLevel::Low,
            rollback_plan: "git revert".to_string(),
            reviewers: vec!["secret_scanner".to_string(), "test_integrity".to_string()],
            tests_reference: None,
            status: IntentStatus::UnderReview,
        }
    }

    struct FixtureRunner;

    #[async_trait]
    impl AgentRunner for FixtureRunner {
        async fn propose(&self, _intent: &Intent, run_dir: &Path, _max_steps: u32) -> Result<PhaseAResult, TriageError> {
            std::fs::create_dir_all(run_dir.join("diffs"))?;
            std::fs::write(run_dir.join("plan.json"), "{}")?;
            std::fs::write(run_dir.join("audit.json"), r#"{"changed_files": ["optimize.py"]}"#)?;
            std::fs::write(run_dir.join("diffs").join("optimize.py.patch"), "--- a\n+++ b\n")?;
            Ok(PhaseAResult {
                ok: true,
                run_dir: run_dir.to_path_buf(),
                proc: ProcOutcome { ok: true, status: Some(0), timed_out: false, stdout_tail: String::new(), stderr_tail: String::new() },
            })
        }
    }

    #[tokio::test]
    async fn fixture_runner_populates_run_dir() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = new_run_dir(dir.path(), 1000.0);
        let runner = FixtureRunner;
        let result = runner.propose(&sample_intent(), &run_dir, 1).await.unwrap();
        assert!(result.ok);
        assert!(run_dir.join("plan.json").exists());
    }
}
