//! Serial A -> B -> C pipeline and verdict routing (spec §4.8).

use crate::error::TriageError;
use crate::review::{run_phase_b, Reviewer, ReviewReport};
use crate::runner::{new_run_dir, AgentRunner, PhaseAResult};
use crate::stability::{run_phase_c, StabilityReport};
use calyx_core::entities::{Intent, IntentStatus};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ORCHESTRATOR_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, serde::Serialize)]
pub struct DeploymentEvent {
    pub intent_id: String,
    pub from_status: String,
    pub to_status: String,
    pub reason: String,
    pub timestamp: f64,
}

pub struct TriageOutcome {
    pub run_dir: PathBuf,
    pub phase_a: PhaseAResult,
    pub review: Option<ReviewReport>,
    pub stability: Option<StabilityReport>,
    pub final_status: IntentStatus,
    pub events: Vec<DeploymentEvent>,
}

/// Filename under `logs_dir` that every deployment event is appended to
/// (spec §4.8 "Every transition emits a deployment event to C2").
pub const DEPLOYMENT_EVENTS_FILE: &str = "deployment_events.jsonl";

fn emit(events: &mut Vec<DeploymentEvent>, intent_id: &str, from: IntentStatus, to: IntentStatus, reason: &str) {
    events.push(DeploymentEvent {
        intent_id: intent_id.to_string(),
        from_status: from.as_str().to_string(),
        to_status: to.as_str().to_string(),
        reason: reason.to_string(),
        timestamp: calyx_core::time::now_ts(),
    });
}

/// Appends every accumulated event to the C2 deployment-events log before
/// the pipeline returns, so a rejected/approved transition is durable on
/// disk rather than only an in-memory return value.
fn persist_events(logs_dir: &Path, events: &[DeploymentEvent]) -> Result<(), TriageError> {
    let path = logs_dir.join(DEPLOYMENT_EVENTS_FILE);
    for event in events {
        calyx_fabric::append_jsonl(&path, event)?;
    }
    Ok(())
}

/// Runs the full pipeline for one intent. Never treats a missing reviewer
/// verdict as PASS, and never issues approval unless phase C also succeeded
/// (spec §4.8 verdict routing).
pub async fn run_intent(
    intent: &mut Intent,
    outgoing_dir: &Path,
    logs_dir: &Path,
    runner: &dyn AgentRunner,
    reviewers: &[Box<dyn Reviewer>],
    strict: bool,
    max_steps: u32,
    compile_cmd: (&str, &[String]),
    test_cmd: Option<(&str, &[String])>,
    subprocess_timeout: Duration,
) -> Result<TriageOutcome, TriageError> {
    let mut events = Vec::new();
    let run_dir = new_run_dir(outgoing_dir, calyx_core::time::now_ts());

    let phase_a = runner.propose(intent, &run_dir, max_steps).await?;
    if !phase_a.ok {
        intent.status = IntentStatus::Rejected;
        emit(&mut events, &intent.intent_id, IntentStatus::UnderReview, IntentStatus::Rejected, "phase_a_failed");
        persist_events(logs_dir, &events)?;
        return Ok(TriageOutcome {
            run_dir,
            phase_a,
            review: None,
            stability: None,
            final_status: intent.status,
            events,
        });
    }

    let review = run_phase_b(
        ORCHESTRATOR_VERSION,
        &intent.intent_id,
        &intent.change_set,
        &phase_a.run_dir,
        strict,
        reviewers,
    )
    .await?;

    if !review.all_pass() {
        intent.status = IntentStatus::Rejected;
        emit(&mut events, &intent.intent_id, IntentStatus::UnderReview, IntentStatus::Rejected, "reviewer_fail_or_scope");
        persist_events(logs_dir, &events)?;
        return Ok(TriageOutcome {
            run_dir,
            phase_a,
            review: Some(review),
            stability: None,
            final_status: intent.status,
            events,
        });
    }

    let stability = run_phase_c(compile_cmd, test_cmd, subprocess_timeout)
        .await
        .map_err(TriageError::Io)?;

    if !stability.succeeded(test_cmd.is_some()) {
        intent.status = IntentStatus::Rejected;
        emit(&mut events, &intent.intent_id, IntentStatus::UnderReview, IntentStatus::Rejected, "phase_c_failed");
        persist_events(logs_dir, &events)?;
        return Ok(TriageOutcome {
            run_dir,
            phase_a,
            review: Some(review),
            stability: Some(stability),
            final_status: intent.status,
            events,
        });
    }

    intent.status = IntentStatus::ApprovedPendingHuman;
    emit(&mut events, &intent.intent_id, IntentStatus::UnderReview, IntentStatus::ApprovedPendingHuman, "all_gates_passed");
    persist_events(logs_dir, &events)?;

    Ok(TriageOutcome {
        run_dir,
        phase_a,
        review: Some(review),
        stability: Some(stability),
        final_status: intent.status,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::{SecretScanner, TestIntegrityChecker};
    use crate::runner::PhaseAResult;
    use crate::subprocess::ProcOutcome;
    use async_trait::async_trait;
    use calyx_core::entities::{IntentType, RiskLevel};

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

    struct FixtureRunner {
        changed_files: Vec<&'static str>,
        diff: &'static str,
    }

    #[async_trait]
    impl AgentRunner for FixtureRunner {
        async fn propose(&self, _intent: &Intent, run_dir: &Path, _max_steps: u32) -> Result<PhaseAResult, TriageError> {
            std::fs::create_dir_all(run_dir.join("diffs"))?;
            std::fs::write(run_dir.join("plan.json"), "{}")?;
            std::fs::write(
                run_dir.join("audit.json"),
                serde_json::json!({"changed_files": self.changed_files}).to_string(),
            )?;
            std::fs::write(run_dir.join("diffs").join("a.patch"), self.diff)?;
            Ok(PhaseAResult {
                ok: true,
                run_dir: run_dir.to_path_buf(),
                proc: ProcOutcome { ok: true, status: Some(0), timed_out: false, stdout_tail: String::new(), stderr_tail: String::new() },
            })
        }
    }

    fn default_reviewers() -> Vec<Box<dyn Reviewer>> {
        vec![Box::new(SecretScanner), Box::new(TestIntegrityChecker)]
    }

    #[tokio::test]
    async fn happy_path_approves_pending_human() {
        let dir = tempfile::tempdir().unwrap();
        let logs_dir = dir.path().join("logs");
        let mut intent = sample_intent();
        let runner = FixtureRunner { changed_files: vec!["optimize.py"], diff: "--- a\n+++ b\n+print(1)\n" };
        let outcome = run_intent(
            &mut intent,
            dir.path(),
            &logs_dir,
            &runner,
            &default_reviewers(),
            true,
            1,
            ("true", &[]),
            None,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(outcome.final_status, IntentStatus::ApprovedPendingHuman);
        assert_eq!(intent.status, IntentStatus::ApprovedPendingHuman);
        assert_eq!(outcome.events.last().unwrap().to_status, "approved_pending_human");
    }

    #[tokio::test]
    async fn secret_detection_rejects_without_reaching_phase_c() {
        let dir = tempfile::tempdir().unwrap();
        let logs_dir = dir.path().join("logs");
        let mut intent = sample_intent();
        let runner = FixtureRunner {
            changed_files: vec!["config.py"],
            diff: "+aws_secret_access_key=\"AKIA_FAKE_TEST_VALUE\"\n",
        };
        let outcome = run_intent(
            &mut intent,
            dir.path(),
            &logs_dir,
            &runner,
            &default_reviewers(),
            false,
            1,
            ("true", &[]),
            None,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(outcome.final_status, IntentStatus::Rejected);
        assert!(outcome.stability.is_none());

        // spec §4.8 / Testable Scenario S2: C2 audit contains a "rejected" event.
        let logged = std::fs::read_to_string(logs_dir.join(DEPLOYMENT_EVENTS_FILE)).unwrap();
        assert_eq!(logged.lines().count(), 1);
        assert!(logged.contains("\"rejected\""));
    }

    #[tokio::test]
    async fn broken_test_assertion_rejects() {
        let dir = tempfile::tempdir().unwrap();
        let logs_dir = dir.path().join("logs");
        let mut intent = sample_intent();
        let runner = FixtureRunner {
            changed_files: vec!["test_optimize.py"],
            diff: "+def test_optimize():\n+    assert False\n",
        };
        let outcome = run_intent(
            &mut intent,
            dir.path(),
            &logs_dir,
            &runner,
            &default_reviewers(),
            false,
            1,
            ("true", &[]),
            None,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(outcome.final_status, IntentStatus::Rejected);
    }
}
