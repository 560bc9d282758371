//! Station Calyx Triage Orchestrator (C8) CLI: runs one intent (read from
//! `--goal-file`) through the propose/review/stability pipeline and exits
//! with the uniform contract (spec §6): 0 approved, 1 rejected, 2 bad
//! usage, 3 internal precondition violated.

use calyx_core::entities::{Intent, IntentStatus, IntentType, RiskLevel};
use calyx_core::CalyxConfig;
use calyx_triage::{run_intent, Reviewer, SecretScanner, SubprocessAgentRunner, TestIntegrityChecker};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "calyx-triaged", about = "Station Calyx Triage Orchestrator (C8) CLI")]
struct Args {
    /// JSON file describing the goal/intent to propose and review.
    #[arg(long)]
    goal_file: PathBuf,

    #[arg(long, default_value_t = 20)]
    max_steps: u32,

    /// Reject on any reviewer-reported scope violation, not only a hard fail.
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Run the project's test suite as part of phase C.
    #[arg(long, default_value_t = false)]
    pytest: bool,

    /// Extra arguments appended to the pytest invocation.
    #[arg(long, default_value = "")]
    pytest_args: String,
}

/// Minimal goal-file schema; most `Intent` fields default to safe values
/// when omitted, matching how the original `triage_orchestrator.py` tool
/// accepted a bare goal string for ad hoc runs.
#[derive(Debug, Deserialize)]
struct GoalFile {
    goal: String,
    #[serde(default = "default_proposer")]
    proposed_by: String,
    #[serde(default)]
    change_set: Vec<String>,
    #[serde(default = "default_risk")]
    risk_level: RiskLevel,
    #[serde(default = "default_rollback")]
    rollback_plan: String,
    #[serde(default = "default_reviewers")]
    reviewers: Vec<String>,
}

fn default_proposer() -> String {
    "operator".to_string()
}
fn default_risk() -> RiskLevel {
    RiskLevel::Low
}
fn default_rollback() -> String {
    "git revert".to_string()
}
fn default_reviewers() -> Vec<String> {
    vec!["secret_scanner".to_string(), "test_integrity".to_string()]
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[calyx-triaged] .env not loaded: {e} (using system environment)");
    }
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = CalyxConfig::from_env();

    let goal_bytes = match std::fs::read(&args.goal_file) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("[calyx-triaged] cannot read goal file {}: {e}", args.goal_file.display());
            return ExitCode::from(2);
        }
    };
    let goal: GoalFile = match serde_json::from_slice(&goal_bytes) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("[calyx-triaged] malformed goal file: {e}");
            return ExitCode::from(2);
        }
    };

    let mut intent = Intent {
        intent_id: Intent::new_id(),
        proposed_by: goal.proposed_by,
        intent_type: IntentType::CodeChange,
        goal: goal.goal,
        change_set: goal.change_set,
        risk_level: goal.risk_level,
        rollback_plan: goal.rollback_plan,
        reviewers: goal.reviewers,
        tests_reference: None,
        status: IntentStatus::UnderReview,
    };

    let agent_binary = std::env::var("CALYX_AGENT_BINARY").unwrap_or_else(|_| "calyx-agent".to_string());
    let runner = SubprocessAgentRunner::new(agent_binary, Duration::from_secs(300));

    let reviewers: Vec<Box<dyn Reviewer>> = vec![Box::new(SecretScanner), Box::new(TestIntegrityChecker)];

    let compile_cmd_str = std::env::var("CALYX_COMPILE_CMD").unwrap_or_else(|_| "true".to_string());
    let mut compile_parts = compile_cmd_str.split_whitespace();
    let compile_bin = compile_parts.next().unwrap_or("true").to_string();
    let compile_args: Vec<String> = compile_parts.map(str::to_string).collect();

    let test_cmd_owned: Option<(String, Vec<String>)> = if args.pytest {
        Some(("pytest".to_string(), args.pytest_args.split_whitespace().map(str::to_string).collect()))
    } else {
        None
    };
    let test_cmd = test_cmd_owned.as_ref().map(|(bin, a)| (bin.as_str(), a.as_slice()));

    let outcome = run_intent(
        &mut intent,
        &config.outgoing_dir(),
        &config.logs_dir(),
        &runner,
        &reviewers,
        args.strict,
        args.max_steps,
        (compile_bin.as_str(), &compile_args),
        test_cmd,
        Duration::from_secs(600),
    )
    .await;

    match outcome {
        Ok(result) => {
            tracing::info!(
                final_status = result.final_status.as_str(),
                run_dir = %result.run_dir.display(),
                events = result.events.len(),
                "triage run complete"
            );
            match result.final_status {
                IntentStatus::ApprovedPendingHuman => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            }
        }
        Err(e) => {
            let calyx_err: calyx_core::CalyxError = e.into();
            eprintln!("[calyx-triaged] triage run failed: {calyx_err}");
            ExitCode::from(calyx_err.exit_code() as u8)
        }
    }
}
