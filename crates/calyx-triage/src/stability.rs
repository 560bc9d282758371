//! Phase C — Stability (spec §4.8): compiles the declared source roots and,
//! optionally, runs the project's test suite.

use crate::subprocess::{run_with_timeout, ProcOutcome};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityReport {
    pub compile_ok: bool,
    pub compile_stdout_tail: String,
    pub compile_stderr_tail: String,
    pub pytest_ok: Option<bool>,
    pub pytest_stdout_tail: Option<String>,
    pub pytest_stderr_tail: Option<String>,
}

impl StabilityReport {
    /// Overall pass: compile succeeded, and the test suite too when requested.
    pub fn succeeded(&self, required_tests: bool) -> bool {
        self.compile_ok && (!required_tests || self.pytest_ok.unwrap_or(false))
    }
}

/// Runs the compile check (and, if `run_tests`, the test command) with the
/// injected commands — kept pluggable so the orchestrator is not wedded to
/// one language's toolchain.
pub async fn run_phase_c(
    compile_cmd: (&str, &[String]),
    test_cmd: Option<(&str, &[String])>,
    timeout: Duration,
) -> std::io::Result<StabilityReport> {
    let compile: ProcOutcome = run_with_timeout(compile_cmd.0, compile_cmd.1, None, timeout).await?;
    let mut report = StabilityReport {
        compile_ok: compile.ok,
        compile_stdout_tail: compile.stdout_tail,
        compile_stderr_tail: compile.stderr_tail,
        pytest_ok: None,
        pytest_stdout_tail: None,
        pytest_stderr_tail: None,
    };
    if let Some((bin, args)) = test_cmd {
        if report.compile_ok {
            let test_out = run_with_timeout(bin, args, None, timeout).await?;
            report.pytest_ok = Some(test_out.ok);
            report.pytest_stdout_tail = Some(test_out.stdout_tail);
            report.pytest_stderr_tail = Some(test_out.stderr_tail);
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn compile_only_reports_pytest_as_none() {
        let report = run_phase_c(("true", &[]), None, Duration::from_secs(5)).await.unwrap();
        assert!(report.compile_ok);
        assert!(report.pytest_ok.is_none());
        assert!(report.succeeded(false));
    }

    #[tokio::test]
    async fn failed_compile_skips_tests() {
        let report = run_phase_c(("false", &[]), Some(("true", &[])), Duration::from_secs(5)).await.unwrap();
        assert!(!report.compile_ok);
        assert!(report.pytest_ok.is_none());
        assert!(!report.succeeded(true));
    }

    #[tokio::test]
    async fn compile_and_tests_both_run_when_compile_passes() {
        let report = run_phase_c(("true", &[]), Some(("true", &[])), Duration::from_secs(5)).await.unwrap();
        assert!(report.succeeded(true));
    }
}
