//! Bridge Pulse Controller (C10) orchestration (spec §4.10).
//!
//! Bridge is report-first: it classifies, records, and writes a report on
//! every tick; it never touches agents, leases, or policy directly. A RED
//! pulse requests a lease from C5 for whatever corrective action an
//! operator authorizes — it does not grant itself permission to act, and a
//! YELLOW pulse only proposes mitigations to a pending-changes file, never
//! applies them (spec §4.10 "never bypasses C4/C5").

use crate::error::BridgeError;
use crate::quiesce::{self, EffectiveStatus};
use crate::{metrics, report, status};
use calyx_core::entities::{BridgePulseEvent, Lease, LeaseLimits, PulseOutcome};
use calyx_fabric::write_atomic_json;
use calyx_policy::lease::LeaseManager;
use calyx_scheduler::capacity::{capacity_score, CapacitySnapshot};
use calyx_store::ExperienceStore;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Default wallclock window (10 minutes) for a bridge-requested corrective
/// lease — long enough for a human to review and cosign a RED response.
pub const CORRECTIVE_LEASE_TIMEOUT_SECS: u64 = 600;

/// Everything a single controller tick needs; the caller (daemon main loop
/// or CLI invocation) is responsible for sourcing these from C12 (probes),
/// C9 (telemetry), and the scheduler/supervisor's own bookkeeping.
#[derive(Debug, Clone)]
pub struct BridgeInputs {
    pub cpu_pct: f64,
    pub ram_pct: f64,
    pub gpu_pct: Option<f64>,
    /// Recent TES scores, most recent last.
    pub recent_tes: Vec<f64>,
    /// `(timestamp_unix, active_process_count)` samples for the uptime rollup.
    pub uptime_samples: Vec<(f64, u32)>,
    pub autonomy_mode: String,
    pub active_agents: u32,
    pub gates_state: BTreeMap<String, bool>,
    pub policy_violations: u32,
    pub manual_interventions: u32,
}

/// Result of one controller tick: the recorded pulse, its effective status
/// (post-quiesce), the report path written, and — only on an unquiesced
/// RED pulse — the corrective lease requested from C5.
#[derive(Debug, Clone)]
pub struct PulseAssessment {
    pub pulse: BridgePulseEvent,
    pub event_id: String,
    pub effective_status: EffectiveStatus,
    pub report_path: PathBuf,
    pub requested_lease: Option<Lease>,
}

fn summarize(effective: EffectiveStatus, capacity: f64, mean_tes: Option<f64>, uptime_pct: f64) -> String {
    match effective {
        EffectiveStatus::Quiesced => "Bridge pulse suppressed: manual_shutdown.flag present.".to_string(),
        EffectiveStatus::Pulse(status::PulseStatus::Green) => {
            format!("Healthy: capacity {capacity:.2}, uptime_24h {uptime_pct:.1}%, mean TES {:.1}.", mean_tes.unwrap_or_default())
        }
        EffectiveStatus::Pulse(status::PulseStatus::Yellow) => {
            format!(
                "Degraded: capacity {capacity:.2}, uptime_24h {uptime_pct:.1}%, mean TES {}. Mitigations proposed, not applied.",
                mean_tes.map(|v| format!("{v:.1}")).unwrap_or_else(|| "n/a".to_string())
            )
        }
        EffectiveStatus::Pulse(status::PulseStatus::Red) => {
            format!(
                "Critical: capacity {capacity:.2}, uptime_24h {uptime_pct:.1}%, mean TES {}. Corrective lease requested; awaiting cosignature.",
                mean_tes.map(|v| format!("{v:.1}")).unwrap_or_else(|| "n/a".to_string())
            )
        }
    }
}

fn outcome_for(effective: EffectiveStatus) -> PulseOutcome {
    match effective {
        EffectiveStatus::Quiesced => PulseOutcome::Info,
        EffectiveStatus::Pulse(status::PulseStatus::Green) => PulseOutcome::Success,
        EffectiveStatus::Pulse(status::PulseStatus::Yellow) => PulseOutcome::Warn,
        EffectiveStatus::Pulse(status::PulseStatus::Red) => PulseOutcome::Fail,
    }
}

/// Runs one assessment: classify, record to the Experience Store, render
/// and write the markdown report, and — on an unquiesced RED — request a
/// corrective lease from C5. `now` is the caller-supplied unix timestamp
/// (callers pass `calyx_core::time::now_ts()`; kept as a parameter so this
/// stays pure and testable).
pub fn assess(
    outgoing_dir: &Path,
    reports_dir: &Path,
    store: &ExperienceStore,
    lease_mgr: &LeaseManager,
    inputs: &BridgeInputs,
    now: f64,
    report_id: Option<&str>,
) -> Result<PulseAssessment, BridgeError> {
    let capacity = capacity_score(CapacitySnapshot { cpu_pct: inputs.cpu_pct, ram_pct: inputs.ram_pct, gpu_pct: inputs.gpu_pct });
    let mean_tes = metrics::mean_tes(&inputs.recent_tes);
    let (uptime_pct, uptime_samples) = metrics::uptime_24h(&inputs.uptime_samples, now);
    let sample_count = inputs.recent_tes.len().max(uptime_samples);
    let raw_status = status::classify(Some(uptime_pct), mean_tes, sample_count);
    let effective = quiesce::effective_status(outgoing_dir, raw_status);

    let pulse_id = report_id.map(|id| format!("bp-{id}")).unwrap_or_else(|| format!("bp-{}", Uuid::new_v4()));
    let timestamp = calyx_core::time::ts_to_iso(now);
    let summary = summarize(effective, capacity, mean_tes, uptime_pct);

    let pulse = BridgePulseEvent {
        pulse_id: pulse_id.clone(),
        timestamp,
        summary,
        cpu_pct: inputs.cpu_pct,
        ram_pct: inputs.ram_pct,
        gpu_pct: inputs.gpu_pct,
        capacity_score: capacity,
        autonomy_mode: inputs.autonomy_mode.clone(),
        active_agents: inputs.active_agents,
        gates_state: inputs.gates_state.clone(),
        tes_score: mean_tes,
        stability: None,
        velocity: None,
        footprint: None,
        uptime_24h: Some(uptime_pct),
        policy_violations: inputs.policy_violations,
        manual_interventions: inputs.manual_interventions,
        confidence_delta: None,
        outcome: outcome_for(effective),
    };

    let event_id = store.record_bridge_pulse(&pulse)?;

    let body = report::render(&pulse, effective);
    let report_path = report::report_path(reports_dir, &pulse_id);
    report::write_atomic_text(&report_path, &body)?;

    let requested_lease = match effective {
        EffectiveStatus::Pulse(status::PulseStatus::Red) => {
            let lease = lease_mgr.issue_lease(&pulse_id, "bridge", LeaseLimits { wallclock_timeout_s: CORRECTIVE_LEASE_TIMEOUT_SECS })?;
            write_alert(outgoing_dir, &pulse, &lease.lease_id)?;
            Some(lease)
        }
        EffectiveStatus::Pulse(status::PulseStatus::Yellow) => {
            write_pending_changes(outgoing_dir, &pulse)?;
            None
        }
        _ => None,
    };

    Ok(PulseAssessment { pulse, event_id, effective_status: effective, report_path, requested_lease })
}

fn write_alert(outgoing_dir: &Path, pulse: &BridgePulseEvent, lease_id: &str) -> Result<(), BridgeError> {
    #[derive(serde::Serialize)]
    struct Alert<'a> {
        pulse_id: &'a str,
        lease_id: &'a str,
        summary: &'a str,
        requested_at: &'a str,
    }
    let path = outgoing_dir.join("alerts").join(format!("{}.json", pulse.pulse_id));
    write_atomic_json(
        &path,
        &Alert { pulse_id: &pulse.pulse_id, lease_id, summary: &pulse.summary, requested_at: &pulse.timestamp },
    )?;
    Ok(())
}

/// Suggested (never applied) mitigations for a YELLOW pulse, written where
/// an operator or the scheduler's own maintenance tick can review them.
fn write_pending_changes(outgoing_dir: &Path, pulse: &BridgePulseEvent) -> Result<(), BridgeError> {
    #[derive(serde::Serialize)]
    struct PendingChange<'a> {
        pulse_id: &'a str,
        proposed_at: &'a str,
        suggestions: Vec<String>,
    }
    let mut suggestions = Vec::new();
    if status::resource_level(pulse.cpu_pct) != status::ResourceLevel::Low {
        suggestions.push("reduce concurrent agent count until CPU pressure drops".to_string());
    }
    if status::resource_level(pulse.ram_pct) != status::ResourceLevel::Low {
        suggestions.push("trim in-flight triage runs until RAM pressure drops".to_string());
    }
    if pulse.tes_score.map(|t| t < 85.0).unwrap_or(true) {
        suggestions.push("tighten autonomy mode to safe until TES recovers".to_string());
    }
    let path = outgoing_dir.join("pending_changes").join(format!("{}.json", pulse.pulse_id));
    write_atomic_json(&path, &PendingChange { pulse_id: &pulse.pulse_id, proposed_at: &pulse.timestamp, suggestions })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> ExperienceStore {
        ExperienceStore::open(dir.join("experience.sqlite")).unwrap()
    }

    fn lease_mgr(dir: &Path) -> LeaseManager {
        LeaseManager::open(&dir.join("outgoing"), "test-key")
    }

    fn base_inputs() -> BridgeInputs {
        BridgeInputs {
            cpu_pct: 20.0,
            ram_pct: 30.0,
            gpu_pct: None,
            recent_tes: vec![96.0, 97.0, 95.0],
            uptime_samples: vec![(calyx_core::time::now_ts() - 10.0, 3)],
            autonomy_mode: "tests".to_string(),
            active_agents: 2,
            gates_state: BTreeMap::new(),
            policy_violations: 0,
            manual_interventions: 0,
        }
    }

    #[test]
    fn green_pulse_writes_report_and_requests_no_lease() {
        let dir = tempfile::tempdir().unwrap();
        let outgoing = dir.path().join("outgoing");
        let reports = dir.path().join("reports");
        let store = store(dir.path());
        let mgr = lease_mgr(dir.path());
        let now = calyx_core::time::now_ts();
        let assessment = assess(&outgoing, &reports, &store, &mgr, &base_inputs(), now, None).unwrap();
        assert_eq!(assessment.effective_status, EffectiveStatus::Pulse(status::PulseStatus::Green));
        assert!(assessment.requested_lease.is_none());
        assert!(assessment.report_path.exists());
    }

    #[test]
    fn red_pulse_requests_lease_and_writes_alert() {
        let dir = tempfile::tempdir().unwrap();
        let outgoing = dir.path().join("outgoing");
        let reports = dir.path().join("reports");
        let store = store(dir.path());
        let mgr = lease_mgr(dir.path());
        let mut inputs = base_inputs();
        inputs.recent_tes = vec![40.0, 35.0];
        inputs.uptime_samples = vec![(calyx_core::time::now_ts() - 10.0, 0)];
        let now = calyx_core::time::now_ts();
        let assessment = assess(&outgoing, &reports, &store, &mgr, &inputs, now, None).unwrap();
        assert_eq!(assessment.effective_status, EffectiveStatus::Pulse(status::PulseStatus::Red));
        let lease = assessment.requested_lease.expect("red pulse must request a lease");
        let verify = mgr.verify_lease(&lease.lease_id).unwrap();
        assert!(!verify.usable, "lease must await cosignature before use");
        assert!(outgoing.join("alerts").join(format!("{}.json", assessment.pulse.pulse_id)).exists());
    }

    #[test]
    fn quiesce_flag_suppresses_lease_request_even_when_red() {
        let dir = tempfile::tempdir().unwrap();
        let outgoing = dir.path().join("outgoing");
        std::fs::create_dir_all(&outgoing).unwrap();
        std::fs::write(outgoing.join(quiesce::MANUAL_SHUTDOWN_FLAG_NAME), b"").unwrap();
        let reports = dir.path().join("reports");
        let store = store(dir.path());
        let mgr = lease_mgr(dir.path());
        let mut inputs = base_inputs();
        inputs.recent_tes = vec![20.0];
        let now = calyx_core::time::now_ts();
        let assessment = assess(&outgoing, &reports, &store, &mgr, &inputs, now, None).unwrap();
        assert_eq!(assessment.effective_status, EffectiveStatus::Quiesced);
        assert!(assessment.requested_lease.is_none());
    }

    #[test]
    fn yellow_pulse_writes_pending_changes_not_a_lease() {
        let dir = tempfile::tempdir().unwrap();
        let outgoing = dir.path().join("outgoing");
        let reports = dir.path().join("reports");
        let store = store(dir.path());
        let mgr = lease_mgr(dir.path());
        let mut inputs = base_inputs();
        inputs.recent_tes = vec![86.0, 87.0];
        inputs.uptime_samples = vec![(calyx_core::time::now_ts() - 10.0, 1)];
        let now = calyx_core::time::now_ts();
        let assessment = assess(&outgoing, &reports, &store, &mgr, &inputs, now, None).unwrap();
        assert_eq!(assessment.effective_status, EffectiveStatus::Pulse(status::PulseStatus::Yellow));
        assert!(assessment.requested_lease.is_none());
        assert!(outgoing.join("pending_changes").join(format!("{}.json", assessment.pulse.pulse_id)).exists());
    }
}
