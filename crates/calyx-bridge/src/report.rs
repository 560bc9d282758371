//! Markdown report rendering (spec §6 `reports/bridge_pulse_bp-<id>.md`).
//! Bridge is report-first: this is the primary artifact an operator reads,
//! the Experience Store row is secondary bookkeeping.

use crate::quiesce::EffectiveStatus;
use calyx_core::entities::BridgePulseEvent;
use std::io;
use std::path::Path;

/// Renders the markdown body for one pulse assessment.
pub fn render(pulse: &BridgePulseEvent, effective: EffectiveStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Bridge Pulse {}\n\n", pulse.pulse_id));
    out.push_str(&format!("- timestamp: {}\n", pulse.timestamp));
    out.push_str(&format!("- status: {}\n", effective.as_str()));
    out.push_str(&format!("- capacity_score: {:.3}\n", pulse.capacity_score));
    out.push_str(&format!("- cpu_pct: {:.1}\n", pulse.cpu_pct));
    out.push_str(&format!("- ram_pct: {:.1}\n", pulse.ram_pct));
    if let Some(gpu) = pulse.gpu_pct {
        out.push_str(&format!("- gpu_pct: {:.1}\n", gpu));
    }
    out.push_str(&format!("- autonomy_mode: {}\n", pulse.autonomy_mode));
    out.push_str(&format!("- active_agents: {}\n", pulse.active_agents));
    if let Some(tes) = pulse.tes_score {
        out.push_str(&format!("- mean_tes: {:.2}\n", tes));
    } else {
        out.push_str("- mean_tes: n/a (no samples)\n");
    }
    if let Some(uptime) = pulse.uptime_24h {
        out.push_str(&format!("- uptime_24h_pct: {:.1}\n", uptime));
    }
    out.push_str(&format!("- policy_violations: {}\n", pulse.policy_violations));
    out.push_str(&format!("- manual_interventions: {}\n", pulse.manual_interventions));
    out.push_str(&format!("- outcome: {}\n\n", pulse.outcome.as_str()));

    out.push_str("## Gates\n\n");
    if pulse.gates_state.is_empty() {
        out.push_str("(none reported)\n\n");
    } else {
        for (gate, open) in &pulse.gates_state {
            out.push_str(&format!("- {}: {}\n", gate, if *open { "open" } else { "closed" }));
        }
        out.push('\n');
    }

    out.push_str(&format!("{}\n", pulse.summary));
    out
}

/// Writes `body` to `path` via temp-file-then-rename, same convention as
/// [`calyx_fabric::write_atomic_json`] but for a pre-rendered text body.
pub fn write_atomic_text(path: &Path, body: &str) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let tmp = dir.join(format!(
        ".{}.tmp-{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("report"),
        std::process::id()
    ));
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)
}

/// The conventional report path for a given pulse (spec §6).
pub fn report_path(reports_dir: &Path, pulse_id: &str) -> std::path::PathBuf {
    reports_dir.join(format!("bridge_pulse_{pulse_id}.md"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calyx_core::entities::PulseOutcome;
    use std::collections::BTreeMap;

    fn sample() -> BridgePulseEvent {
        let mut gates = BTreeMap::new();
        gates.insert("apply".to_string(), false);
        BridgePulseEvent {
            pulse_id: "bp-1".to_string(),
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            summary: "steady state".to_string(),
            cpu_pct: 30.0,
            ram_pct: 40.0,
            gpu_pct: None,
            capacity_score: 0.65,
            autonomy_mode: "tests".to_string(),
            active_agents: 2,
            gates_state: gates,
            tes_score: Some(91.0),
            stability: Some(0.9),
            velocity: Some(0.4),
            footprint: Some(0.2),
            uptime_24h: Some(96.0),
            policy_violations: 0,
            manual_interventions: 0,
            confidence_delta: None,
            outcome: PulseOutcome::Warn,
        }
    }

    #[test]
    fn render_includes_status_and_gates() {
        let body = render(&sample(), EffectiveStatus::Pulse(crate::status::PulseStatus::Yellow));
        assert!(body.contains("status: YELLOW"));
        assert!(body.contains("apply: closed"));
        assert!(body.contains("mean_tes: 91.00"));
    }

    #[test]
    fn report_path_uses_pulse_id() {
        let path = report_path(Path::new("/tmp/reports"), "bp-1");
        assert_eq!(path, Path::new("/tmp/reports/bridge_pulse_bp-1.md"));
    }

    #[test]
    fn write_atomic_text_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.md");
        write_atomic_text(&path, "hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }
}
