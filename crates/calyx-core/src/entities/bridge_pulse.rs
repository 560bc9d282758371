//! Bridge Pulse Event (spec §3) — stored in the Experience Store (C3).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PulseOutcome {
    Success,
    Warn,
    Fail,
    Info,
}

impl PulseOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PulseOutcome::Success => "success",
            PulseOutcome::Warn => "warn",
            PulseOutcome::Fail => "fail",
            PulseOutcome::Info => "info",
        }
    }
}

/// A single Bridge Pulse assessment. `pulse_id` is unique; the event is
/// created once and never mutated (spec §3 Lifecycle).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgePulseEvent {
    pub pulse_id: String,
    pub timestamp: String,
    pub summary: String,
    pub cpu_pct: f64,
    pub ram_pct: f64,
    #[serde(default)]
    pub gpu_pct: Option<f64>,
    pub capacity_score: f64,
    pub autonomy_mode: String,
    pub active_agents: u32,
    pub gates_state: BTreeMap<String, bool>,
    #[serde(default)]
    pub tes_score: Option<f64>,
    #[serde(default)]
    pub stability: Option<f64>,
    #[serde(default)]
    pub velocity: Option<f64>,
    #[serde(default)]
    pub footprint: Option<f64>,
    #[serde(default)]
    pub uptime_24h: Option<f64>,
    pub policy_violations: u32,
    pub manual_interventions: u32,
    #[serde(default)]
    pub confidence_delta: Option<f64>,
    pub outcome: PulseOutcome,
}
