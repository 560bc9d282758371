//! Per-tick dispatch algorithm (spec §4.6).

use crate::capacity::{capacity_score, guardrails_for, CapacitySnapshot};
use calyx_core::entities::{AutonomyMode, Freshness, HeartbeatStatus};
use calyx_core::LoadMode;
use calyx_policy::PolicyGate;
use std::collections::HashMap;

/// One agent's static dispatch configuration.
#[derive(Debug, Clone)]
pub struct AgentDescriptor {
    pub id: String,
    /// Lower wins ties.
    pub priority: u32,
    pub min_capacity: f64,
    pub cooldown: std::time::Duration,
}

/// Per-agent mutable scheduling state, held across ticks.
#[derive(Debug, Clone, Default)]
pub struct AgentState {
    pub cooldown_until: f64,
    pub last_dispatched: f64,
}

/// Why an agent was or was not dispatched this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Dispatched { agent_id: String, mode: AutonomyMode },
    SkippedRunning(String),
    SkippedCooldown(String),
    SkippedCapacity(String),
    SkippedPolicyDenied { agent_id: String, reason: String },
}

/// Selects autonomy mode from a rolling stability average (spec §4.6 step 3).
pub fn mode_for_stability(avg_stability: Option<f64>, policy_permits_apply_tests: bool) -> AutonomyMode {
    match avg_stability {
        None => AutonomyMode::Safe,
        Some(avg) if avg < 0.6 => AutonomyMode::Safe,
        Some(avg) if avg < 0.8 => AutonomyMode::Tests,
        Some(_) if policy_permits_apply_tests => AutonomyMode::ApplyTests,
        Some(_) => AutonomyMode::Tests,
    }
}

/// Runs one scheduling tick over `agents` in priority order (lower
/// `priority` first, then least-recently-dispatched), returning one
/// outcome per agent considered. The tick itself performs no I/O beyond
/// the provided callbacks — any long operation is expected to be launched
/// by the caller as a child task (spec §4.6 "Suspension points").
pub fn tick<F>(
    agents: &[AgentDescriptor],
    states: &mut HashMap<String, AgentState>,
    snapshot: CapacitySnapshot,
    load_mode: LoadMode,
    now: f64,
    heartbeat_freshness: impl Fn(&str) -> (Freshness, Option<HeartbeatStatus>),
    recent_avg_stability: impl Fn(&str) -> Option<f64>,
    policy: &PolicyGate,
    mut on_dispatch: F,
) -> Vec<TickOutcome>
where
    F: FnMut(&str, AutonomyMode),
{
    let score = capacity_score(snapshot);
    let guardrails = guardrails_for(load_mode);
    let over_guardrail = snapshot.cpu_pct > guardrails.cpu_ceiling || snapshot.ram_pct > guardrails.ram_ceiling;

    let mut ordered: Vec<&AgentDescriptor> = agents.iter().collect();
    ordered.sort_by(|a, b| {
        a.priority.cmp(&b.priority).then_with(|| {
            let a_last = states.get(&a.id).map(|s| s.last_dispatched).unwrap_or(0.0);
            let b_last = states.get(&b.id).map(|s| s.last_dispatched).unwrap_or(0.0);
            a_last.partial_cmp(&b_last).unwrap_or(std::cmp::Ordering::Equal)
        })
    });

    let mut outcomes = Vec::with_capacity(ordered.len());
    for agent in ordered {
        let (freshness, status) = heartbeat_freshness(&agent.id);
        if freshness == Freshness::Fresh && status == Some(HeartbeatStatus::Running) {
            outcomes.push(TickOutcome::SkippedRunning(agent.id.clone()));
            continue;
        }
        let state = states.entry(agent.id.clone()).or_default();
        if state.cooldown_until > now {
            outcomes.push(TickOutcome::SkippedCooldown(agent.id.clone()));
            continue;
        }
        if over_guardrail || score < agent.min_capacity {
            outcomes.push(TickOutcome::SkippedCapacity(agent.id.clone()));
            continue;
        }
        let avg_stability = recent_avg_stability(&agent.id);
        let mode = mode_for_stability(avg_stability, true);
        let decision = policy.evaluate("agent_dispatch", &format!("dispatch {} mode={:?}", agent.id, mode));
        if decision.result != calyx_core::entities::PolicyResult::Allowed {
            outcomes.push(TickOutcome::SkippedPolicyDenied { agent_id: agent.id.clone(), reason: decision.reason });
            continue;
        }
        on_dispatch(&agent.id, mode);
        let state = states.get_mut(&agent.id).unwrap();
        state.last_dispatched = now;
        state.cooldown_until = now + agent.cooldown.as_secs_f64();
        outcomes.push(TickOutcome::Dispatched { agent_id: agent.id.clone(), mode });
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use calyx_policy::PolicyGate;

    fn idle() -> (Freshness, Option<HeartbeatStatus>) {
        (Freshness::Missing, None)
    }

    #[test]
    fn dispatches_in_priority_then_lru_order() {
        let dir = tempfile::tempdir().unwrap();
        let gate = PolicyGate::open(dir.path(), None);
        gate.configure(vec![calyx_policy::AllowPattern { request_type: "agent_dispatch".into(), summary_pattern: None }])
            .unwrap();
        let agents = vec![
            AgentDescriptor { id: "b".into(), priority: 1, min_capacity: 0.0, cooldown: std::time::Duration::from_secs(60) },
            AgentDescriptor { id: "a".into(), priority: 1, min_capacity: 0.0, cooldown: std::time::Duration::from_secs(60) },
        ];
        let mut states = HashMap::new();
        states.insert("b".to_string(), AgentState { cooldown_until: 0.0, last_dispatched: 5.0 });
        states.insert("a".to_string(), AgentState { cooldown_until: 0.0, last_dispatched: 1.0 });
        let mut dispatched = Vec::new();
        let outcomes = tick(
            &agents,
            &mut states,
            CapacitySnapshot { cpu_pct: 10.0, ram_pct: 10.0, gpu_pct: None },
            LoadMode::Normal,
            100.0,
            |_| idle(),
            |_| None,
            &gate,
            |id, _mode| dispatched.push(id.to_string()),
        );
        assert_eq!(dispatched, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(outcomes.len(), 2);
    }

    #[test]
    fn low_capacity_defers_all_dispatches() {
        let dir = tempfile::tempdir().unwrap();
        let gate = PolicyGate::open(dir.path(), None);
        gate.configure(vec![calyx_policy::AllowPattern { request_type: "agent_dispatch".into(), summary_pattern: None }])
            .unwrap();
        let agents = vec![AgentDescriptor { id: "a".into(), priority: 1, min_capacity: 0.9, cooldown: std::time::Duration::from_secs(60) }];
        let mut states = HashMap::new();
        let outcomes = tick(
            &agents,
            &mut states,
            CapacitySnapshot { cpu_pct: 95.0, ram_pct: 95.0, gpu_pct: None },
            LoadMode::Normal,
            100.0,
            |_| idle(),
            |_| None,
            &gate,
            |_, _| panic!("should not dispatch"),
        );
        assert!(matches!(outcomes[0], TickOutcome::SkippedCapacity(_)));
    }

    #[test]
    fn fresh_running_heartbeat_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let gate = PolicyGate::open(dir.path(), None);
        let agents = vec![AgentDescriptor { id: "a".into(), priority: 1, min_capacity: 0.0, cooldown: std::time::Duration::from_secs(60) }];
        let mut states = HashMap::new();
        let outcomes = tick(
            &agents,
            &mut states,
            CapacitySnapshot { cpu_pct: 10.0, ram_pct: 10.0, gpu_pct: None },
            LoadMode::Normal,
            100.0,
            |_| (Freshness::Fresh, Some(HeartbeatStatus::Running)),
            |_| None,
            &gate,
            |_, _| panic!("should not dispatch"),
        );
        assert_eq!(outcomes[0], TickOutcome::SkippedRunning("a".to_string()));
    }

    #[test]
    fn mode_selection_follows_stability_bands() {
        assert_eq!(mode_for_stability(None, true), AutonomyMode::Safe);
        assert_eq!(mode_for_stability(Some(0.3), true), AutonomyMode::Safe);
        assert_eq!(mode_for_stability(Some(0.7), true), AutonomyMode::Tests);
        assert_eq!(mode_for_stability(Some(0.9), true), AutonomyMode::ApplyTests);
        assert_eq!(mode_for_stability(Some(0.9), false), AutonomyMode::Tests);
    }
}
