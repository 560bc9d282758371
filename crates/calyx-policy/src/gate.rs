//! C4 Policy Gate: deny-by-default evaluator with an allow-list matcher and
//! a decision log.

use calyx_core::entities::PolicyDecision;
use calyx_core::entities::PolicyResult;
use calyx_fabric::{append_jsonl, write_atomic_json};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

/// One allow-list entry. `request_type` supports `*` as a wildcard;
/// `summary_pattern`, if present, must also match (substring or `*`-glob)
/// for the request to be allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowPattern {
    pub request_type: String,
    #[serde(default)]
    pub summary_pattern: Option<String>,
}

/// The live policy document, replaced atomically by `Configure` (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub policy_version: u64,
    pub allow: Vec<AllowPattern>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self { policy_version: 0, allow: Vec::new() }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct PolicyStats {
    pub total_decisions: u64,
    pub denied_count: u64,
}

pub struct PolicyGate {
    policy_path: PathBuf,
    decision_log_path: PathBuf,
    document: RwLock<PolicyDocument>,
    stats: Mutex<PolicyStats>,
}

/// Glob matcher supporting only `*` (matches any run of characters),
/// sufficient for the request_type/summary patterns this gate evaluates.
fn glob_match(pattern: &str, text: &str) -> bool {
    fn inner(p: &[u8], t: &[u8]) -> bool {
        match p.first() {
            None => t.is_empty(),
            Some(b'*') => {
                for i in 0..=t.len() {
                    if inner(&p[1..], &t[i..]) {
                        return true;
                    }
                }
                false
            }
            Some(c) => t.first() == Some(c) && inner(&p[1..], &t[1..]),
        }
    }
    inner(pattern.as_bytes(), text.as_bytes())
}

impl PolicyGate {
    /// Opens the gate rooted at `outgoing_dir`, loading any existing policy
    /// document or starting deny-all if none exists yet.
    pub fn open(outgoing_dir: &std::path::Path, policy_version_override: Option<u64>) -> Self {
        let policy_path = outgoing_dir.join("policies").join("policy.json");
        let decision_log_path = outgoing_dir.join("policies").join("decisions.jsonl");
        let mut document = std::fs::read(&policy_path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<PolicyDocument>(&bytes).ok())
            .unwrap_or_default();
        if let Some(v) = policy_version_override {
            document.policy_version = v;
        }
        Self {
            policy_path,
            decision_log_path,
            document: RwLock::new(document),
            stats: Mutex::new(PolicyStats::default()),
        }
    }

    pub fn policy_version(&self) -> u64 {
        self.document.read().expect("policy gate lock poisoned").policy_version
    }

    pub fn stats(&self) -> PolicyStats {
        self.stats.lock().expect("policy gate lock poisoned").clone()
    }

    /// Replaces the live policy atomically and bumps `policy_version`.
    pub fn configure(&self, allow: Vec<AllowPattern>) -> Result<u64, calyx_fabric::FabricError> {
        let mut doc = self.document.write().expect("policy gate lock poisoned");
        doc.policy_version += 1;
        doc.allow = allow;
        write_atomic_json(&self.policy_path, &*doc)?;
        Ok(doc.policy_version)
    }

    /// Evaluates one request: ALLOWED iff `request_type` (and, when
    /// present, `request_summary`) matches some allow-list entry. An empty
    /// allow-list always yields DENIED (spec §4.4 edge case) — the decision
    /// is still recorded, never silently dropped.
    pub fn evaluate(&self, request_type: &str, request_summary: &str) -> PolicyDecision {
        let doc = self.document.read().expect("policy gate lock poisoned");
        let matched = doc.allow.iter().any(|p| {
            glob_match(&p.request_type, request_type)
                && p.summary_pattern
                    .as_ref()
                    .map(|sp| glob_match(sp, request_summary) || request_summary.contains(sp.as_str()))
                    .unwrap_or(true)
        });
        let (result, reason) = if matched {
            (PolicyResult::Allowed, "matched allow-list pattern".to_string())
        } else if doc.allow.is_empty() {
            (PolicyResult::Denied, "allow-list is empty; deny-all in effect".to_string())
        } else {
            (PolicyResult::Denied, "no allow-list pattern matched".to_string())
        };
        let decision = PolicyDecision {
            result,
            reason,
            timestamp: calyx_core::time::now_ts(),
            request_type: request_type.to_string(),
            request_summary: request_summary.to_string(),
            policy_version: doc.policy_version,
        };
        drop(doc);
        self.record(&decision);
        decision
    }

    fn record(&self, decision: &PolicyDecision) {
        let mut stats = self.stats.lock().expect("policy gate lock poisoned");
        stats.total_decisions += 1;
        if decision.result == PolicyResult::Denied {
            stats.denied_count += 1;
        }
        drop(stats);
        if let Err(e) = append_jsonl(&self.decision_log_path, decision) {
            tracing::warn!(error = %e, "failed to append policy decision log entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allow_list_denies_everything() {
        let dir = tempfile::tempdir().unwrap();
        let gate = PolicyGate::open(dir.path(), None);
        let decision = gate.evaluate("agent_dispatch", "dispatch agent1");
        assert_eq!(decision.result, PolicyResult::Denied);
        assert_eq!(gate.stats().denied_count, 1);
    }

    #[test]
    fn configure_bumps_version_and_allows_matching_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let gate = PolicyGate::open(dir.path(), None);
        let v1 = gate
            .configure(vec![AllowPattern { request_type: "agent_dispatch".into(), summary_pattern: None }])
            .unwrap();
        assert_eq!(v1, 1);
        let decision = gate.evaluate("agent_dispatch", "anything");
        assert_eq!(decision.result, PolicyResult::Allowed);
        assert_eq!(decision.policy_version, 1);
    }

    #[test]
    fn glob_wildcard_matches_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let gate = PolicyGate::open(dir.path(), None);
        gate.configure(vec![AllowPattern { request_type: "triage_*".into(), summary_pattern: None }])
            .unwrap();
        assert_eq!(gate.evaluate("triage_phase_a", "x").result, PolicyResult::Allowed);
        assert_eq!(gate.evaluate("scheduler_dispatch", "x").result, PolicyResult::Denied);
    }

    #[test]
    fn decision_log_persists_every_decision() {
        let dir = tempfile::tempdir().unwrap();
        let gate = PolicyGate::open(dir.path(), None);
        gate.evaluate("a", "b");
        gate.evaluate("c", "d");
        let log = dir.path().join("policies").join("decisions.jsonl");
        let text = std::fs::read_to_string(log).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
