//! Intent / Proposal (spec §3) — consumed by the Triage Orchestrator (C8).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    CodeChange,
    ConfigChange,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    UnderReview,
    ApprovedPendingHuman,
    Rejected,
    Superseded,
}

impl IntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStatus::UnderReview => "under_review",
            IntentStatus::ApprovedPendingHuman => "approved_pending_human",
            IntentStatus::Rejected => "rejected",
            IntentStatus::Superseded => "superseded",
        }
    }
}

/// A proposed change awaiting triage (spec §3 "Intent / Proposal").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub intent_id: String,
    pub proposed_by: String,
    #[serde(rename = "type")]
    pub intent_type: IntentType,
    pub goal: String,
    pub change_set: Vec<String>,
    pub risk_level: RiskLevel,
    pub rollback_plan: String,
    pub reviewers: Vec<String>,
    #[serde(default)]
    pub tests_reference: Option<Vec<String>>,
    pub status: IntentStatus,
}

impl Intent {
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }
}

/// Per-intent artifact metadata (`metadata.json` alongside `change.patch`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSetMetadata {
    pub lines_added: u32,
    pub lines_removed: u32,
    pub files_changed: Vec<String>,
}
