//! Policy Decision (spec §3) — one per execution request.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyResult {
    Allowed,
    Denied,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub result: PolicyResult,
    pub reason: String,
    pub timestamp: f64,
    pub request_type: String,
    pub request_summary: String,
    pub policy_version: u64,
}
