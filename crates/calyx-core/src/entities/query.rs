//! Query (spec §3) — cross-agent ask, handled by the Query Bus (C11).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Pending,
    Answered,
    Expired,
}

/// A query target: either a specific agent, or a capability tag broadcast
/// to every registered agent with that tag (spec §4.11 "Matching").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum QueryTarget {
    Agent { agent_id: String },
    Capability { tag: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub id: String,
    pub from: String,
    pub to: QueryTarget,
    pub question: String,
    pub priority: QueryPriority,
    pub created: f64,
    pub status: QueryStatus,
    pub timeout_s: u64,
}

impl Query {
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// A query is expired once `created + timeout_s` has passed; any reader
    /// may observe and mark this (spec §4.11 "Timeouts" — never auto-deleted).
    pub fn is_expired_at(&self, now: f64) -> bool {
        now > self.created + self.timeout_s as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query_id: String,
    pub from: String,
    pub answer: String,
    #[serde(default)]
    pub evidence_refs: Vec<String>,
}
