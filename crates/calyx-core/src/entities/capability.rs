//! Capability Entry (spec §3) — registry of which agent answers which queries.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityEntry {
    pub agent_id: String,
    pub capabilities: Vec<String>,
    pub last_seen: f64,
}
