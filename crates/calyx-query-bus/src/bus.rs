//! Cross-agent ask/respond (spec §4.11): one JSON file per query under
//! `outgoing/queries/<id>.json`, one per response under
//! `outgoing/responses/<id>.json` (spec §6). Queries past their timeout are
//! marked expired by any reader — never auto-deleted.

use crate::registry::CapabilityRegistry;
use calyx_core::entities::{Query, QueryPriority, QueryResponse, QueryStatus, QueryTarget};
use calyx_fabric::write_atomic_json;
use std::path::{Path, PathBuf};

pub struct QueryBus {
    queries_dir: PathBuf,
    responses_dir: PathBuf,
}

/// Per-agent read filter (spec §4.11 `FilterFor`): which channels an agent
/// reads, which senders it accepts from, and which it ignores. A capability
/// broadcast is a channel of its own (the tag), separate from an agent's
/// direct-addressed channel.
#[derive(Debug, Clone)]
pub struct AgentFilter {
    pub channels_read: Vec<String>,
    pub senders_allowed: Vec<String>,
    pub ignored: Vec<String>,
}

impl QueryBus {
    pub fn open(outgoing_dir: &Path) -> Self {
        Self {
            queries_dir: outgoing_dir.join("queries"),
            responses_dir: outgoing_dir.join("responses"),
        }
    }

    fn query_path(&self, id: &str) -> PathBuf {
        self.queries_dir.join(format!("{id}.json"))
    }

    fn response_path(&self, id: &str) -> PathBuf {
        self.responses_dir.join(format!("{id}.json"))
    }

    /// Creates a query addressed either to a specific agent or broadcast to
    /// every agent registered with a capability tag (spec §4.11 "Matching").
    pub fn create_query(
        &self,
        from: &str,
        to: QueryTarget,
        question: &str,
        priority: QueryPriority,
        timeout_s: u64,
    ) -> Result<Query, calyx_fabric::FabricError> {
        let query = Query {
            id: Query::new_id(),
            from: from.to_string(),
            to,
            question: question.to_string(),
            priority,
            created: calyx_core::time::now_ts(),
            status: QueryStatus::Pending,
            timeout_s,
        };
        write_atomic_json(&self.query_path(&query.id), &query)?;
        Ok(query)
    }

    pub fn load_query(&self, id: &str) -> Result<Option<Query>, calyx_fabric::FabricError> {
        let path = self.query_path(id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&std::fs::read(path)?)?))
    }

    /// Answers a query, writing the response artifact and marking the
    /// query `answered` if it has not already expired.
    pub fn respond_to_query(
        &self,
        query_id: &str,
        from: &str,
        answer: &str,
        evidence_refs: Vec<String>,
    ) -> Result<QueryResponse, calyx_fabric::FabricError> {
        let response = QueryResponse { query_id: query_id.to_string(), from: from.to_string(), answer: answer.to_string(), evidence_refs };
        write_atomic_json(&self.response_path(query_id), &response)?;
        if let Some(mut query) = self.load_query(query_id)? {
            if query.status == QueryStatus::Pending {
                query.status = QueryStatus::Answered;
                write_atomic_json(&self.query_path(query_id), &query)?;
            }
        }
        Ok(response)
    }

    pub fn load_response(&self, query_id: &str) -> Result<Option<QueryResponse>, calyx_fabric::FabricError> {
        let path = self.response_path(query_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&std::fs::read(path)?)?))
    }

    /// Marks `query_id` expired if `now` is past its timeout and it is
    /// still pending. Any reader may observe and perform this transition;
    /// it never deletes the record (spec §4.11 "Timeouts").
    pub fn expire_if_due(&self, query_id: &str, now: f64) -> Result<Option<Query>, calyx_fabric::FabricError> {
        let Some(mut query) = self.load_query(query_id)? else { return Ok(None) };
        if query.status == QueryStatus::Pending && query.is_expired_at(now) {
            query.status = QueryStatus::Expired;
            write_atomic_json(&self.query_path(query_id), &query)?;
        }
        Ok(Some(query))
    }

    /// Resolves which agents a query's target addresses: a single agent, or
    /// every agent the registry currently has registered under the tag.
    pub fn resolve_target(&self, target: &QueryTarget, registry: &CapabilityRegistry) -> Vec<String> {
        match target {
            QueryTarget::Agent { agent_id } => vec![agent_id.clone()],
            QueryTarget::Capability { tag } => registry.agents_with_capability(tag),
        }
    }
}

/// Builds the read filter for `agent_id` (spec §4.11 `FilterFor`): it reads
/// its own direct channel plus one channel per capability tag it declared,
/// accepts senders from the registry, and ignores everyone else.
pub fn filter_for(agent_id: &str, registry: &CapabilityRegistry) -> AgentFilter {
    let own_capabilities = registry.get(agent_id).map(|e| e.capabilities).unwrap_or_default();
    let mut channels_read = vec![agent_id.to_string()];
    channels_read.extend(own_capabilities);
    let senders_allowed: Vec<String> = registry.all().into_iter().map(|e| e.agent_id).filter(|id| id != agent_id).collect();
    AgentFilter { channels_read, senders_allowed, ignored: Vec::new() }
}
