//! Capability registry (spec §4.11 `RegisterCapability`): each agent
//! declares its capability tags at registration; the bus dispatches by tag
//! rather than by reflecting over an agent registry (Design Note, spec §9).

use calyx_core::entities::CapabilityEntry;
use calyx_fabric::write_atomic_json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Live registry of `agent_id -> CapabilityEntry`, persisted to a single
/// atomically-replaced JSON document under `outgoing/` so every component
/// can read it without locking.
pub struct CapabilityRegistry {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, CapabilityEntry>>,
}

impl CapabilityRegistry {
    pub fn open(outgoing_dir: &Path) -> Self {
        let path = outgoing_dir.join("policies").join("capabilities.json");
        let entries = std::fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<BTreeMap<String, CapabilityEntry>>(&bytes).ok())
            .unwrap_or_default();
        Self { path, entries: RwLock::new(entries) }
    }

    /// Registers (or re-registers) an agent's capability tags, refreshing
    /// `last_seen`.
    pub fn register(&self, agent_id: &str, capabilities: Vec<String>) -> Result<(), calyx_fabric::FabricError> {
        let mut entries = self.entries.write().expect("capability registry lock poisoned");
        entries.insert(
            agent_id.to_string(),
            CapabilityEntry { agent_id: agent_id.to_string(), capabilities, last_seen: calyx_core::time::now_ts() },
        );
        write_atomic_json(&self.path, &*entries)
    }

    pub fn get(&self, agent_id: &str) -> Option<CapabilityEntry> {
        self.entries.read().expect("capability registry lock poisoned").get(agent_id).cloned()
    }

    /// Every agent currently registered with `tag` among its capabilities.
    pub fn agents_with_capability(&self, tag: &str) -> Vec<String> {
        self.entries
            .read()
            .expect("capability registry lock poisoned")
            .values()
            .filter(|e| e.capabilities.iter().any(|c| c == tag))
            .map(|e| e.agent_id.clone())
            .collect()
    }

    pub fn all(&self) -> Vec<CapabilityEntry> {
        self.entries.read().expect("capability registry lock poisoned").values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup_by_capability() {
        let dir = tempfile::tempdir().unwrap();
        let registry = CapabilityRegistry::open(dir.path());
        registry.register("agent1", vec!["benchmarks".to_string(), "ddm".to_string()]).unwrap();
        registry.register("agent2", vec!["benchmarks".to_string()]).unwrap();
        let mut agents = registry.agents_with_capability("benchmarks");
        agents.sort();
        assert_eq!(agents, vec!["agent1".to_string(), "agent2".to_string()]);
        assert!(registry.agents_with_capability("ddm").contains(&"agent1".to_string()));
    }

    #[test]
    fn reopening_loads_persisted_entries() {
        let dir = tempfile::tempdir().unwrap();
        {
            let registry = CapabilityRegistry::open(dir.path());
            registry.register("agent1", vec!["memory_probe".to_string()]).unwrap();
        }
        let reopened = CapabilityRegistry::open(dir.path());
        assert!(reopened.get("agent1").is_some());
    }
}
