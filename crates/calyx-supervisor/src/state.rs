//! Persisted supervisor state (spec §4.7), grounded on the original
//! `svc_supervisor.py` tool's `_load_state`/`_save_state` pair: a flat JSON
//! document keyed by service name, written through a temp-file-then-rename
//! so a crash between ticks never corrupts the file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceState {
    pub restart_times: Vec<f64>,
    #[serde(default)]
    pub backoff_until: f64,
    #[serde(default)]
    pub last_pid: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupervisorState {
    pub services: HashMap<String, ServiceState>,
}

impl SupervisorState {
    pub fn load(path: &Path) -> Self {
        std::fs::read(path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<(), calyx_fabric::FabricError> {
        calyx_fabric::write_atomic_json(path, self)
    }
}

/// Default path for the supervisor's own persisted state file (spec §6
/// places daemon state under `logs/`).
pub fn default_state_path(config: &calyx_core::CalyxConfig) -> PathBuf {
    config.logs_dir().join("supervisor_state.json")
}
