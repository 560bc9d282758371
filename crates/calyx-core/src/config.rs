//! Process-wide configuration loaded from the environment.
//!
//! Every binary calls [`CalyxConfig::from_env`] once at startup (after
//! `dotenvy::dotenv()`), following the teacher's `SovereignConfig::from_env`
//! convention: every field has a documented default and an env override,
//! and parsing never panics — invalid values fall back silently to the
//! default so a typo'd env var degrades rather than crashing the process.
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | CALYX_ROOT | `.` | Installation root; all relative paths in the filesystem layout (spec §6) resolve under this. |
//! | CALYX_LOAD_MODE | normal | `normal` \| `high_load` — tightens Scheduler guardrails. |
//! | CALYX_POLICY_VERSION | (unset) | Override for staging; when set, `Configure` starts policy_version at this value. |
//! | CALYX_HEARTBEAT_TTL_SECS | 120 | Default heartbeat staleness TTL. |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    Normal,
    HighLoad,
}

impl LoadMode {
    pub fn from_env_str(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("high_load") {
            LoadMode::HighLoad
        } else {
            LoadMode::Normal
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalyxConfig {
    /// `CALYX_ROOT`: installation root all filesystem-layout paths resolve under.
    pub root: PathBuf,
    /// `CALYX_LOAD_MODE`.
    pub load_mode: LoadMode,
    /// `CALYX_POLICY_VERSION`: optional override for the initial policy_version.
    pub policy_version_override: Option<u64>,
    /// `CALYX_HEARTBEAT_TTL_SECS`: default staleness TTL (spec §3, default 120s).
    pub heartbeat_ttl_secs: f64,
}

impl CalyxConfig {
    pub fn from_env() -> Self {
        let root = std::env::var("CALYX_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let load_mode = std::env::var("CALYX_LOAD_MODE")
            .map(|s| LoadMode::from_env_str(&s))
            .unwrap_or(LoadMode::Normal);
        let policy_version_override = std::env::var("CALYX_POLICY_VERSION")
            .ok()
            .and_then(|s| s.parse::<u64>().ok());
        let heartbeat_ttl_secs = env_f64("CALYX_HEARTBEAT_TTL_SECS", 120.0);

        Self {
            root,
            load_mode,
            policy_version_override,
            heartbeat_ttl_secs,
        }
    }

    /// Resolves a path relative to the configured root.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn outgoing_dir(&self) -> PathBuf {
        self.path("outgoing")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.path("logs")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.path("reports")
    }

    pub fn memory_dir(&self) -> PathBuf {
        self.path("memory")
    }
}

impl Default for CalyxConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_f64(name: &str, default: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(default)
}
