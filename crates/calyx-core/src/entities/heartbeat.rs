//! Heartbeat Record (spec §3) — one per component, the common header that
//! is stable across every component plus a per-component `extra` payload.
//!
//! Per the Design Notes (spec §9) on replacing the free-form dict `extra`
//! with a tagged union: the common header fields are a normal struct, and
//! `extra` is a `serde_json::Value` object so forward-compatible unknown
//! keys round-trip untouched, with typed accessors layered on top for the
//! keys this system actually writes (`status_message`, `open_path`,
//! `summary`, `metrics`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Lifecycle status a heartbeat can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatStatus {
    Running,
    Done,
    Warn,
    Error,
    Idle,
    Paused,
}

/// One heartbeat record, as written atomically by its sole owning component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    /// Stable, lowercase component id (e.g. "scheduler", "cp9", "agent1").
    pub id: String,
    /// OS process id of the writer.
    pub pid: u32,
    /// Monotonic wall time of last write (seconds, float).
    pub ts: f64,
    /// ISO-8601 UTC equivalent of `ts`.
    pub iso: String,
    /// Free-form short phase tag (e.g. "launch", "probe", "done").
    pub phase: String,
    pub status: HeartbeatStatus,
    /// Component implementation version tag.
    pub version: String,
    /// Component-specific keys. Unknown keys round-trip unchanged.
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
    /// Set by the reader (never written to disk) when parsing required a
    /// lenient fallback — e.g. truncation during a concurrent rename, or a
    /// BOM-prefixed file.
    #[serde(skip_serializing, default)]
    pub validation_warning: Option<String>,
}

impl Heartbeat {
    pub fn new(id: impl Into<String>, phase: impl Into<String>, status: HeartbeatStatus, version: impl Into<String>) -> Self {
        let ts = crate::time::now_ts();
        Self {
            id: id.into(),
            pid: std::process::id(),
            ts,
            iso: crate::time::ts_to_iso(ts),
            phase: phase.into(),
            status,
            version: version.into(),
            extra: BTreeMap::new(),
            validation_warning: None,
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.extra.insert(key.into(), v);
        }
        self
    }

    pub fn with_status_message(self, msg: impl Into<String>) -> Self {
        self.with_extra("status_message", Value::String(msg.into()))
    }

    pub fn status_message(&self) -> Option<&str> {
        self.extra.get("status_message").and_then(|v| v.as_str())
    }

    /// Re-stamps `ts`/`iso` to "now", preserving every other field. Used by
    /// writers that reuse one `Heartbeat` across ticks.
    pub fn touch(&mut self) {
        self.ts = crate::time::now_ts();
        self.iso = crate::time::ts_to_iso(self.ts);
    }
}

/// Result of a freshness check (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Fresh,
    Stale,
    Missing,
}

impl Heartbeat {
    /// Freshness relative to `now`, given a TTL in seconds (spec §4.1:
    /// "fresh" iff `now - ts <= ttl`).
    pub fn freshness_at(&self, now: f64, ttl_secs: f64) -> Freshness {
        if now - self.ts <= ttl_secs {
            Freshness::Fresh
        } else {
            Freshness::Stale
        }
    }
}
