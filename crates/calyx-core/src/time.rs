//! Monotonic-ish wall clock helpers shared by every component.
//!
//! All timestamps on disk are `f64` seconds since the epoch ("ts") with an
//! `iso` sibling field carrying the human-readable UTC equivalent, matching
//! the heartbeat shape fixed by the original `heartbeat_writer.py` /
//! `triage_orchestrator.py` tools.

use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall time in fractional seconds since the Unix epoch.
pub fn now_ts() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// ISO-8601 UTC rendering of a `now_ts()`-style timestamp.
pub fn ts_to_iso(ts: f64) -> String {
    let secs = ts.trunc() as i64;
    let nanos = ((ts.fract()) * 1_000_000_000.0) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap())
        .to_rfc3339()
}

/// ISO-8601 UTC timestamp for "now".
pub fn now_iso() -> String {
    ts_to_iso(now_ts())
}
