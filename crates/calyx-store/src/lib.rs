//! C3 Experience Store: embedded relational store of bridge pulses, their
//! context and outcome, recall, and retention compaction.
//!
//! Grounded in the teacher's `ChronosSqlite` (rusqlite, one physical file,
//! schema created with `CREATE TABLE IF NOT EXISTS` at open time). Writes
//! go through a single `Mutex<Connection>` rather than one connection per
//! call: this component has exactly one writer (Bridge Pulse Controller),
//! and serializing through a mutex avoids `SQLITE_BUSY` entirely instead of
//! relying on SQLite's own file-lock retry.

pub mod error;
pub mod similarity;

use calyx_core::entities::BridgePulseEvent;
pub use error::StoreError;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Default retention window for `Compact` (spec §4.3 / §3 Bridge Pulse Event
/// Lifecycle: "may be retained ≤30 days then compacted").
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// A row recalled from the store, with its ranking score when it came from
/// `recall`.
#[derive(Debug, Clone, Serialize)]
pub struct RecalledEvent {
    pub event_id: String,
    pub pulse: BridgePulseEvent,
    pub score: f64,
}

/// Outcome of a `compact` pass.
#[derive(Debug, Clone, Serialize)]
pub struct CompactReport {
    pub deleted: u64,
    pub remaining: u64,
    pub checksum: String,
}

pub struct ExperienceStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl ExperienceStore {
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("experience store mutex poisoned");
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS event (
                event_id    TEXT PRIMARY KEY,
                pulse_id    TEXT NOT NULL UNIQUE,
                timestamp   TEXT NOT NULL,
                summary     TEXT NOT NULL,
                outcome     TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_event_timestamp ON event(timestamp);

            CREATE TABLE IF NOT EXISTS context (
                event_id        TEXT PRIMARY KEY REFERENCES event(event_id) ON DELETE CASCADE,
                cpu_pct         REAL NOT NULL,
                ram_pct         REAL NOT NULL,
                gpu_pct         REAL,
                capacity_score  REAL NOT NULL,
                autonomy_mode   TEXT NOT NULL,
                active_agents   INTEGER NOT NULL,
                gates_state_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS outcome (
                event_id              TEXT PRIMARY KEY REFERENCES event(event_id) ON DELETE CASCADE,
                tes_score             REAL,
                stability             REAL,
                velocity              REAL,
                footprint             REAL,
                uptime_24h            REAL,
                policy_violations     INTEGER NOT NULL,
                manual_interventions  INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS confidence (
                event_id          TEXT PRIMARY KEY REFERENCES event(event_id) ON DELETE CASCADE,
                confidence_delta  REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS db_metadata (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Transactionally inserts event + context + outcome (+ confidence, if
    /// present) for one pulse, returning the generated `event_id`.
    pub fn record_bridge_pulse(&self, pulse: &BridgePulseEvent) -> Result<String, StoreError> {
        let event_id = Uuid::new_v4().to_string();
        let mut conn = self.conn.lock().expect("experience store mutex poisoned");
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO event (event_id, pulse_id, timestamp, summary, outcome) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![event_id, pulse.pulse_id, pulse.timestamp, pulse.summary, pulse.outcome.as_str()],
        )?;
        let gates_json = serde_json::to_string(&pulse.gates_state)?;
        tx.execute(
            "INSERT INTO context (event_id, cpu_pct, ram_pct, gpu_pct, capacity_score, autonomy_mode, active_agents, gates_state_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event_id,
                pulse.cpu_pct,
                pulse.ram_pct,
                pulse.gpu_pct,
                pulse.capacity_score,
                pulse.autonomy_mode,
                pulse.active_agents,
                gates_json,
            ],
        )?;
        tx.execute(
            "INSERT INTO outcome (event_id, tes_score, stability, velocity, footprint, uptime_24h, policy_violations, manual_interventions)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event_id,
                pulse.tes_score,
                pulse.stability,
                pulse.velocity,
                pulse.footprint,
                pulse.uptime_24h,
                pulse.policy_violations,
                pulse.manual_interventions,
            ],
        )?;
        if let Some(delta) = pulse.confidence_delta {
            tx.execute(
                "INSERT INTO confidence (event_id, confidence_delta) VALUES (?1, ?2)",
                params![event_id, delta],
            )?;
        }
        tx.commit()?;
        Ok(event_id)
    }

    fn row_to_pulse(row: &rusqlite::Row) -> rusqlite::Result<(String, BridgePulseEvent)> {
        let event_id: String = row.get("event_id")?;
        let gates_json: String = row.get("gates_state_json")?;
        let gates_state = serde_json::from_str(&gates_json).unwrap_or_default();
        let outcome_str: String = row.get("outcome")?;
        let outcome = match outcome_str.as_str() {
            "success" => calyx_core::entities::PulseOutcome::Success,
            "warn" => calyx_core::entities::PulseOutcome::Warn,
            "fail" => calyx_core::entities::PulseOutcome::Fail,
            _ => calyx_core::entities::PulseOutcome::Info,
        };
        let pulse = BridgePulseEvent {
            pulse_id: row.get("pulse_id")?,
            timestamp: row.get("timestamp")?,
            summary: row.get("summary")?,
            cpu_pct: row.get("cpu_pct")?,
            ram_pct: row.get("ram_pct")?,
            gpu_pct: row.get("gpu_pct")?,
            capacity_score: row.get("capacity_score")?,
            autonomy_mode: row.get("autonomy_mode")?,
            active_agents: row.get("active_agents")?,
            gates_state,
            tes_score: row.get("tes_score")?,
            stability: row.get("stability")?,
            velocity: row.get("velocity")?,
            footprint: row.get("footprint")?,
            uptime_24h: row.get("uptime_24h")?,
            policy_violations: row.get("policy_violations")?,
            manual_interventions: row.get("manual_interventions")?,
            confidence_delta: None,
            outcome,
        };
        Ok((event_id, pulse))
    }

    const JOIN_SELECT: &'static str = "
        SELECT e.event_id, e.pulse_id, e.timestamp, e.summary, e.outcome,
               c.cpu_pct, c.ram_pct, c.gpu_pct, c.capacity_score, c.autonomy_mode,
               c.active_agents, c.gates_state_json,
               o.tes_score, o.stability, o.velocity, o.footprint, o.uptime_24h,
               o.policy_violations, o.manual_interventions
        FROM event e
        JOIN context c ON c.event_id = e.event_id
        JOIN outcome o ON o.event_id = e.event_id";

    /// Ranks events by ngram similarity of `objective` against `summary`,
    /// keeping only those scoring at least `threshold`, highest first.
    pub fn recall(&self, objective: &str, threshold: f64, max_results: usize) -> Result<Vec<RecalledEvent>, StoreError> {
        let conn = self.conn.lock().expect("experience store mutex poisoned");
        let mut stmt = conn.prepare(Self::JOIN_SELECT)?;
        let rows = stmt.query_map([], Self::row_to_pulse)?;
        let mut scored = Vec::new();
        for row in rows {
            let (event_id, pulse) = row?;
            let score = similarity::ngram_similarity(objective, &pulse.summary);
            if score >= threshold {
                scored.push(RecalledEvent { event_id, pulse, score });
            }
        }
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(max_results);
        Ok(scored)
    }

    /// All events from the last `hours`, most recent first, capped at `limit`.
    pub fn recent_events(&self, hours: f64, limit: usize) -> Result<Vec<RecalledEvent>, StoreError> {
        let conn = self.conn.lock().expect("experience store mutex poisoned");
        let query = format!("{} ORDER BY e.timestamp DESC", Self::JOIN_SELECT);
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], Self::row_to_pulse)?;
        let cutoff = chrono::Utc::now() - chrono::Duration::seconds((hours * 3600.0) as i64);
        let mut out = Vec::new();
        for row in rows {
            let (event_id, pulse) = row?;
            let ts_ok = chrono::DateTime::parse_from_rfc3339(&pulse.timestamp)
                .map(|t| t.with_timezone(&chrono::Utc) >= cutoff)
                .unwrap_or(true);
            if ts_ok {
                out.push(RecalledEvent { event_id, pulse, score: 1.0 });
            }
            if out.len() >= limit {
                break;
            }
        }
        Ok(out)
    }

    /// Deletes events older than `retention_days`, vacuums, and refreshes
    /// `db_metadata.checksum`. Refuses (returning `Corrupted`) if an
    /// integrity check fails first, per spec §4.3 failure semantics.
    pub fn compact(&self, retention_days: u32) -> Result<CompactReport, StoreError> {
        let conn = self.conn.lock().expect("experience store mutex poisoned");
        let ok: String = conn.query_row("PRAGMA integrity_check", [], |r| r.get(0))?;
        if ok != "ok" {
            let last_good: Option<String> = conn
                .query_row("SELECT value FROM db_metadata WHERE key = 'checksum'", [], |r| r.get(0))
                .optional()?;
            return Err(StoreError::Corrupted(format!(
                "integrity_check failed ({ok}); last known-good checksum: {}",
                last_good.unwrap_or_else(|| "none".to_string())
            )));
        }
        let cutoff = chrono::Utc::now() - chrono::Duration::days(retention_days as i64);
        let cutoff_str = cutoff.to_rfc3339();
        let deleted = conn.execute("DELETE FROM event WHERE timestamp < ?1", params![cutoff_str])? as u64;
        conn.execute_batch("VACUUM;")?;
        let remaining: u64 = conn.query_row("SELECT COUNT(*) FROM event", [], |r| r.get::<_, i64>(0))? as u64;
        let checksum: String = conn.query_row("PRAGMA quick_check", [], |r| r.get(0))?;
        conn.execute(
            "INSERT INTO db_metadata (key, value) VALUES ('checksum', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![checksum],
        )?;
        Ok(CompactReport { deleted, remaining, checksum })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calyx_core::entities::PulseOutcome;
    use std::collections::BTreeMap;

    fn sample_pulse(pulse_id: &str, summary: &str, timestamp: &str) -> BridgePulseEvent {
        BridgePulseEvent {
            pulse_id: pulse_id.to_string(),
            timestamp: timestamp.to_string(),
            summary: summary.to_string(),
            cpu_pct: 10.0,
            ram_pct: 20.0,
            gpu_pct: None,
            capacity_score: 0.8,
            autonomy_mode: "tests".to_string(),
            active_agents: 2,
            gates_state: BTreeMap::new(),
            tes_score: Some(72.0),
            stability: Some(0.9),
            velocity: Some(0.5),
            footprint: Some(0.1),
            uptime_24h: Some(0.99),
            policy_violations: 0,
            manual_interventions: 0,
            confidence_delta: Some(0.01),
            outcome: PulseOutcome::Success,
        }
    }

    #[test]
    fn record_and_recall_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExperienceStore::open(dir.path().join("experience.sqlite")).unwrap();
        store
            .record_bridge_pulse(&sample_pulse("p1", "scheduler capacity dropped below floor", "2026-01-01T00:00:00+00:00"))
            .unwrap();
        store
            .record_bridge_pulse(&sample_pulse("p2", "unrelated telemetry note", "2026-01-01T00:05:00+00:00"))
            .unwrap();
        let hits = store.recall("capacity dropped", 0.1, 5).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].pulse.pulse_id, "p1");
    }

    #[test]
    fn compact_deletes_old_events_and_updates_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExperienceStore::open(dir.path().join("experience.sqlite")).unwrap();
        store.record_bridge_pulse(&sample_pulse("old", "stale pulse", "2000-01-01T00:00:00+00:00")).unwrap();
        store.record_bridge_pulse(&sample_pulse("new", "fresh pulse", &chrono::Utc::now().to_rfc3339())).unwrap();
        let report = store.compact(DEFAULT_RETENTION_DAYS).unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(report.remaining, 1);
        assert!(!report.checksum.is_empty());
    }

    #[test]
    fn duplicate_pulse_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExperienceStore::open(dir.path().join("experience.sqlite")).unwrap();
        store.record_bridge_pulse(&sample_pulse("dup", "first", "2026-01-01T00:00:00+00:00")).unwrap();
        let err = store.record_bridge_pulse(&sample_pulse("dup", "second", "2026-01-01T00:01:00+00:00"));
        assert!(err.is_err());
    }
}
