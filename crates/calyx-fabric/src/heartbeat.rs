//! C1 Heartbeat Fabric: atomic write / tolerant read / freshness.
//!
//! Invariant (spec §4.1): the writer is the sole mutator of its heartbeat
//! file; readers never lock. `WriteHeartbeat` writes to a temp file in the
//! same directory and renames over the target so a concurrent reader never
//! observes a partial write — the same `tmp` + `os.replace` idiom the
//! original `triage_orchestrator.py` / `svc_supervisor.py` tools use.

use calyx_core::entities::{Freshness, Heartbeat};
use calyx_core::CalyxError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default staleness TTL (spec §3): 120 seconds.
pub const DEFAULT_STALENESS_TTL_SECS: f64 = 120.0;

/// `outgoing/<name>.lock` path for a component under the given root.
pub fn heartbeat_path(outgoing_dir: &Path, name: &str) -> PathBuf {
    outgoing_dir.join(format!("{name}.lock"))
}

/// Atomically writes a heartbeat: serialize -> write temp file -> rename.
///
/// Fails with `CalyxError::TransientIo` on permission errors; never leaves
/// a partially-written target file because the final step is a single
/// rename syscall.
pub fn write_heartbeat(outgoing_dir: &Path, hb: &Heartbeat) -> Result<(), CalyxError> {
    std::fs::create_dir_all(outgoing_dir)?;
    let target = heartbeat_path(outgoing_dir, &hb.id);
    let tmp = outgoing_dir.join(format!(".{}.lock.tmp-{}", hb.id, std::process::id()));
    let body = serde_json::to_string_pretty(hb)?;
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, &target)?;
    Ok(())
}

/// Reads the most recently written heartbeat for `name`.
///
/// Tolerant of a UTF-8 BOM and of truncation mid-rename: on a parse
/// failure the read is retried a few times with a short sleep (the writer's
/// rename is a single syscall, so a truncated read only ever happens inside
/// a narrow race window). If every retry fails, returns a `Heartbeat` with
/// `validation_warning` set rather than erroring, per spec §4.1.
pub fn read_heartbeat(outgoing_dir: &Path, name: &str) -> Result<Option<Heartbeat>, CalyxError> {
    let path = heartbeat_path(outgoing_dir, name);
    if !path.exists() {
        return Ok(None);
    }
    const RETRIES: u32 = 3;
    let mut last_err: Option<String> = None;
    for attempt in 0..=RETRIES {
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) => {
                if attempt == RETRIES {
                    return Err(CalyxError::TransientIo(e));
                }
                std::thread::sleep(Duration::from_millis(20));
                continue;
            }
        };
        let text = strip_bom(&bytes);
        match serde_json::from_str::<Heartbeat>(text) {
            Ok(mut hb) => {
                hb.validation_warning = None;
                return Ok(Some(hb));
            }
            Err(e) => {
                last_err = Some(e.to_string());
                if attempt == RETRIES {
                    break;
                }
                std::thread::sleep(Duration::from_millis(20));
            }
        }
    }
    // Every retry failed to parse cleanly — surface a degraded record
    // rather than erroring, matching "tolerate truncation" in spec §4.1.
    let placeholder = Heartbeat {
        id: name.to_string(),
        pid: 0,
        ts: 0.0,
        iso: String::new(),
        phase: "unknown".to_string(),
        status: calyx_core::entities::HeartbeatStatus::Error,
        version: "unknown".to_string(),
        extra: Default::default(),
        validation_warning: last_err,
    };
    Ok(Some(placeholder))
}

fn strip_bom(bytes: &[u8]) -> &str {
    let no_bom = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    std::str::from_utf8(no_bom).unwrap_or("")
}

/// Freshness of `name`'s heartbeat relative to now, using `ttl_secs`.
pub fn freshness(outgoing_dir: &Path, name: &str, ttl_secs: f64, now: f64) -> Result<Freshness, CalyxError> {
    match read_heartbeat(outgoing_dir, name)? {
        None => Ok(Freshness::Missing),
        Some(hb) => Ok(hb.freshness_at(now, ttl_secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calyx_core::entities::HeartbeatStatus;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let hb = Heartbeat::new("scheduler", "probe", HeartbeatStatus::Running, "1.0.0");
        write_heartbeat(dir.path(), &hb).unwrap();
        let read = read_heartbeat(dir.path(), "scheduler").unwrap().unwrap();
        assert_eq!(read.id, hb.id);
        assert_eq!(read.phase, hb.phase);
        assert!(read.validation_warning.is_none());
    }

    #[test]
    fn missing_heartbeat_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_heartbeat(dir.path(), "nope").unwrap().is_none());
    }

    #[test]
    fn freshness_classifies_stale_and_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let mut hb = Heartbeat::new("scheduler", "probe", HeartbeatStatus::Running, "1.0.0");
        hb.ts = 1000.0;
        hb.iso = calyx_core::time::ts_to_iso(hb.ts);
        write_heartbeat(dir.path(), &hb).unwrap();
        assert_eq!(freshness(dir.path(), "scheduler", 120.0, 1050.0).unwrap(), Freshness::Fresh);
        assert_eq!(freshness(dir.path(), "scheduler", 120.0, 2000.0).unwrap(), Freshness::Stale);
        assert_eq!(freshness(dir.path(), "missing", 120.0, 1050.0).unwrap(), Freshness::Missing);
    }

    #[test]
    fn read_tolerates_bom() {
        let dir = tempfile::tempdir().unwrap();
        let hb = Heartbeat::new("scheduler", "probe", HeartbeatStatus::Running, "1.0.0");
        let mut body = vec![0xEF, 0xBB, 0xBF];
        body.extend_from_slice(serde_json::to_string(&hb).unwrap().as_bytes());
        std::fs::write(heartbeat_path(dir.path(), "scheduler"), body).unwrap();
        let read = read_heartbeat(dir.path(), "scheduler").unwrap().unwrap();
        assert_eq!(read.id, "scheduler");
        assert!(read.validation_warning.is_none());
    }
}
