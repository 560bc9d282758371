//! C2 Artifact Store: append-only JSONL/CSV logs with rotation hints.
//!
//! Every write here is append-only; nothing in this module ever truncates
//! an existing file (spec §4.2 invariant). Rotation is advisory: callers
//! get a `RotationHint` back and decide when to roll a file aside.

use crate::error::FabricError;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Advisory rotation signal, derived from size/age thresholds. Never acted
/// on automatically — the caller (typically a daemon's maintenance tick)
/// decides whether and how to roll the file aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationHint {
    Ok,
    SizeExceeded,
    AgeExceeded,
}

/// Default rotation thresholds, mirroring the teacher's log-maintenance
/// defaults: roll past 10MB or 7 days old.
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

/// Atomically replaces `path` with the JSON serialization of `record`,
/// via a temp-file-then-rename in the same directory — the same pattern
/// [`crate::heartbeat::write_heartbeat`] uses, generalized to any on-disk
/// entity that is replaced wholesale rather than appended to (e.g. the
/// live policy document).
pub fn write_atomic_json<T: Serialize>(path: &Path, record: &T) -> Result<(), FabricError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let tmp = dir.join(format!(
        ".{}.tmp-{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("artifact"),
        std::process::id()
    ));
    let body = serde_json::to_string_pretty(record)?;
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Appends one JSON value as a line to `path`, creating parent directories
/// and the file itself as needed.
pub fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> Result<(), FabricError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    file.write_all(line.as_bytes())?;
    Ok(())
}

/// Appends one CSV row to `path`, writing `headers` first iff the file is
/// new or empty. `row` must already be in `headers` order.
pub fn append_csv(path: &Path, headers: &[&str], row: &[String]) -> Result<(), FabricError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let needs_header = !path.exists() || std::fs::metadata(path)?.len() == 0;
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if needs_header {
        writer.write_record(headers)?;
    }
    writer.write_record(row)?;
    writer.flush()?;
    Ok(())
}

/// Returns the last `n` lines of a JSONL file, parsed, oldest first. Lines
/// that fail to parse are skipped rather than aborting the whole read —
/// a single corrupt tail line should not hide the records around it.
pub fn read_tail<T: serde::de::DeserializeOwned>(path: &Path, n: usize) -> Result<Vec<T>, FabricError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines: Vec<String> = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        lines.push(line);
    }
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..]
        .iter()
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect())
}

/// Checks `path` against the given thresholds and reports a rotation hint.
/// A missing file is always `Ok`.
pub fn rotation_hint(path: &Path, max_bytes: u64, max_age_secs: u64) -> Result<RotationHint, FabricError> {
    let meta = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RotationHint::Ok),
        Err(e) => return Err(e.into()),
    };
    if meta.len() > max_bytes {
        return Ok(RotationHint::SizeExceeded);
    }
    if let Ok(modified) = meta.modified() {
        if let Ok(age) = modified.elapsed() {
            if age.as_secs() > max_age_secs {
                return Ok(RotationHint::AgeExceeded);
            }
        }
    }
    Ok(RotationHint::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Rec {
        n: u32,
    }

    #[test]
    fn append_then_tail_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        for n in 0..5 {
            append_jsonl(&path, &Rec { n }).unwrap();
        }
        let tail: Vec<Rec> = read_tail(&path, 2).unwrap();
        assert_eq!(tail, vec![Rec { n: 3 }, Rec { n: 4 }]);
    }

    #[test]
    fn tail_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tail: Vec<Rec> = read_tail(&dir.path().join("nope.jsonl"), 5).unwrap();
        assert!(tail.is_empty());
    }

    #[test]
    fn csv_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        append_csv(&path, &["a", "b"], &["1".into(), "2".into()]).unwrap();
        append_csv(&path, &["a", "b"], &["3".into(), "4".into()]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["a,b", "1,2", "3,4"]);
    }

    #[test]
    fn rotation_hint_flags_oversize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.jsonl");
        std::fs::write(&path, vec![0u8; 128]).unwrap();
        assert_eq!(rotation_hint(&path, 64, DEFAULT_MAX_AGE_SECS).unwrap(), RotationHint::SizeExceeded);
        assert_eq!(rotation_hint(&path, 256, DEFAULT_MAX_AGE_SECS).unwrap(), RotationHint::Ok);
    }
}
