//! Appends samples to `logs/system_snapshots.jsonl` (spec §6), reusing the
//! Artifact Store's append-only JSONL writer rather than rolling a second
//! one here.

use crate::snapshot::SystemSnapshot;
use calyx_fabric::FabricError;
use std::path::Path;

pub fn append_snapshot(path: &Path, snapshot: &SystemSnapshot) -> Result<(), FabricError> {
    calyx_fabric::append_jsonl(path, snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Probe;

    #[test]
    fn appends_one_line_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system_snapshots.jsonl");
        let probe = Probe::new();
        append_snapshot(&path, &probe.sample()).unwrap();
        append_snapshot(&path, &probe.sample()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
