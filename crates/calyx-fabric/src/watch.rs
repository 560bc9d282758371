//! Design Note (spec §9): layer a typed in-process event channel on top of
//! the outgoing/queue directories so the Scheduler and Bridge Pulse
//! Controller do not poll. Backed by `notify`, translated into a small
//! typed enum so downstream components never see raw filesystem events.

use crate::error::FabricError;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// A filesystem change under a watched directory, coarsened to the shape
/// the fabric's consumers actually care about.
#[derive(Debug, Clone)]
pub enum FabricEvent {
    /// A heartbeat (`*.lock`) file was created or overwritten.
    HeartbeatWritten(PathBuf),
    /// Any other file under the watched tree was created or modified.
    FileChanged(PathBuf),
    /// A file under the watched tree was removed.
    FileRemoved(PathBuf),
}

/// Starts watching `dir` (non-recursive by default) and returns a receiver
/// of coarsened `FabricEvent`s plus the `notify::Watcher` the caller must
/// keep alive for the lifetime of the subscription.
pub fn watch_dir(dir: &Path) -> Result<(mpsc::UnboundedReceiver<FabricEvent>, RecommendedWatcher), FabricError> {
    std::fs::create_dir_all(dir)?;
    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let event = match res {
            Ok(e) => e,
            Err(_) => return,
        };
        for path in event.paths {
            let mapped = match event.kind {
                notify::EventKind::Remove(_) => FabricEvent::FileRemoved(path.clone()),
                notify::EventKind::Create(_) | notify::EventKind::Modify(_) => {
                    if path.extension().and_then(|e| e.to_str()) == Some("lock") {
                        FabricEvent::HeartbeatWritten(path.clone())
                    } else {
                        FabricEvent::FileChanged(path.clone())
                    }
                }
                _ => continue,
            };
            let _ = tx.send(mapped);
        }
    })
    .map_err(|e| FabricError::Watch(e.to_string()))?;
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| FabricError::Watch(e.to_string()))?;
    Ok((rx, watcher))
}
