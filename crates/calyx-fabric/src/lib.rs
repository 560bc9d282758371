//! Station Calyx fabric layer: Heartbeat Fabric (C1) and Artifact Store (C2).

pub mod artifact;
pub mod error;
pub mod heartbeat;
pub mod watch;

pub use artifact::{append_csv, append_jsonl, read_tail, rotation_hint, write_atomic_json, RotationHint};
pub use error::FabricError;
pub use heartbeat::{freshness, heartbeat_path, read_heartbeat, write_heartbeat, DEFAULT_STALENESS_TTL_SECS};
pub use watch::{watch_dir, FabricEvent};
