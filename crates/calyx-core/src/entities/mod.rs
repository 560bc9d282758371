//! On-disk entity schemas shared across Station Calyx (spec §3).
//!
//! Every type here accepts unknown keys on deserialize (forward
//! compatibility) and is written with `serde_json::to_string` /
//! `to_string_pretty` by the owning component only.

pub mod bridge_pulse;
pub mod capability;
pub mod heartbeat;
pub mod intent;
pub mod lease;
pub mod policy;
pub mod query;
pub mod run_record;
pub mod verdict;

pub use bridge_pulse::{BridgePulseEvent, PulseOutcome};
pub use capability::CapabilityEntry;
pub use heartbeat::{Freshness, Heartbeat, HeartbeatStatus};
pub use intent::{ChangeSetMetadata, Intent, IntentStatus, IntentType, RiskLevel};
pub use lease::{Cosignature, CosignerRole, Lease, LeaseLimits, LeaseStatus};
pub use policy::{PolicyDecision, PolicyResult};
pub use query::{Query, QueryPriority, QueryResponse, QueryStatus, QueryTarget};
pub use run_record::{
    graduated_stability, AutonomyMode, RunRecord, RunStatus, RUN_RECORD_CSV_HEADERS,
    RUN_RECORD_SCHEMA_VERSION,
};
pub use verdict::{Verdict, VerdictResult};
