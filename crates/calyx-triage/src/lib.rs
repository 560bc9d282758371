//! Station Calyx: Triage Orchestrator (C8).
//!
//! Runs proposed [`Intent`]s through a three-phase pipeline — propose
//! (Phase A), review (Phase B), stability (Phase C) — and routes the
//! intent's status accordingly (spec §4.8).

pub mod error;
pub mod pipeline;
pub mod review;
pub mod runner;
pub mod stability;
pub mod subprocess;

pub use error::TriageError;
pub use pipeline::{run_intent, DeploymentEvent, TriageOutcome, DEPLOYMENT_EVENTS_FILE, ORCHESTRATOR_VERSION};
pub use review::{compute_signature, run_phase_b, ReviewReport, Reviewer, SecretScanner, TestIntegrityChecker};
pub use runner::{new_run_dir, AgentRunner, PhaseAResult, SubprocessAgentRunner};
pub use stability::{run_phase_c, StabilityReport};
pub use subprocess::{run_with_timeout, ProcOutcome, ENVELOPE_BYTES};
