//! Station Calyx Bridge Pulse Controller (C10): macro/micro cadence health
//! assessment over capacity, TES, and uptime, report-first escalation to
//! the Experience Store (C3) and the Lease Manager (C5). Bridge never
//! grants itself authorization to act — it classifies, records, reports,
//! and on RED requests a lease for whatever an operator cosigns.

pub mod cadence;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod quiesce;
pub mod report;
pub mod status;

pub use cadence::{is_due, Cadence, MACRO_INTERVAL_SECS, MICRO_INTERVAL_SECS};
pub use controller::{assess, BridgeInputs, PulseAssessment, CORRECTIVE_LEASE_TIMEOUT_SECS};
pub use error::BridgeError;
pub use metrics::{mean_tes, uptime_24h};
pub use quiesce::{effective_status, is_quiesced, EffectiveStatus, MANUAL_SHUTDOWN_FLAG_NAME};
pub use report::{render, report_path, write_atomic_text};
pub use status::{classify, resource_level, PulseStatus, ResourceLevel};
