//! Station Calyx Policy Gate (C4) and Lease & Cosignature Manager (C5).

pub mod gate;
pub mod lease;

pub use gate::{AllowPattern, PolicyDocument, PolicyGate, PolicyStats};
pub use lease::{LeaseManager, VerifyResult, DEFAULT_HUMAN_SIG_TIMEOUT_SECS};
