//! Error taxonomy shared by every Station Calyx component (spec §7).
//!
//! Each component defines its own narrower error enum where it helps the
//! caller (e.g. `calyx-policy::LeaseError`) and converts into `CalyxError`
//! at the component boundary, matching the teacher's use of `thiserror`
//! per-crate with `#[from]` conversions rather than one giant enum.

use thiserror::Error;

/// The component-agnostic error taxonomy from spec §7.
///
/// Only `InvariantViolation` is meant to ever be treated as fatal to its
/// owning component; every other variant is recovered at the lowest
/// enclosing boundary and surfaced via a heartbeat `status_message`.
#[derive(Debug, Error)]
pub enum CalyxError {
    /// Missing or invalid configuration. Never retried; surfaced to the operator.
    #[error("config error: {0}")]
    Config(String),

    /// Disk full, rename race, or similar — retried up to 3x with 50-200ms backoff.
    #[error("transient I/O error: {0}")]
    TransientIo(#[from] std::io::Error),

    /// A policy evaluation returned DENIED. Never raised past its boundary as
    /// an exception; callers inspect `PolicyDecision` instead. Kept here for
    /// components that need to fold a denial into a `Result`.
    #[error("policy denied: {reason}")]
    PolicyDenied { reason: String },

    /// A reviewer crashed or timed out; treated as verdict=FAIL, pipeline continues.
    #[error("reviewer failure: {0}")]
    ReviewerFailure(String),

    /// Capacity below the configured minimum; caller should defer, never kill.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Unexpected internal state. Fatal to the owning component (not the
    /// process group) — the supervisor is expected to restart it.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl CalyxError {
    /// Whether this error should be retried (TransientIo only, per spec §7).
    pub fn is_transient(&self) -> bool {
        matches!(self, CalyxError::TransientIo(_))
    }

    /// The heartbeat `status` this error should drive the writer toward.
    pub fn heartbeat_status(&self) -> &'static str {
        match self {
            CalyxError::InvariantViolation(_) => "error",
            _ => "warn",
        }
    }

    /// The uniform CLI exit code this error should surface as (spec §6):
    /// 1 domain failure, 2 bad usage / missing artifact, 3 internal
    /// precondition violated. Every add-on binary's `main` funnels its
    /// top-level `Result` through this rather than hand-rolling its own
    /// mapping per binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            CalyxError::PolicyDenied { .. } | CalyxError::ReviewerFailure(_) | CalyxError::ResourceExhausted(_) => 1,
            CalyxError::Config(_) | CalyxError::NotFound(_) => 2,
            CalyxError::TransientIo(_) | CalyxError::InvariantViolation(_) | CalyxError::Serde(_) => 3,
        }
    }
}

pub type CalyxResult<T> = Result<T, CalyxError>;
