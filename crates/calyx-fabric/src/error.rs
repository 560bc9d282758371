//! Fabric-local error type, folded into `CalyxError` at the crate boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FabricError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("watch error: {0}")]
    Watch(String),
}

impl From<FabricError> for calyx_core::CalyxError {
    fn from(e: FabricError) -> Self {
        match e {
            FabricError::Io(io) => calyx_core::CalyxError::TransientIo(io),
            FabricError::Json(j) => calyx_core::CalyxError::Serde(j),
            FabricError::Csv(c) => calyx_core::CalyxError::InvariantViolation(c.to_string()),
            FabricError::Watch(s) => calyx_core::CalyxError::InvariantViolation(s),
        }
    }
}
