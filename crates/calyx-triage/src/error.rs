use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Fabric(#[from] calyx_fabric::FabricError),

    #[error("phase A produced no run directory")]
    NoRunDir,
}

impl From<TriageError> for calyx_core::CalyxError {
    fn from(e: TriageError) -> Self {
        calyx_core::CalyxError::InvariantViolation(e.to_string())
    }
}
