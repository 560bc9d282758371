use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Fabric(#[from] calyx_fabric::FabricError),

    #[error(transparent)]
    Store(#[from] calyx_store::StoreError),
}

impl From<BridgeError> for calyx_core::CalyxError {
    fn from(e: BridgeError) -> Self {
        calyx_core::CalyxError::InvariantViolation(e.to_string())
    }
}
