use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("store corrupted, refusing compaction: {0}")]
    Corrupted(String),
}

impl From<StoreError> for calyx_core::CalyxError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Corrupted(msg) => calyx_core::CalyxError::InvariantViolation(msg),
            other => calyx_core::CalyxError::InvariantViolation(other.to_string()),
        }
    }
}
