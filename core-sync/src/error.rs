use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("A reconciliation pass is already running")]
    PassInProgress,

    #[error("Remote listing failed: {0}")]
    RemoteListing(String),

    #[error("Local inventory scan failed: {0}")]
    Inventory(String),

    #[error("Duplicate deletion batch failed: {0}")]
    DeletionBatch(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
