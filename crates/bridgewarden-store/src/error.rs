//! Error types for the BridgeWarden stores.

use thiserror::Error;

/// Errors surfaced by the quarantine, approval, and audit stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted record could not be serialized or parsed.
    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// No record exists for the given id.
    #[error("record not found: {0}")]
    NotFound(String),
}

// The guard pipeline's sink traits speak io::Error; collapse store errors
// into that shape at the seam.
impl From<StoreError> for std::io::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(inner) => inner,
            StoreError::Json(inner) => std::io::Error::new(std::io::ErrorKind::InvalidData, inner),
            StoreError::NotFound(id) => {
                std::io::Error::new(std::io::ErrorKind::NotFound, format!("record not found: {id}"))
            }
        }
    }
}
