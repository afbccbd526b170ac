//! Error types for the persistence collaborators.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed store document: {0}")]
    Json(#[from] serde_json::Error),
}
