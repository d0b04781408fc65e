//! Output storage.
//!
//! Handles writing the published schedule document and reading it back.

mod json;

pub use json::*;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to move output into place: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}
