//! Error types for Tabula core.

use thiserror::Error;

/// Errors that can occur while managing spreadsheet documents
#[derive(Error, Debug)]
pub enum TabulaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Range error: {0}")]
    Range(#[from] tabula_engine::engine::RangeError),

    #[error("Spreadsheet not found: {0}")]
    NotFound(u64),

    #[error("Refusing to read {path}: document too large ({size} bytes, max {max})")]
    DocumentTooLarge { path: String, size: u64, max: u64 },
}

pub type Result<T> = std::result::Result<T, TabulaError>;
