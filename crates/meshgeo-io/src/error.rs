//! Error types for reading sources and exporting documents.

use std::path::PathBuf;

use meshgeo_core::GeoError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IoError>;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// Malformed statement in a text source.
    #[error("{}:{}: {}", .path.display(), .line, .message)]
    Parse {
        path: PathBuf,
        /// One-based line number.
        line: usize,
        message: String,
    },

    #[error("conversion failed: {0}")]
    Convert(#[from] GeoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
