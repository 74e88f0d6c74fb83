//! Common error types used throughout livestream-dl.
//!
//! This module provides a unified error type for the failures shared by the
//! member crates: missing or unreadable records and I/O.

use std::path::PathBuf;

/// Common error type for livestream-dl.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required file was not found.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A broadcast or comments record could not be parsed.
    #[error("Malformed record {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<P: Into<PathBuf>>(path: P) -> Self {
        Self::NotFound(path.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
