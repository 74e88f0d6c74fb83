//! Error types for livestream-media.

use std::io;
use thiserror::Error;

/// Result type for livestream-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for livestream-media operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid MP4 box structure.
    #[error("Invalid MP4: {0}")]
    InvalidMp4(String),
}

impl Error {
    /// Create an invalid MP4 error.
    pub fn invalid_mp4(msg: impl Into<String>) -> Self {
        Self::InvalidMp4(msg.into())
    }
}
