use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CryptError>;

/// Failure taxonomy for the whole pipeline.
///
/// Setup problems (`Configuration`, `MissingResource`, `KeyFormat`) are raised
/// before any parallel work is scheduled. The per-chunk variants abort the
/// operation; the caller removes every intermediate artifact before returning.
#[derive(Debug, Error)]
pub enum CryptError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("not found: {}", .0.display())]
    MissingResource(PathBuf),

    #[error("key file could not be parsed: {0}")]
    KeyFormat(String),

    #[error("session key unwrap failed: wrong key or corrupted wrapped key")]
    InvalidKey,

    #[error("integrity check failed: {0}")]
    Integrity(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CryptError {
    /// Wraps a worker-level failure that has no dedicated variant, such as a
    /// panic or a timeout, as a synthesized I/O error.
    pub fn worker(message: impl Into<String>) -> Self {
        Self::Io(std::io::Error::other(message.into()))
    }
}
