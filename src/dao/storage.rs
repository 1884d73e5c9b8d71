//! Backend-agnostic storage error surface.

use std::error::Error;
use thiserror::Error;

/// Result alias for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by store backends regardless of the underlying engine.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or rejected the operation.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failed operation.
        message: String,
        /// Underlying backend failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Wrap any backend failure into an unavailable error.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
