use std::error::Error;
use thiserror::Error;

use crate::state::violation::RuleViolation;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write was refused because it breaks a scoring rule or a uniqueness constraint.
    #[error(transparent)]
    Rejected(#[from] RuleViolation),
    /// The backend could not be reached or failed while executing the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored record could not be decoded.
    #[error("corrupted record: {message}")]
    Corrupted { message: String },
    /// The configured backend is not compiled into this binary.
    #[error("storage backend `{backend}` is not available in this build")]
    Unsupported { backend: &'static str },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
