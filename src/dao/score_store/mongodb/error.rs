use mongodb::error::{Error as MongoError, ErrorKind, TRANSIENT_TRANSACTION_ERROR, WriteFailure};
use thiserror::Error;

use crate::state::violation::RuleViolation;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Server error code reported when a unique index rejects a write.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("transaction failed during `{operation}`")]
    Transaction {
        operation: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to read from `{collection}`")]
    Read {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to write to `{collection}`")]
    Write {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("invalid document in `{collection}`: {message}")]
    Corrupted {
        collection: &'static str,
        message: String,
    },
    #[error(transparent)]
    Rejected(#[from] RuleViolation),
}

impl MongoDaoError {
    /// Map a failed write to `violation` when a unique index refused it.
    pub fn on_write(collection: &'static str, violation: RuleViolation, source: MongoError) -> Self {
        if is_duplicate_key(&source) {
            MongoDaoError::Rejected(violation)
        } else {
            MongoDaoError::Write { collection, source }
        }
    }

    /// Whether the whole transaction may be retried from the start.
    pub fn is_transient(&self) -> bool {
        match self {
            MongoDaoError::Transaction { source, .. }
            | MongoDaoError::Read { source, .. }
            | MongoDaoError::Write { source, .. } => {
                source.contains_label(TRANSIENT_TRANSACTION_ERROR)
            }
            _ => false,
        }
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command) => command.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
