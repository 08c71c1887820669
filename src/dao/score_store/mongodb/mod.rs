mod config;
mod connection;
mod error;
mod models;
mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoScoreStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::Rejected(violation) => StorageError::Rejected(violation),
            MongoDaoError::Corrupted {
                collection,
                message,
            } => StorageError::Corrupted {
                message: format!("{collection}: {message}"),
            },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
