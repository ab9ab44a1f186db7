use std::error::Error;
use thiserror::Error;

/// Result alias for every [`FestStore`](crate::dao::fest_store::FestStore) operation.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failure reported by a storage backend, independent of the database behind it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or rejected the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A persisted record could not be mapped back to an entity.
    #[error("corrupt record in `{collection}`: {message}")]
    Corrupt {
        collection: &'static str,
        message: String,
    },
}

impl StorageError {
    /// Wrap a backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Report a record that does not decode into its entity.
    pub fn corrupt(collection: &'static str, message: impl Into<String>) -> Self {
        StorageError::Corrupt {
            collection,
            message: message.into(),
        }
    }
}
