use boracrm_core::errors::{DatabaseError, Error};
use thiserror::Error;

/// Failures raised by the SQLite layer before they cross into the core error type.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Connection failed: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Write actor unavailable: {0}")]
    WriterUnavailable(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        let message = err.to_string();
        let db_error = match err {
            StorageError::Query(_) => DatabaseError::QueryFailed(message),
            StorageError::Connection(_) => DatabaseError::ConnectionFailed(message),
            StorageError::Pool(_) => DatabaseError::PoolCreationFailed(message),
            StorageError::Migration(_) => DatabaseError::MigrationFailed(message),
            StorageError::Io(_) | StorageError::WriterUnavailable(_) => {
                DatabaseError::Unavailable(message)
            }
        };
        Error::Database(db_error)
    }
}
