//! Error types shared by every CRM crate.

use std::time::Duration;

use thiserror::Error;

use crate::entities::EntityKind;

/// Result type alias used across the core crate and its backends.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for persistence, validation and synchronization.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote store answered with an error or could not be reached.
    #[error("Remote store error: {0}")]
    Remote(String),

    /// A remote call did not complete within its deadline.
    #[error("Remote store did not respond within {0:?}")]
    RemoteTimeout(Duration),

    #[error("{kind} entity not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// An optimistic mutation could not be made durable.
    #[error("Failed to persist change: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }

    /// True for failures the storage layer absorbs by falling back to another backend.
    pub fn is_io_failure(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Serialization(_) | Self::Remote(_) | Self::RemoteTimeout(_)
        )
    }
}

/// Failures raised by a local storage backend.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Pool creation failed: {0}")]
    PoolCreationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Entity invariants violated at creation or mutation time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Duplicate identifier: {0}")]
    DuplicateId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
