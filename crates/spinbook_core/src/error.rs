//! Application error types for catalog storage and domain logic.
use thiserror::Error;

/// Top-level error type for catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Storage error: {0}")]
    StorageMessage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Media store error: {0}")]
    Media(String),

    #[error("Not found")]
    NotFound,

    #[error("Element id '{0}' already exists")]
    Duplicate(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<redb::DatabaseError> for CatalogError {
    fn from(value: redb::DatabaseError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TransactionError> for CatalogError {
    fn from(value: redb::TransactionError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::TableError> for CatalogError {
    fn from(value: redb::TableError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::StorageError> for CatalogError {
    fn from(value: redb::StorageError) -> Self {
        Self::Database(value.into())
    }
}

impl From<redb::CommitError> for CatalogError {
    fn from(value: redb::CommitError) -> Self {
        Self::Database(value.into())
    }
}
