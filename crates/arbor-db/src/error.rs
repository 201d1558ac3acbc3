//! Database-specific error types and conversions.

use arbor_core::error::{StorageStep, StoreError};

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query rejected: {0}")]
    Query(String),

    #[error("Statement rejected during {step}: {message}")]
    Statement { step: StorageStep, message: String },

    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StoreError::NotFound { entity, id },
            DbError::Statement { step, message } => StoreError::Statement { step, message },
            other => StoreError::Backend(other.to_string()),
        }
    }
}
