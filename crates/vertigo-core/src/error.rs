//! Domain-level error types.

use thiserror::Error;

use crate::ports::AuthError;

/// Domain errors - business logic failures surfaced to callers.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} {key}")]
    NotFound {
        entity_type: &'static str,
        key: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Persistence failure. Details are logged where it happens, never carried.
    #[error("Storage failure")]
    Storage,

    #[error("Notification dispatch failed: {0}")]
    Dispatch(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity_type: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            key: key.to_string(),
        }
    }

    /// Log a repository failure with context and collapse it into a domain error.
    ///
    /// `RepoError::NotFound` keeps its meaning; everything else becomes [`DomainError::Storage`].
    pub fn from_repo(err: RepoError, entity_type: &'static str, key: impl ToString) -> Self {
        match err {
            RepoError::NotFound => Self::not_found(entity_type, key),
            other => {
                tracing::error!(
                    entity = entity_type,
                    key = %key.to_string(),
                    error = %other,
                    "Storage operation failed"
                );
                Self::Storage
            }
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}
