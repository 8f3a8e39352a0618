//! Error types for catalog operations

use accounts_core::FieldError;
use thiserror::Error;

/// Catalog errors
#[derive(Error, Debug)]
pub enum Error {
    /// Record missing, or soft-deleted where only active records count
    #[error("{0}")]
    NotFound(String),

    /// Unique name or SKU collision
    #[error("{0}")]
    AlreadyExists(String),

    /// Request rejected with a single message
    #[error("{0}")]
    BadRequest(String),

    /// Caller is neither the owner nor an administrator
    #[error("{0}")]
    Forbidden(String),

    /// Field-level input validation failures
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Forbidden error
    pub fn forbidden<S: Into<String>>(msg: S) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a new Validation error for a single field
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// Whether the error is a server-side failure rather than a client mistake
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_))
    }
}

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, Error>;
