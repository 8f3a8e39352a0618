//! Error types for accounts-core

use thiserror::Error;

use crate::validation::FieldError;

/// Accounts errors
#[derive(Error, Debug)]
pub enum Error {
    /// Registration with an email that is already taken
    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    /// Login failed. Never says whether the email or the password was wrong.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Re-authentication with the current password failed
    #[error("Invalid old password")]
    IncorrectPassword,

    /// No refresh token was presented
    #[error("Refresh token not found")]
    MissingToken,

    /// Token failed signature, expiry or stored-hash checks
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Identity lookup outside the login path failed
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Role or ownership mismatch
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Field-level input validation failures
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Hashing backend failures
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// Token encoding failures
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new InvalidToken error
    pub fn invalid_token<S: Into<String>>(msg: S) -> Self {
        Self::InvalidToken(msg.into())
    }

    /// Create a new Forbidden error
    pub fn forbidden<S: Into<String>>(msg: S) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a new Validation error for a single field
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// Create a new Internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error is a server-side failure rather than a client mistake
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::PasswordHash(_) | Self::Jwt(_) | Self::Config(_) | Self::Internal(_)
        )
    }
}

impl From<password_hash::Error> for Error {
    fn from(err: password_hash::Error) -> Self {
        Self::PasswordHash(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {}", err))
    }
}

/// Result type for accounts operations
pub type Result<T> = std::result::Result<T, Error>;
