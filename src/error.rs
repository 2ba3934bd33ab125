//! Application error types for toyshelf
//!
//! This module defines common error types used throughout the application.
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Store-related errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection-actor failure (closed channel, shutdown)
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Record not found
    #[error("Record not found")]
    NotFound,

    /// Version-matched write lost against a concurrent writer
    #[error("Edit conflict")]
    EditConflict,

    /// Unique email index violated
    #[error("Duplicate email")]
    DuplicateEmail,

    /// Operation exceeded the store deadline
    #[error("Database operation timed out")]
    Timeout,

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<tokio_rusqlite::Error> for StoreError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(e) => StoreError::Sqlite(e),
            other => StoreError::Connection(other.to_string()),
        }
    }
}

/// Authentication and authorization errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bearer token missing from the store, expired, or malformed
    #[error("Invalid or expired authentication token")]
    InvalidOrExpiredToken,

    /// Anonymous principal reached a route that needs an identity
    #[error("You must be authenticated to access this resource")]
    AuthenticationRequired,

    /// Authenticated but the account has not been activated
    #[error("Your account must be activated to access this resource")]
    NotActivated,

    /// Authenticated and activated, but the permission code is missing
    #[error("Your account doesn't have the necessary permissions")]
    Forbidden,

    /// Permission or token lookup failed in the store
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Password credential errors
#[derive(Debug, Error)]
pub enum PasswordError {
    /// The hashing primitive itself failed; never raised for policy reasons
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Rating codec errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RatingError {
    /// Input does not match the `"<value> из 5"` shape
    #[error("Invalid rating format")]
    InvalidFormat,
}

/// Application-level error type
///
/// Aggregates all domain-specific error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication or authorization error
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Store error
    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    /// Password credential error
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    /// Rating codec error
    #[error("Rating error: {0}")]
    Rating(#[from] RatingError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
