//! Common error types for BookVault

use thiserror::Error;

/// Common result type for BookVault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types shared by the store and the service layer
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness constraint violated (duplicate tag name, renamed book clash)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map a sqlx error, turning unique-constraint violations into `Conflict`
    pub fn from_write(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Error::Conflict(what.to_string());
            }
        }
        Error::Database(err)
    }

    /// True for failures that simply mean "no such record"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// True for uniqueness violations
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}
