//! Common error types for Muzo

use thiserror::Error;

/// Common result type for Muzo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Muzo services
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

    /// Requested track or playlist not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A concurrent writer changed the record between read and write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Key/tempo/energy analysis unavailable or returned unusable data
    #[error("Analysis failed: {0}")]
    Analysis(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
