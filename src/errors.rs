//! Crate-wide error type.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate
pub type DbResult<T> = Result<T, DbError>;

/// All failure modes surfaced by the crate
#[derive(Debug, Error)]
pub enum DbError {
    /// A record or schema failed a constraint check
    #[error("validation error: {0}")]
    Validation(String),

    /// Lookup of an unregistered table
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Attempt to create a table under a name already in use
    #[error("table already exists: {0}")]
    TableExists(String),

    /// A persistence operation on a database opened without storage
    #[error("persistence is not enabled for this database")]
    PersistenceDisabled,

    /// An on-disk file exists but cannot be parsed
    #[error("corrupt file {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Shorthand for a [`DbError::Validation`]
    pub fn validation(msg: impl Into<String>) -> Self {
        DbError::Validation(msg.into())
    }

    /// Shorthand for a [`DbError::Corrupt`]
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DbError::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
