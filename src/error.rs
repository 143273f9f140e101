use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by lockaudit.
///
/// Malformed versions and timestamps inside otherwise well-formed input
/// are never errors; they degrade to "does not match" during the check.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The supplied lock file path does not exist.
    #[error("lock file not found: {0}")]
    LockNotFound(PathBuf),

    /// Lock data is not a structured mapping, or does not parse to one.
    #[error("invalid lock data: {0}")]
    InvalidLock(String),

    /// The advisory database could not be fetched.
    #[error("network error: {0}")]
    Network(String),

    /// The advisory database could not be read or extracted.
    #[error("advisory database error: {0}")]
    Database(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for lockaudit operations.
pub type Result<T> = std::result::Result<T, AuditError>;
