//! Cache error types.

use serde::Serialize;
use thiserror::Error;

/// Coarse error classification shared by every OmniStore crate.
///
/// Callers (the UI collaborator, the CLI) branch on the kind rather than on
/// individual variants: validation and not-found errors are shown inline,
/// conflicts and expiry ask the shopper to retry, transport errors are
/// reported as a generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input; nothing was changed.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// The request lost a race or collides with existing state.
    Conflict,
    /// A time-bounded credential is past its window.
    Expired,
    /// Storage or an external provider could not be reached.
    Transport,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Expired => "expired",
            ErrorKind::Transport => "transport",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when using the store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to open the store.
    #[error("Failed to open store: {0}")]
    OpenError(String),

    /// Failed to serialize or deserialize a value.
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// Failed to perform store operation.
    #[error("Store operation failed: {0}")]
    StoreError(String),

    /// Key not found.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Concurrent modification detected and retries were exhausted.
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),
}

impl CacheError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CacheError::NotFound(_) => ErrorKind::NotFound,
            CacheError::ConcurrentModification(_) => ErrorKind::Conflict,
            CacheError::OpenError(_)
            | CacheError::SerializeError(_)
            | CacheError::StoreError(_) => ErrorKind::Transport,
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(e: std::io::Error) -> Self {
        CacheError::StoreError(e.to_string())
    }
}
