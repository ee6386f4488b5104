//! Error types for the blacklist engine.

use std::path::PathBuf;
use thiserror::Error;

/// All possible errors from the blacklist engine and its backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Input errors
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("io error: {0}")]
    Io(String),

    // Resolution errors
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    // Backend errors
    #[error("transport error: {0}")]
    Transport(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("{action} returned unexpected status {status}")]
    UnexpectedStatus { action: String, status: u16 },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("operation not supported by this backend: {0}")]
    Unsupported(String),
}

impl Error {
    /// Build an [`Error::UnexpectedStatus`] for the given action.
    pub fn status(action: impl Into<String>, status: u16) -> Self {
        Error::UnexpectedStatus {
            action: action.into(),
            status,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::CollectionNotFound("global".into());
        assert_eq!(err.to_string(), "collection not found: global");

        let err = Error::status("deactivate entry 7", 404);
        assert_eq!(
            err.to_string(),
            "deactivate entry 7 returned unexpected status 404"
        );

        let err = Error::FileNotFound(PathBuf::from("lista.txt"));
        assert_eq!(err.to_string(), "file not found: lista.txt");

        let err = Error::Unsupported("create member".into());
        assert_eq!(
            err.to_string(),
            "operation not supported by this backend: create member"
        );
    }
}
