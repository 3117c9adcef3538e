//! Error types for the duplicate finder
//!
//! This module defines the error types surfaced by the fingerprint
//! algorithms, the duplicate index and the snapshot codec.

use crate::fingerprint::Fingerprint;
use crate::loader::LoadError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fingerprinting and index operations
#[derive(Error, Debug)]
pub enum DedupError {
    /// A pixel buffer is malformed or too small for the algorithm
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The `reject` policy refused a second identity for an occupied fingerprint
    #[error("Fingerprint {fingerprint} is already taken by {existing:?}; refusing to add '{identity}'")]
    DuplicateKey {
        fingerprint: Fingerprint,
        identity: String,
        existing: Vec<String>,
    },

    /// Lookup or removal of a fingerprint that is not in the index
    #[error("Fingerprint {0} not found in index")]
    NotFound(Fingerprint),

    /// The snapshot document does not have the expected shape
    #[error("Malformed snapshot '{}': {message}", path.display())]
    FormatError { path: PathBuf, message: String },

    /// Reading or writing a snapshot failed at the storage boundary
    #[error("IO error on '{}': {message}", path.display())]
    IoFailure { path: PathBuf, message: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, DedupError>;

impl DedupError {
    pub(crate) fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DedupError::FormatError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        DedupError::IoFailure {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for DedupError {
    fn from(err: std::io::Error) -> Self {
        DedupError::IoFailure {
            path: PathBuf::new(),
            message: err.to_string(),
        }
    }
}

impl From<LoadError> for DedupError {
    fn from(err: LoadError) -> Self {
        DedupError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = DedupError::DuplicateKey {
            fingerprint: 7,
            identity: "y.jpg".to_string(),
            existing: vec!["x.jpg".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains('7'));
        assert!(msg.contains("x.jpg"));
        assert!(msg.contains("y.jpg"));

        let err = DedupError::format("/tmp/table.json", "key 'abc' is not an integer");
        assert!(err.to_string().contains("/tmp/table.json"));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_load_error_becomes_invalid_input() {
        let load = LoadError::UnsupportedFormat(PathBuf::from("photo.bmp"));
        let expected = load.to_string();
        let err: DedupError = load.into();
        match err {
            DedupError::InvalidInput(msg) => assert_eq!(msg, expected),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
