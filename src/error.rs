//! Error types for the Sagitta library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`SagittaError`] enum. Structural and input errors (dimension mismatches,
//! degenerate query combinations, bad persisted artifacts) are surfaced to
//! the caller as typed failures and are never retried internally.

use std::io;

use thiserror::Error;

/// The main error type for Sagitta operations.
#[derive(Error, Debug)]
pub enum SagittaError {
    /// A vector's length does not match the index dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A weighted vector combination summed to the zero vector, which has
    /// no defined normalization.
    #[error("degenerate combination: weighted sum is the zero vector")]
    DegenerateCombination,

    /// A persisted artifact was written with an unsupported format version.
    #[error("format version mismatch: artifact is v{found}, loader supports v{supported}")]
    VersionMismatch { found: u32, supported: u32 },

    /// A persisted artifact failed structural validation.
    #[error("corrupt artifact: {0}")]
    CorruptArtifact(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary serialization errors
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid operation or argument
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Generic wrapped error
    #[error("error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`SagittaError`].
pub type Result<T> = std::result::Result<T, SagittaError>;

impl SagittaError {
    /// Create a dimension-mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        SagittaError::DimensionMismatch { expected, actual }
    }

    /// Create a corrupt-artifact error.
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        SagittaError::CorruptArtifact(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        SagittaError::Serialization(msg.into())
    }

    /// Create an invalid-operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        SagittaError::InvalidOperation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SagittaError::dimension_mismatch(512, 64);
        assert_eq!(
            error.to_string(),
            "dimension mismatch: expected 512, got 64"
        );

        let error = SagittaError::VersionMismatch {
            found: 9,
            supported: 1,
        };
        assert_eq!(
            error.to_string(),
            "format version mismatch: artifact is v9, loader supports v1"
        );

        let error = SagittaError::corrupt("neighbor id out of range");
        assert_eq!(
            error.to_string(),
            "corrupt artifact: neighbor id out of range"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error = SagittaError::from(io_error);

        match error {
            SagittaError::Io(_) => {}
            _ => panic!("expected Io variant"),
        }
    }
}
