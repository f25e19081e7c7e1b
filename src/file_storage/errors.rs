//! # File Storage Errors

use std::fmt;
use std::io;

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed error from an underlying transport (filesystem, HTTP client, SDK)
pub type TransportSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse error category callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied input the contract rejects
    InvalidArgument,
    /// Requested object is absent
    NotFound,
    /// Underlying I/O or network fault
    Transport,
}

impl ErrorKind {
    /// Stable string code, used in CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Transport => "TRANSPORT_FAILURE",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    // Validation errors
    #[error("Invalid argument: `{0}` does not have a valid file extension")]
    DisallowedExtension(String),

    #[error("Invalid argument: file too large: {0} bytes (max: {1})")]
    FileTooLarge(u64, u64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Object errors
    #[error("Not found: {bucket}/{path}")]
    NotFound { bucket: String, path: String },

    // I/O errors
    #[error("Transport failure: {0}")]
    Transport(#[source] TransportSource),
}

impl StorageError {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::DisallowedExtension(_) => ErrorKind::InvalidArgument,
            StorageError::FileTooLarge(_, _) => ErrorKind::InvalidArgument,
            StorageError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            StorageError::NotFound { .. } => ErrorKind::NotFound,
            StorageError::Transport(_) => ErrorKind::Transport,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        StorageError::InvalidArgument(msg.into())
    }

    pub(crate) fn not_found(bucket: &str, path: &str) -> Self {
        StorageError::NotFound {
            bucket: bucket.to_string(),
            path: path.to_string(),
        }
    }

    /// Wrap any transport-level error without altering it
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<TransportSource>,
    {
        StorageError::Transport(err.into())
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Transport(Box::new(e))
    }
}

impl From<s3::error::S3Error> for StorageError {
    fn from(e: s3::error::S3Error) -> Self {
        StorageError::Transport(Box::new(e))
    }
}
