//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to configure storage client: {0}")]
    ConfigError(String),

    #[error("Upload failed with HTTP {status}: {message}")]
    UploadFailed { status: u16, message: String },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn upload_failed(status: u16, msg: impl Into<String>) -> Self {
        Self::UploadFailed {
            status,
            message: msg.into(),
        }
    }

    /// HTTP status returned by the storage endpoint, if the request got that far.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            StorageError::UploadFailed { status, .. } => Some(*status),
            StorageError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::Network(_) => true,
            StorageError::UploadFailed { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
