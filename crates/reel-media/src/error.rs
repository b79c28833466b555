//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Download failed: {message}")]
    DownloadFailed {
        message: String,
        status: Option<u16>,
    },

    #[error("No clips to concatenate")]
    NoClips,

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
            status: None,
        }
    }

    /// Create a download failure for a non-200 response.
    pub fn download_status(status: u16, url: &str) -> Self {
        Self::DownloadFailed {
            message: format!("HTTP {} fetching {}", status, url),
            status: Some(status),
        }
    }

    /// Whether repeating the operation could succeed.
    ///
    /// Client errors other than 408/429 are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::DownloadFailed {
                status: Some(status),
                ..
            } => *status >= 500 || *status == 408 || *status == 429,
            Self::DownloadFailed { status: None, .. } | Self::Timeout(_) | Self::Io(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_retry_classification() {
        assert!(MediaError::download_status(503, "u").is_retryable());
        assert!(MediaError::download_status(429, "u").is_retryable());
        assert!(!MediaError::download_status(404, "u").is_retryable());
        assert!(MediaError::download_failed("connection reset").is_retryable());
        assert!(!MediaError::NoClips.is_retryable());
    }
}
