//! Generation client error types.

use thiserror::Error;

pub type GenResult<T> = Result<T, GenError>;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Poll failed: {0}")]
    Poll(String),

    #[error("Generation service returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GenError {
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            GenError::Network(_) => true,
            GenError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Wrap as a submission failure, keeping the original message.
    pub fn into_submission(self) -> Self {
        match self {
            GenError::Submission(_) | GenError::Config(_) => self,
            other => GenError::Submission(other.to_string()),
        }
    }

    /// Wrap as a poll failure, keeping the original message.
    pub fn into_poll(self) -> Self {
        match self {
            GenError::Poll(_) | GenError::Config(_) => self,
            other => GenError::Poll(other.to_string()),
        }
    }
}
