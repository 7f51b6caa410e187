//! Generative client error types.

use thiserror::Error;

pub type GenAiResult<T> = Result<T, GenAiError>;

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("Credentials not configured: {0}")]
    MissingCredentials(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Generation job failed: {0}")]
    JobFailed(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenAiError {
    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    /// Check if the error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenAiError::RequestFailed(_) | GenAiError::Timeout(_) | GenAiError::Network(_)
        )
    }

    /// Whether the backend looks entirely unreachable, in which case the
    /// caller degrades to mock output instead of failing the job.
    pub fn is_unreachable(&self) -> bool {
        match self {
            GenAiError::MissingCredentials(_) => true,
            GenAiError::Network(e) => e.is_connect(),
            _ => false,
        }
    }
}
