//! Pipeline error types.

use thiserror::Error;

use reel_models::Phase;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Phase {phase} failed: {message}")]
    PhaseFailed { phase: Phase, message: String },

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Generation error: {0}")]
    GenAi(#[from] reel_genai::GenAiError),

    #[error("Media error: {0}")]
    Media(#[from] reel_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn phase_failed(phase: Phase, message: impl Into<String>) -> Self {
        Self::PhaseFailed {
            phase,
            message: message.into(),
        }
    }

    pub fn missing_data(message: impl Into<String>) -> Self {
        Self::MissingData(message.into())
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}
