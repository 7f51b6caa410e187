//! Generation service request/response types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use reel_models::ClipStatus;

/// What kind of artifact a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Video,
    Audio,
}

impl ArtifactKind {
    /// File extension for artifacts of this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "mp4",
            ArtifactKind::Audio => "wav",
        }
    }
}

/// One asynchronous generation job.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationJob {
    /// Backend model identifier, used as the submit path segment
    pub model: String,
    /// Generation prompt
    pub prompt: String,
    /// Requested artifact duration in seconds
    pub duration_seconds: u32,
    /// Aspect ratio for video jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// Artifact kind
    #[serde(skip)]
    pub kind: ArtifactKind,
}

impl GenerationJob {
    pub fn video(
        model: impl Into<String>,
        prompt: impl Into<String>,
        duration_seconds: u32,
        aspect_ratio: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            duration_seconds,
            aspect_ratio: Some(aspect_ratio.into()),
            kind: ArtifactKind::Video,
        }
    }

    pub fn audio(model: impl Into<String>, prompt: impl Into<String>, duration_seconds: u32) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            duration_seconds,
            aspect_ratio: None,
            kind: ArtifactKind::Audio,
        }
    }
}

/// Outcome of `submit_and_retrieve`. Never an error: failures are
/// captured in `status`/`error` so phase code can aggregate them.
#[derive(Debug, Clone)]
pub struct ClipOutcome {
    pub status: ClipStatus,
    pub file_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl ClipOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ClipStatus::Failed,
            file_path: None,
            error: Some(error.into()),
        }
    }
}

/// Response to a job submission.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub request_id: String,
}

/// Polled job status payload.
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Job state reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Completed,
    Failed,
}

impl StatusResponse {
    /// Interpret the wire status. Unknown strings are treated as
    /// malformed so the caller can apply its re-fetch policy.
    pub fn state(&self) -> Option<JobState> {
        match self.status.to_lowercase().as_str() {
            "queued" | "in_queue" | "in_progress" | "processing" => Some(JobState::Pending),
            "completed" | "succeeded" | "ok" => Some(JobState::Completed),
            "failed" | "error" => Some(JobState::Failed),
            _ => None,
        }
    }
}

/// Completed-job payload with the artifact location.
#[derive(Debug, Deserialize)]
pub struct ResultResponse {
    pub artifact_url: String,
}
