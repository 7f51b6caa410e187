//! Generated clip metadata.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::backend::VideoBackend;

/// Outcome of one generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClipStatus {
    /// Real artifact retrieved from the backend
    Success,
    /// Placeholder artifact produced in degraded mode
    Mock,
    /// Generation failed; no usable artifact
    Failed,
}

impl ClipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipStatus::Success => "success",
            ClipStatus::Mock => "mock",
            ClipStatus::Failed => "failed",
        }
    }

    /// Whether downstream phases can consume this clip.
    pub fn is_usable(&self) -> bool {
        matches!(self, ClipStatus::Success | ClipStatus::Mock)
    }
}

/// Lightweight validation of a generated artifact.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct ClipQuality {
    /// File exists and is non-empty
    pub valid: bool,
    /// File size in bytes
    pub file_size_bytes: u64,
    /// Non-fatal issues recorded during post-processing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// One generated clip. One attempt exists per scene per iteration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedClip {
    /// Stable id, order-preserving relative to scene_number
    pub clip_id: u32,

    /// Scene this clip realizes
    pub scene_number: u32,

    /// Artifact location; absent only for failed clips
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// Generation outcome
    pub status: ClipStatus,

    /// Backend that produced (or would have produced) the clip
    pub backend_used: VideoBackend,

    /// Clip duration in seconds
    pub duration_seconds: u32,

    /// Estimated generation cost in USD (zero for mock clips)
    pub cost_estimate: f64,

    /// Artifact validation result
    pub quality_check: ClipQuality,

    /// Captured error for failed clips
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GeneratedClip {
    /// Create a failed clip carrying the captured error.
    pub fn failed(
        clip_id: u32,
        scene_number: u32,
        backend: VideoBackend,
        duration_seconds: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            clip_id,
            scene_number,
            file_path: None,
            status: ClipStatus::Failed,
            backend_used: backend,
            duration_seconds,
            cost_estimate: 0.0,
            quality_check: ClipQuality::default(),
            error: Some(error.into()),
        }
    }
}
