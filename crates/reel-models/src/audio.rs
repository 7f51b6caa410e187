//! Audio track metadata.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::clip::ClipStatus;
use crate::platform::ContentMode;

/// Generated audio track for the reel.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AudioTrack {
    /// Artifact location; absent only when generation failed outright
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// Music or narration
    pub mode: ContentMode,

    /// Track duration in seconds
    pub duration_seconds: u32,

    /// Generation outcome
    pub status: ClipStatus,

    /// Voice style for narration tracks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_style: Option<String>,

    /// Estimated generation cost in USD
    pub cost_estimate: f64,

    /// Captured error for failed tracks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
