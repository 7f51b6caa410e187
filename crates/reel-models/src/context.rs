//! Pipeline run context.

use std::fmt;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::platform::{ContentMode, Platform};

/// Unique identifier for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input context for a pipeline run.
///
/// Constructed once from the user brief and immutable after planning;
/// every component receives it by reference instead of reading globals.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PipelineContext {
    /// Natural-language brief describing the desired reel
    pub brief: String,

    /// Target platform
    pub platform: Platform,

    /// Target duration in seconds
    pub target_duration: u32,

    /// Audio content mode
    pub content_mode: ContentMode,

    /// Per-run working directory (exclusively owned by this run)
    pub working_directory: PathBuf,
}

impl PipelineContext {
    /// Create a new context.
    pub fn new(
        brief: impl Into<String>,
        platform: Platform,
        target_duration: u32,
        content_mode: ContentMode,
        working_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            brief: brief.into(),
            platform,
            target_duration,
            content_mode,
            working_directory: working_directory.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn context_round_trips_through_json() {
        let ctx = PipelineContext::new(
            "30s fashion showcase",
            Platform::Instagram,
            30,
            ContentMode::Music,
            "/tmp/reel",
        );
        let json = serde_json::to_string(&ctx).unwrap();
        let back: PipelineContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back.brief, ctx.brief);
        assert_eq!(back.target_duration, 30);
    }
}
