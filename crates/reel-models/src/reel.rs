//! Final synchronized reel metadata.

use std::fmt;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Audio/video synchronization quality observed during SYNC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncQuality {
    Perfect,
    Good,
    Acceptable,
    Poor,
    /// Degraded execution with a placeholder artifact
    Mock,
    Unknown,
}

impl SyncQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncQuality::Perfect => "perfect",
            SyncQuality::Good => "good",
            SyncQuality::Acceptable => "acceptable",
            SyncQuality::Poor => "poor",
            SyncQuality::Mock => "mock",
            SyncQuality::Unknown => "unknown",
        }
    }

    /// Score contribution used by the technical quality assessment.
    pub fn score(&self) -> f64 {
        match self {
            SyncQuality::Perfect => 1.0,
            SyncQuality::Good => 0.9,
            SyncQuality::Acceptable => 0.75,
            SyncQuality::Poor => 0.5,
            SyncQuality::Mock => 0.8,
            SyncQuality::Unknown => 0.6,
        }
    }
}

impl fmt::Display for SyncQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of the synchronization phase.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncedReel {
    /// Final reel artifact
    pub file_path: PathBuf,

    /// Number of clips stitched into the reel
    pub clips_used: usize,

    /// Total reel duration in seconds
    pub total_duration: u32,

    /// Output resolution, e.g. "1080x1920"
    pub resolution: String,

    /// Observed synchronization quality
    pub sync_quality: SyncQuality,

    /// Whether transitions were applied between clips
    pub transitions_applied: bool,

    /// Whether enhancement filters were applied
    pub enhancements_applied: bool,

    /// Production grade label: "professional" for a real encode,
    /// "mock" for degraded output
    pub quality_grade: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_quality_scores_are_ordered() {
        assert!(SyncQuality::Perfect.score() > SyncQuality::Good.score());
        assert!(SyncQuality::Good.score() > SyncQuality::Poor.score());
        // Mock mode gets a decent score: the artifact is structurally valid
        assert!(SyncQuality::Mock.score() > SyncQuality::Unknown.score());
    }
}
