//! Pipeline phases and per-phase results.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::audio::AudioTrack;
use crate::backend::VideoBackend;
use crate::clip::GeneratedClip;
use crate::quality::QualityReport;
use crate::reel::SyncedReel;
use crate::reloop::ReloopDecision;
use crate::scene::{Scene, StoryboardPlan};

/// The six ordered pipeline phases.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Planning,
    Refinement,
    VideoGen,
    AudioGen,
    Sync,
    Qa,
}

impl Phase {
    pub const ALL: &'static [Phase] = &[
        Phase::Planning,
        Phase::Refinement,
        Phase::VideoGen,
        Phase::AudioGen,
        Phase::Sync,
        Phase::Qa,
    ];

    /// 1-based phase number.
    pub fn number(&self) -> u8 {
        match self {
            Phase::Planning => 1,
            Phase::Refinement => 2,
            Phase::VideoGen => 3,
            Phase::AudioGen => 4,
            Phase::Sync => 5,
            Phase::Qa => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Planning => "planning",
            Phase::Refinement => "refinement",
            Phase::VideoGen => "video_gen",
            Phase::AudioGen => "audio_gen",
            Phase::Sync => "sync",
            Phase::Qa => "qa",
        }
    }

    /// The phase that follows this one, if any.
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Planning => Some(Phase::Refinement),
            Phase::Refinement => Some(Phase::VideoGen),
            Phase::VideoGen => Some(Phase::AudioGen),
            Phase::AudioGen => Some(Phase::Sync),
            Phase::Sync => Some(Phase::Qa),
            Phase::Qa => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one phase execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// Everything produced real output
    Success,
    /// Some output is real, some degraded or missing
    Partial,
    /// Output is entirely placeholder artifacts
    Mock,
    /// No usable output
    Failed,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::Success => "success",
            PhaseStatus::Partial => "partial",
            PhaseStatus::Mock => "mock",
            PhaseStatus::Failed => "failed",
        }
    }

    /// Whether the orchestrator may advance to the next phase.
    pub fn can_proceed(&self) -> bool {
        !matches!(self, PhaseStatus::Failed)
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-backend usage in a generation run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct BackendUsage {
    pub clips: u32,
    pub cost: f64,
}

/// Aggregate outcome of the video generation phase.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationSummary {
    pub total_clips: usize,
    pub successful_clips: usize,
    pub mock_clips: usize,
    pub failed_clips: usize,
    pub total_cost: f64,
    pub backend_usage: BTreeMap<VideoBackend, BackendUsage>,
}

/// Video generation phase output.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoGenOutput {
    pub clips: Vec<GeneratedClip>,
    pub summary: GenerationSummary,
}

/// QA phase output: the report plus the reloop decision when it failed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QaOutcome {
    pub report: QualityReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<ReloopDecision>,
}

/// Typed payload carried by a phase result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhasePayload {
    Planning(StoryboardPlan),
    Refinement { scenes: Vec<Scene> },
    VideoGen(VideoGenOutput),
    AudioGen(AudioTrack),
    Sync(SyncedReel),
    Qa(QaOutcome),
}

/// Result of executing one phase.
///
/// Results form an append-only chain; prior entries are retained and
/// never mutated when a reloop re-enters an earlier phase.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PhaseResult {
    /// Which phase produced this result
    pub phase: Phase,

    /// Execution outcome
    pub status: PhaseStatus,

    /// Typed phase output; absent only for failed phases
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<PhasePayload>,

    /// Captured error, when status is failed or a fallback was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Whether the payload came from a recovery fallback
    #[serde(default)]
    pub fallback_used: bool,

    /// Completion timestamp
    pub completed_at: DateTime<Utc>,
}

impl PhaseResult {
    /// Create a result with the given status and payload.
    pub fn new(phase: Phase, status: PhaseStatus, payload: PhasePayload) -> Self {
        Self {
            phase,
            status,
            payload: Some(payload),
            error: None,
            fallback_used: false,
            completed_at: Utc::now(),
        }
    }

    /// Create a synthetic mock result from a recovery fallback payload.
    pub fn fallback(phase: Phase, payload: PhasePayload, error: impl Into<String>) -> Self {
        Self {
            phase,
            status: PhaseStatus::Mock,
            payload: Some(payload),
            error: Some(error.into()),
            fallback_used: true,
            completed_at: Utc::now(),
        }
    }

    /// Create a failed result with no payload.
    pub fn failed(phase: Phase, error: impl Into<String>) -> Self {
        Self {
            phase,
            status: PhaseStatus::Failed,
            payload: None,
            error: Some(error.into()),
            fallback_used: false,
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_ordered_and_linked() {
        assert_eq!(Phase::Planning.number(), 1);
        assert_eq!(Phase::Qa.number(), 6);
        assert_eq!(Phase::Planning.next(), Some(Phase::Refinement));
        assert_eq!(Phase::Sync.next(), Some(Phase::Qa));
        assert_eq!(Phase::Qa.next(), None);
    }

    #[test]
    fn only_failed_blocks_progress() {
        assert!(PhaseStatus::Success.can_proceed());
        assert!(PhaseStatus::Partial.can_proceed());
        assert!(PhaseStatus::Mock.can_proceed());
        assert!(!PhaseStatus::Failed.can_proceed());
    }

    #[test]
    fn fallback_result_is_tagged_mock() {
        let payload = PhasePayload::Refinement { scenes: vec![] };
        let result = PhaseResult::fallback(Phase::Refinement, payload, "text service down");
        assert_eq!(result.status, PhaseStatus::Mock);
        assert!(result.fallback_used);
        assert!(result.error.is_some());
    }
}
