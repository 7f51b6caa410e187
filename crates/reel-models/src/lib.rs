//! Shared data models for the ReelForge pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Pipeline context, run ids and phase results
//! - Platform specifications and content classification
//! - Scenes, storyboards and scene timing
//! - Generated clips, audio tracks and synced reels
//! - Quality reports and reloop decisions

pub mod audio;
pub mod backend;
pub mod clip;
pub mod context;
pub mod phase;
pub mod platform;
pub mod quality;
pub mod reel;
pub mod reloop;
pub mod scene;

// Re-export common types
pub use audio::AudioTrack;
pub use backend::VideoBackend;
pub use clip::{ClipQuality, ClipStatus, GeneratedClip};
pub use context::{PipelineContext, RunId};
pub use phase::{Phase, PhasePayload, PhaseResult, PhaseStatus};
pub use platform::{
    ContentCategory, ContentMode, Platform, REEL_ASPECT_RATIO, REEL_HEIGHT, REEL_RESOLUTION,
    REEL_WIDTH,
};
pub use quality::{
    DimensionScores, PassStatus, QualityDimension, QualityGrade, QualityReport,
    THRESHOLD_CRITICAL_FAILURE, THRESHOLD_OVERALL_PASS,
};
pub use reel::{SyncQuality, SyncedReel};
pub use reloop::{CostLevel, ReloopDecision, ReloopStrategy};
pub use scene::{split_scene_durations, Scene, StoryboardPlan, TechnicalParams, VisualStyle};
