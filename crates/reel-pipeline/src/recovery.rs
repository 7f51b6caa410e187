//! Error recovery coordinator.
//!
//! Classifies phase errors, selects a recovery strategy and, when the
//! run can continue, synthesizes a schema-complete fallback payload so
//! downstream phases never observe a partially populated structure.
//! Every handled error lands in `error_log.json`; every recovery
//! attempt in `recovery_log.json`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, warn};

use reel_genai::GenAiError;
use reel_media::MediaError;
use reel_models::phase::{QaOutcome, VideoGenOutput};
use reel_models::{
    AudioTrack, ClipQuality, ClipStatus, ContentMode, DimensionScores, GeneratedClip, Phase,
    PhasePayload, QualityReport, Scene, SyncQuality, SyncedReel, REEL_RESOLUTION,
};

use crate::context::RunContext;
use crate::error::PipelineError;
use crate::orchestrator::RunState;
use crate::phases::{planning, refinement};
use crate::reloop::ReloopEngine;

const MOCK_BYTES: &[u8] = &[0x4d; 1024];

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Coarse error taxonomy used for strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Timeout,
    Permission,
    MissingFile,
    ParseError,
    MissingData,
    DependencyMissing,
    ResourceExhaustion,
    Unknown,
}

/// Recovery strategy families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecoveryStrategy {
    RetryWithBackoff { max_attempts: u32, base_delay_secs: u64 },
    RetryWithLargerTimeout { max_attempts: u32, timeout_multiplier: u32 },
    AlternateStorageLocation,
    RecreateOrDefault,
    FallbackParser,
    UseDefaults,
    DegradeToMock,
    CleanupAndRetry,
    GenericFallback,
}

/// Outcome of handling one phase error.
pub struct Recovery {
    pub severity: ErrorSeverity,
    pub kind: ErrorKind,
    pub strategy: RecoveryStrategy,
    pub can_continue: bool,
    pub fallback_payload: Option<PhasePayload>,
}

#[derive(Debug, Serialize)]
struct ErrorRecord {
    phase: Phase,
    error_type: ErrorKind,
    severity: ErrorSeverity,
    message: String,
    strategy: RecoveryStrategy,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct RecoveryRecord {
    strategy: RecoveryStrategy,
    success: bool,
    actions_taken: Vec<String>,
    timestamp: DateTime<Utc>,
}

/// Classifies errors and coordinates fallback substitution.
#[derive(Default)]
pub struct RecoveryCoordinator {
    errors: Vec<ErrorRecord>,
    recoveries: Vec<RecoveryRecord>,
}

impl RecoveryCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a phase error: classify, pick a strategy, synthesize a
    /// fallback payload, and log the whole episode.
    pub async fn handle(
        &mut self,
        phase: Phase,
        err: &PipelineError,
        ctx: &RunContext,
        state: &RunState,
    ) -> Recovery {
        let kind = classify_error(err);
        let severity = determine_severity(err, kind, phase);
        let strategy = strategy_for(kind);

        error!(
            phase = %phase,
            kind = ?kind,
            severity = ?severity,
            error = %err,
            "Phase error, attempting recovery"
        );

        let mut actions = Vec::new();
        if matches!(strategy, RecoveryStrategy::CleanupAndRetry) {
            ctx.temp.release_all().await;
            ctx.temp
                .sweep_aged(&ctx.dir.tmp_dir(), ctx.config.temp_max_age)
                .await;
            actions.push("released registered temp files".to_string());
        }

        let fallback_payload = build_fallback(phase, ctx, state).await;
        let strategy_succeeded = fallback_payload.is_some()
            && !matches!(strategy, RecoveryStrategy::GenericFallback);
        if strategy_succeeded {
            actions.push(format!("synthesized {} fallback payload", phase));
        }

        // CRITICAL errors terminate the run regardless of fallback
        let can_continue = severity != ErrorSeverity::Critical
            && (strategy_succeeded
                || matches!(severity, ErrorSeverity::Low | ErrorSeverity::Medium));

        if can_continue {
            warn!(phase = %phase, strategy = ?strategy, "Recovery allows the run to continue");
        } else {
            error!(phase = %phase, severity = ?severity, "Recovery cannot continue, halting run");
        }

        self.errors.push(ErrorRecord {
            phase,
            error_type: kind,
            severity,
            message: err.to_string(),
            strategy,
            timestamp: Utc::now(),
        });
        self.recoveries.push(RecoveryRecord {
            strategy,
            success: strategy_succeeded,
            actions_taken: actions,
            timestamp: Utc::now(),
        });
        self.save_logs(ctx).await;

        Recovery {
            severity,
            kind,
            strategy,
            can_continue,
            fallback_payload: if can_continue { fallback_payload } else { None },
        }
    }

    async fn save_logs(&self, ctx: &RunContext) {
        // Log writing is best-effort; a failing log must not cascade
        let errors = serde_json::json!({
            "errors": self.errors,
            "total_errors": self.errors.len(),
            "last_updated": Utc::now(),
        });
        if let Ok(body) = serde_json::to_vec_pretty(&errors) {
            tokio::fs::write(ctx.dir.error_log_path(), body).await.ok();
        }

        let recoveries = serde_json::json!({
            "recovery_attempts": self.recoveries,
            "total_attempts": self.recoveries.len(),
            "last_updated": Utc::now(),
        });
        if let Ok(body) = serde_json::to_vec_pretty(&recoveries) {
            tokio::fs::write(ctx.dir.recovery_log_path(), body)
                .await
                .ok();
        }
    }
}

/// Map an error onto the taxonomy.
pub fn classify_error(err: &PipelineError) -> ErrorKind {
    match err {
        PipelineError::GenAi(e) => match e {
            GenAiError::Network(r) if r.is_timeout() => ErrorKind::Timeout,
            GenAiError::Network(_) => ErrorKind::Network,
            GenAiError::Timeout(_) => ErrorKind::Timeout,
            GenAiError::Json(_) | GenAiError::InvalidResponse(_) => ErrorKind::ParseError,
            GenAiError::MissingCredentials(_) => ErrorKind::DependencyMissing,
            GenAiError::RequestFailed(_) | GenAiError::JobFailed(_) => ErrorKind::Network,
            GenAiError::Io(e) => classify_io(e),
        },
        PipelineError::Media(e) => match e {
            MediaError::FfmpegNotFound | MediaError::FfprobeNotFound => {
                ErrorKind::DependencyMissing
            }
            MediaError::FileNotFound(_) => ErrorKind::MissingFile,
            MediaError::Timeout(_) => ErrorKind::Timeout,
            MediaError::JsonParse(_) => ErrorKind::ParseError,
            MediaError::NoClips => ErrorKind::MissingData,
            MediaError::Io(e) => classify_io(e),
            _ => ErrorKind::Unknown,
        },
        PipelineError::Io(e) => classify_io(e),
        PipelineError::Json(_) => ErrorKind::ParseError,
        PipelineError::MissingData(_) => ErrorKind::MissingData,
        PipelineError::ConfigError(_) => ErrorKind::DependencyMissing,
        PipelineError::PhaseFailed { .. } => ErrorKind::Unknown,
    }
}

fn classify_io(e: &std::io::Error) -> ErrorKind {
    use std::io::ErrorKind as IoKind;
    match e.kind() {
        IoKind::PermissionDenied => ErrorKind::Permission,
        IoKind::NotFound => ErrorKind::MissingFile,
        IoKind::TimedOut => ErrorKind::Timeout,
        _ => {
            let msg = e.to_string().to_lowercase();
            if msg.contains("no space") || msg.contains("out of memory") {
                ErrorKind::ResourceExhaustion
            } else {
                ErrorKind::Unknown
            }
        }
    }
}

/// Severity: message-content matching escalates; otherwise the phase
/// dictates the default.
fn determine_severity(err: &PipelineError, kind: ErrorKind, phase: Phase) -> ErrorSeverity {
    let message = err.to_string().to_lowercase();

    const CRITICAL_PATTERNS: &[&str] = &[
        "api key",
        "authentication",
        "authorization",
        "credential",
        "out of memory",
        "disk full",
        "no space",
    ];
    if kind == ErrorKind::ResourceExhaustion
        || CRITICAL_PATTERNS.iter().any(|p| message.contains(p))
    {
        return ErrorSeverity::Critical;
    }

    const HIGH_PATTERNS: &[&str] = &[
        "connection",
        "network",
        "file not found",
        "permission denied",
    ];
    if HIGH_PATTERNS.iter().any(|p| message.contains(p)) {
        return ErrorSeverity::High;
    }

    match phase {
        Phase::Planning | Phase::Qa => ErrorSeverity::High,
        Phase::VideoGen | Phase::AudioGen | Phase::Sync => ErrorSeverity::Medium,
        Phase::Refinement => ErrorSeverity::Low,
    }
}

/// Taxonomy-to-strategy map.
fn strategy_for(kind: ErrorKind) -> RecoveryStrategy {
    match kind {
        ErrorKind::Network => RecoveryStrategy::RetryWithBackoff {
            max_attempts: 3,
            base_delay_secs: 2,
        },
        ErrorKind::Timeout => RecoveryStrategy::RetryWithLargerTimeout {
            max_attempts: 2,
            timeout_multiplier: 2,
        },
        ErrorKind::Permission => RecoveryStrategy::AlternateStorageLocation,
        ErrorKind::MissingFile => RecoveryStrategy::RecreateOrDefault,
        ErrorKind::ParseError => RecoveryStrategy::FallbackParser,
        ErrorKind::MissingData => RecoveryStrategy::UseDefaults,
        ErrorKind::DependencyMissing => RecoveryStrategy::DegradeToMock,
        ErrorKind::ResourceExhaustion => RecoveryStrategy::CleanupAndRetry,
        ErrorKind::Unknown => RecoveryStrategy::GenericFallback,
    }
}

/// Build the schema-complete fallback payload for a phase.
async fn build_fallback(
    phase: Phase,
    ctx: &RunContext,
    state: &RunState,
) -> Option<PhasePayload> {
    match phase {
        Phase::Planning => Some(PhasePayload::Planning(planning::template_storyboard(
            &ctx.pipeline,
        ))),
        Phase::Refinement => {
            let plan = state
                .storyboard
                .clone()
                .unwrap_or_else(|| planning::template_storyboard(&ctx.pipeline));
            Some(PhasePayload::Refinement {
                scenes: refinement::template_refinement(&plan),
            })
        }
        Phase::VideoGen => Some(PhasePayload::VideoGen(mock_video_output(ctx, state).await?)),
        Phase::AudioGen => Some(PhasePayload::AudioGen(mock_audio_track(ctx).await?)),
        Phase::Sync => Some(PhasePayload::Sync(mock_synced_reel(ctx, state).await?)),
        Phase::Qa => Some(PhasePayload::Qa(fallback_assessment())),
    }
}

/// Mock clips for every planned scene, written to disk so downstream
/// integrity checks see real files.
async fn mock_video_output(ctx: &RunContext, state: &RunState) -> Option<VideoGenOutput> {
    let scenes: Vec<Scene> = if !state.scenes.is_empty() {
        state.scenes.clone()
    } else {
        planning::template_storyboard(&ctx.pipeline).scenes
    };

    let mut clips = Vec::with_capacity(scenes.len());
    for scene in &scenes {
        let dest = ctx.dir.clip_path(scene.scene_number);
        tokio::fs::write(&dest, MOCK_BYTES).await.ok()?;
        clips.push(GeneratedClip {
            clip_id: scene.scene_number,
            scene_number: scene.scene_number,
            file_path: Some(dest),
            status: ClipStatus::Mock,
            backend_used: Default::default(),
            duration_seconds: scene.duration_seconds,
            cost_estimate: 0.0,
            quality_check: ClipQuality {
                valid: true,
                file_size_bytes: MOCK_BYTES.len() as u64,
                warnings: vec![],
            },
            error: None,
        });
    }

    let summary = reel_models::phase::GenerationSummary {
        total_clips: clips.len(),
        successful_clips: 0,
        mock_clips: clips.len(),
        failed_clips: 0,
        total_cost: 0.0,
        backend_usage: Default::default(),
    };
    Some(VideoGenOutput { clips, summary })
}

async fn mock_audio_track(ctx: &RunContext) -> Option<AudioTrack> {
    let mode = ctx.pipeline.content_mode;
    let name = match mode {
        ContentMode::Music => "music.wav",
        ContentMode::Narration => "narration.wav",
    };
    let dest = ctx.dir.audio_dir().join(name);
    tokio::fs::write(&dest, MOCK_BYTES).await.ok()?;

    Some(AudioTrack {
        file_path: Some(dest),
        mode,
        duration_seconds: ctx.pipeline.target_duration,
        status: ClipStatus::Mock,
        voice_style: None,
        cost_estimate: 0.0,
        error: None,
    })
}

async fn mock_synced_reel(ctx: &RunContext, state: &RunState) -> Option<SyncedReel> {
    let dest = ctx.dir.final_reel();
    tokio::fs::write(&dest, MOCK_BYTES).await.ok()?;

    let clips_used = state
        .clips()
        .iter()
        .filter(|c| c.status.is_usable())
        .count()
        .max(1);

    Some(SyncedReel {
        file_path: dest,
        clips_used,
        total_duration: ctx.pipeline.target_duration,
        resolution: REEL_RESOLUTION.to_string(),
        sync_quality: SyncQuality::Mock,
        transitions_applied: false,
        enhancements_applied: false,
        quality_grade: "mock".to_string(),
    })
}

/// Neutral failing assessment used when QA itself broke.
fn fallback_assessment() -> QaOutcome {
    let report = QualityReport::from_scores(DimensionScores::uniform(0.5));
    let decision = ReloopEngine::default().decide(&report);
    QaOutcome { report, decision }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_messages_are_critical() {
        let err = PipelineError::config_error("GEMINI api key rejected");
        let kind = classify_error(&err);
        assert_eq!(
            determine_severity(&err, kind, Phase::Refinement),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn network_messages_are_high() {
        let err = PipelineError::phase_failed(Phase::VideoGen, "connection reset by peer");
        let kind = classify_error(&err);
        assert_eq!(
            determine_severity(&err, kind, Phase::VideoGen),
            ErrorSeverity::High
        );
    }

    #[test]
    fn phase_defaults_apply_without_pattern_match() {
        let err = PipelineError::phase_failed(Phase::Planning, "storyboard empty");
        let kind = classify_error(&err);
        assert_eq!(
            determine_severity(&err, kind, Phase::Planning),
            ErrorSeverity::High
        );
        assert_eq!(
            determine_severity(&err, kind, Phase::Sync),
            ErrorSeverity::Medium
        );
        assert_eq!(
            determine_severity(&err, kind, Phase::Refinement),
            ErrorSeverity::Low
        );
    }

    #[test]
    fn taxonomy_maps_to_expected_strategies() {
        assert!(matches!(
            strategy_for(ErrorKind::Network),
            RecoveryStrategy::RetryWithBackoff { .. }
        ));
        assert!(matches!(
            strategy_for(ErrorKind::Timeout),
            RecoveryStrategy::RetryWithLargerTimeout { .. }
        ));
        assert_eq!(
            strategy_for(ErrorKind::Permission),
            RecoveryStrategy::AlternateStorageLocation
        );
        assert_eq!(
            strategy_for(ErrorKind::MissingFile),
            RecoveryStrategy::RecreateOrDefault
        );
        assert_eq!(
            strategy_for(ErrorKind::ParseError),
            RecoveryStrategy::FallbackParser
        );
        assert_eq!(strategy_for(ErrorKind::MissingData), RecoveryStrategy::UseDefaults);
        assert_eq!(
            strategy_for(ErrorKind::DependencyMissing),
            RecoveryStrategy::DegradeToMock
        );
        assert_eq!(
            strategy_for(ErrorKind::ResourceExhaustion),
            RecoveryStrategy::CleanupAndRetry
        );
    }

    #[test]
    fn missing_data_classifies_cleanly() {
        let err = PipelineError::missing_data("refinement requires a storyboard");
        assert_eq!(classify_error(&err), ErrorKind::MissingData);
    }

    #[test]
    fn fallback_assessment_fails_and_proposes_a_strategy() {
        let outcome = fallback_assessment();
        assert!(!outcome.report.pass_status.is_pass());
        assert!(outcome.decision.is_some());
    }
}
