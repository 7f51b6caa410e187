//! Phase 5: audio/video synchronization.
//!
//! Stitches the usable clips and muxes the audio track under them. A
//! real encode needs the local encoder and real clips; anything less
//! degrades to a structurally valid placeholder reel, clearly labeled.

use std::path::PathBuf;

use tracing::{info, warn};

use reel_media::{encoder_available, mux_audio, stitch_clips};
use reel_models::{
    ClipStatus, GeneratedClip, Phase, PhasePayload, PhaseResult, PhaseStatus, SyncQuality,
    SyncedReel, REEL_RESOLUTION,
};

use crate::context::RunContext;
use crate::error::{PipelineError, PipelineResult};
use crate::orchestrator::RunState;

/// Run the synchronization phase.
pub async fn run(ctx: &RunContext, state: &RunState) -> PipelineResult<PhaseResult> {
    let clips: Vec<&GeneratedClip> = state
        .clips()
        .iter()
        .filter(|c| c.status.is_usable() && c.file_path.is_some())
        .collect();

    if clips.is_empty() {
        return Err(PipelineError::phase_failed(
            Phase::Sync,
            "no usable clips to synchronize",
        ));
    }

    let total_duration: u32 = clips.iter().map(|c| c.duration_seconds).sum();
    let all_real = clips.iter().all(|c| c.status == ClipStatus::Success);
    let audio_path = state
        .audio
        .as_ref()
        .filter(|t| t.status.is_usable())
        .and_then(|t| t.file_path.clone());

    let final_path = ctx.dir.final_reel();

    let reel = if all_real && encoder_available() {
        match real_sync(ctx, &clips, audio_path.as_deref(), &final_path).await {
            Ok(()) => SyncedReel {
                file_path: final_path,
                clips_used: clips.len(),
                total_duration,
                resolution: REEL_RESOLUTION.to_string(),
                sync_quality: if audio_path.is_some() {
                    SyncQuality::Perfect
                } else {
                    SyncQuality::Good
                },
                transitions_applied: true,
                enhancements_applied: true,
                quality_grade: "professional".to_string(),
            },
            Err(e) => {
                warn!(error = %e, "Real synchronization failed, degrading to mock reel");
                mock_reel(&clips, &final_path, total_duration).await?
            }
        }
    } else {
        if all_real {
            warn!("Encoder unavailable, producing mock reel");
        }
        mock_reel(&clips, &final_path, total_duration).await?
    };

    // Stitch intermediates are no longer needed once the reel exists
    ctx.temp.release_all().await;

    let status = match reel.sync_quality {
        SyncQuality::Mock => PhaseStatus::Mock,
        _ => PhaseStatus::Success,
    };

    info!(
        reel = %reel.file_path.display(),
        clips = reel.clips_used,
        duration = reel.total_duration,
        quality = %reel.sync_quality,
        "Synchronization complete"
    );

    Ok(PhaseResult::new(Phase::Sync, status, PhasePayload::Sync(reel)))
}

async fn real_sync(
    ctx: &RunContext,
    clips: &[&GeneratedClip],
    audio: Option<&std::path::Path>,
    final_path: &std::path::Path,
) -> PipelineResult<()> {
    let paths: Vec<PathBuf> = clips
        .iter()
        .filter_map(|c| c.file_path.clone())
        .collect();

    match audio {
        Some(audio_path) => {
            let stitched = ctx.dir.tmp_dir().join("stitched.mp4");
            ctx.temp.register(&stitched);
            stitch_clips(&paths, &stitched).await?;
            mux_audio(&stitched, audio_path, final_path).await?;
        }
        None => {
            stitch_clips(&paths, final_path).await?;
        }
    }
    Ok(())
}

/// Produce a placeholder reel by concatenating clip bytes. Always
/// non-empty, always labeled mock.
async fn mock_reel(
    clips: &[&GeneratedClip],
    final_path: &std::path::Path,
    total_duration: u32,
) -> PipelineResult<SyncedReel> {
    let mut bytes = Vec::new();
    for clip in clips {
        if let Some(path) = &clip.file_path {
            if let Ok(content) = tokio::fs::read(path).await {
                bytes.extend_from_slice(&content);
            }
        }
    }
    if bytes.is_empty() {
        bytes.extend_from_slice(&[0x4d; 1024]);
    }
    tokio::fs::write(final_path, &bytes).await?;

    Ok(SyncedReel {
        file_path: final_path.to_path_buf(),
        clips_used: clips.len(),
        total_duration,
        resolution: REEL_RESOLUTION.to_string(),
        sync_quality: SyncQuality::Mock,
        transitions_applied: false,
        enhancements_applied: false,
        quality_grade: "mock".to_string(),
    })
}
