//! Phase 3: video generation.
//!
//! One generation job per scene through a bounded worker pool. Clip ids
//! are stable and order-preserving relative to scene numbers regardless
//! of completion order; a per-job timeout aborts only its own job.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use reel_genai::GenerationJob;
use reel_media::ensure_target_aspect;
use reel_models::phase::{BackendUsage, GenerationSummary, VideoGenOutput};
use reel_models::{
    ClipQuality, ClipStatus, GeneratedClip, Phase, PhasePayload, PhaseResult, PhaseStatus, Scene,
    VideoBackend, REEL_ASPECT_RATIO, REEL_HEIGHT, REEL_WIDTH,
};

use crate::context::RunContext;
use crate::error::{PipelineError, PipelineResult};
use crate::orchestrator::RunState;

/// Run the video generation phase.
pub async fn run(ctx: &RunContext, state: &RunState) -> PipelineResult<PhaseResult> {
    let scenes = &state.scenes;
    if scenes.is_empty() {
        return Err(PipelineError::missing_data(
            "video generation requires refined scenes",
        ));
    }

    let category = state
        .storyboard
        .as_ref()
        .map(|p| p.category)
        .unwrap_or_else(|| reel_models::ContentCategory::classify(&ctx.pipeline.brief));

    let estimate = ctx.selector.estimate_cost(scenes, category);
    info!(
        scenes = scenes.len(),
        workers = ctx.config.scene_parallelism,
        override_backend = ?state.backend_override,
        estimated_cost = format!("${:.2}", estimate.total),
        "Starting video generation"
    );

    let semaphore = Arc::new(Semaphore::new(ctx.config.scene_parallelism));

    let futures: Vec<_> = scenes
        .iter()
        .map(|scene| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                // A closed semaphore cannot happen here; holders always
                // return their permit on drop
                let _permit = semaphore.acquire().await.expect("scene pool closed");
                generate_scene(ctx, scene, category, state.backend_override).await
            }
        })
        .collect();

    let mut clips = join_all(futures).await;
    clips.sort_by_key(|clip| clip.scene_number);

    let summary = summarize(&clips);
    if summary.successful_clips + summary.mock_clips == 0 {
        let detail = clips
            .iter()
            .filter_map(|c| c.error.as_deref())
            .next()
            .unwrap_or("no clip detail");
        return Err(PipelineError::phase_failed(
            Phase::VideoGen,
            format!("no usable clips generated: {detail}"),
        ));
    }

    let status = if summary.mock_clips == summary.total_clips {
        PhaseStatus::Mock
    } else if summary.failed_clips == 0 && summary.mock_clips == 0 {
        PhaseStatus::Success
    } else {
        PhaseStatus::Partial
    };

    info!(
        success = summary.successful_clips,
        mock = summary.mock_clips,
        failed = summary.failed_clips,
        cost = format!("${:.2}", summary.total_cost),
        "Video generation complete"
    );

    Ok(PhaseResult::new(
        Phase::VideoGen,
        status,
        PhasePayload::VideoGen(VideoGenOutput { clips, summary }),
    ))
}

/// Generate one scene's clip. Never fails: outcomes are captured in the
/// clip status so siblings keep running.
async fn generate_scene(
    ctx: &RunContext,
    scene: &Scene,
    category: reel_models::ContentCategory,
    backend_override: Option<VideoBackend>,
) -> GeneratedClip {
    let backend =
        backend_override.unwrap_or_else(|| ctx.selector.select_backend(scene, category));

    let job = GenerationJob::video(
        backend.as_str(),
        scene.generation_prompt(),
        scene.duration_seconds,
        REEL_ASPECT_RATIO,
    );
    let dest = ctx.dir.clip_path(scene.scene_number);

    let outcome = ctx.video_client.submit_and_retrieve(&job, &dest).await;

    let mut warnings = Vec::new();
    let mut file_path = outcome.file_path.clone();

    // Aspect post-check only makes sense on real artifacts
    if outcome.status == ClipStatus::Success {
        if let Some(path) = &outcome.file_path {
            let aspect = ensure_target_aspect(path, REEL_WIDTH, REEL_HEIGHT).await;
            if aspect.reencoded {
                // The pre-encode original is no longer the clip of record
                ctx.temp.register(path.clone());
                file_path = Some(aspect.path);
            }
            if let Some(warning) = aspect.warning {
                warnings.push(warning);
            }
        }
    }

    let quality_check = match &file_path {
        Some(path) => {
            let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            ClipQuality {
                valid: size > 0,
                file_size_bytes: size,
                warnings,
            }
        }
        None => ClipQuality {
            valid: false,
            file_size_bytes: 0,
            warnings,
        },
    };

    let cost_estimate = if outcome.status == ClipStatus::Success {
        backend.cost_per_clip()
    } else {
        0.0
    };

    if outcome.status == ClipStatus::Failed {
        warn!(
            scene = scene.scene_number,
            backend = %backend,
            error = outcome.error.as_deref().unwrap_or("unknown"),
            "Clip generation failed"
        );
    }

    GeneratedClip {
        clip_id: scene.scene_number,
        scene_number: scene.scene_number,
        file_path,
        status: outcome.status,
        backend_used: backend,
        duration_seconds: scene.duration_seconds,
        cost_estimate,
        quality_check,
        error: outcome.error,
    }
}

fn summarize(clips: &[GeneratedClip]) -> GenerationSummary {
    let mut backend_usage: BTreeMap<VideoBackend, BackendUsage> = BTreeMap::new();
    for clip in clips {
        let usage = backend_usage.entry(clip.backend_used).or_default();
        usage.clips += 1;
        usage.cost += clip.cost_estimate;
    }

    GenerationSummary {
        total_clips: clips.len(),
        successful_clips: clips.iter().filter(|c| c.status == ClipStatus::Success).count(),
        mock_clips: clips.iter().filter(|c| c.status == ClipStatus::Mock).count(),
        failed_clips: clips.iter().filter(|c| c.status == ClipStatus::Failed).count(),
        total_cost: clips.iter().map(|c| c.cost_estimate).sum(),
        backend_usage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(scene: u32, status: ClipStatus, backend: VideoBackend, cost: f64) -> GeneratedClip {
        GeneratedClip {
            clip_id: scene,
            scene_number: scene,
            file_path: None,
            status,
            backend_used: backend,
            duration_seconds: 10,
            cost_estimate: cost,
            quality_check: ClipQuality::default(),
            error: None,
        }
    }

    #[test]
    fn summary_counts_by_status_and_backend() {
        let clips = vec![
            clip(1, ClipStatus::Success, VideoBackend::Hailuo02, 0.49),
            clip(2, ClipStatus::Mock, VideoBackend::Hailuo02, 0.0),
            clip(3, ClipStatus::Failed, VideoBackend::RunwayGen3, 0.0),
        ];
        let summary = summarize(&clips);
        assert_eq!(summary.total_clips, 3);
        assert_eq!(summary.successful_clips, 1);
        assert_eq!(summary.mock_clips, 1);
        assert_eq!(summary.failed_clips, 1);
        assert!((summary.total_cost - 0.49).abs() < 1e-9);
        assert_eq!(summary.backend_usage[&VideoBackend::Hailuo02].clips, 2);
        assert_eq!(summary.backend_usage[&VideoBackend::RunwayGen3].clips, 1);
    }
}
