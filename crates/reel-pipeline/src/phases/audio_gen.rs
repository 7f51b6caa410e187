//! Phase 4: audio generation.
//!
//! Music mode requests one background track; narration mode assembles a
//! script from scene key messages and requests a TTS render. Both go
//! through the same generation job client and inherit its mock fallback.

use tracing::info;

use reel_genai::GenerationJob;
use reel_models::{
    AudioTrack, ClipStatus, ContentMode, Phase, PhasePayload, PhaseResult, PhaseStatus, Scene,
};

use crate::context::RunContext;
use crate::error::{PipelineError, PipelineResult};
use crate::orchestrator::RunState;

/// TTS backend model identifier.
const TTS_MODEL: &str = "f5-tts";
/// Background music backend model identifier.
const MUSIC_MODEL: &str = "stable-audio";
/// TTS pricing per 1000 characters of script.
const TTS_COST_PER_1000_CHARS: f64 = 0.05;
/// Flat cost of one background music track.
const MUSIC_TRACK_COST: f64 = 0.10;
/// Narration voice used for generated reels.
const NARRATION_VOICE: &str = "professional";

/// Run the audio generation phase.
pub async fn run(ctx: &RunContext, state: &RunState) -> PipelineResult<PhaseResult> {
    let mode = ctx.pipeline.content_mode;
    let duration = ctx.pipeline.target_duration;

    let (job, dest, live_cost, voice_style) = match mode {
        ContentMode::Music => {
            let mood = state
                .storyboard
                .as_ref()
                .map(|p| p.visual_style.aesthetic_mood.clone())
                .unwrap_or_else(|| "engaging".to_string());
            let prompt = format!(
                "Upbeat background music for {}, {} mood, {}s, loopable",
                ctx.pipeline.brief, mood, duration
            );
            (
                GenerationJob::audio(MUSIC_MODEL, prompt, duration),
                ctx.dir.audio_dir().join("music.wav"),
                MUSIC_TRACK_COST,
                None,
            )
        }
        ContentMode::Narration => {
            let script = narration_script(&state.scenes, &ctx.pipeline.brief);
            let cost = (script.len() as f64 / 1000.0) * TTS_COST_PER_1000_CHARS;
            (
                GenerationJob::audio(TTS_MODEL, script, duration),
                ctx.dir.audio_dir().join("narration.wav"),
                cost,
                Some(NARRATION_VOICE.to_string()),
            )
        }
    };

    let outcome = ctx.video_client.submit_and_retrieve(&job, &dest).await;

    if outcome.status == ClipStatus::Failed {
        return Err(PipelineError::phase_failed(
            Phase::AudioGen,
            outcome
                .error
                .unwrap_or_else(|| "audio generation failed".to_string()),
        ));
    }

    let track = AudioTrack {
        file_path: outcome.file_path,
        mode,
        duration_seconds: duration,
        status: outcome.status,
        voice_style,
        cost_estimate: if outcome.status == ClipStatus::Success {
            live_cost
        } else {
            0.0
        },
        error: outcome.error,
    };

    let status = match track.status {
        ClipStatus::Success => PhaseStatus::Success,
        _ => PhaseStatus::Mock,
    };

    info!(mode = %mode, status = %status, "Audio generation complete");

    Ok(PhaseResult::new(
        Phase::AudioGen,
        status,
        PhasePayload::AudioGen(track),
    ))
}

/// Assemble the narration script from scene key messages, falling back
/// to descriptions.
fn narration_script(scenes: &[Scene], brief: &str) -> String {
    if scenes.is_empty() {
        return format!("Here is {brief}.");
    }
    scenes
        .iter()
        .map(|scene| {
            scene
                .key_message
                .clone()
                .unwrap_or_else(|| scene.description.clone())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_prefers_key_messages() {
        let mut first = Scene::planned(1, 10, "Opening", "A model walks in");
        first.key_message = Some("Meet the new collection.".to_string());
        let second = Scene::planned(2, 10, "Main", "Close-up on fabric");

        let script = narration_script(&[first, second], "fashion showcase");
        assert_eq!(script, "Meet the new collection. Close-up on fabric");
    }

    #[test]
    fn empty_scenes_still_produce_a_script() {
        let script = narration_script(&[], "fashion showcase");
        assert!(script.contains("fashion showcase"));
    }

    #[test]
    fn tts_cost_scales_with_script_length() {
        let script = "a".repeat(2000);
        let cost = (script.len() as f64 / 1000.0) * TTS_COST_PER_1000_CHARS;
        assert!((cost - 0.10).abs() < 1e-9);
    }
}
