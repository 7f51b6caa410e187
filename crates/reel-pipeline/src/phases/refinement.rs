//! Phase 2: prompt refinement.
//!
//! Turns planned scene descriptions into model-ready prompts. The text
//! service refines when available; the deterministic template keeps the
//! pipeline moving without it.

use serde::Deserialize;
use tracing::{info, warn};

use reel_genai::{extract_json, Extracted};
use reel_models::{Phase, PhasePayload, PhaseResult, PhaseStatus, Scene, StoryboardPlan};

use crate::context::RunContext;
use crate::error::{PipelineError, PipelineResult};
use crate::orchestrator::RunState;

#[derive(Debug, Deserialize)]
struct RefinedPrompt {
    scene_number: u32,
    enhanced_prompt: String,
    #[serde(default)]
    recommended_backend: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefinedPrompts {
    refined_prompts: Vec<RefinedPrompt>,
}

/// Run the refinement phase.
pub async fn run(ctx: &RunContext, state: &RunState) -> PipelineResult<PhaseResult> {
    let plan = state
        .storyboard
        .as_ref()
        .ok_or_else(|| PipelineError::missing_data("refinement requires a storyboard"))?;

    let mut scenes = template_refinement(plan);
    let mut status = PhaseStatus::Success;
    let mut error = None;

    if ctx.text_client.is_available() {
        match refine_with_text_service(ctx, plan).await {
            Ok(Some(refined)) => apply_refinement(&mut scenes, refined),
            Ok(None) => {
                warn!("Refinement response was not structured, keeping template prompts");
                status = PhaseStatus::Partial;
                error = Some("refinement response was not structured".to_string());
            }
            Err(e) => {
                warn!(error = %e, "Prompt refinement failed, keeping template prompts");
                status = PhaseStatus::Partial;
                error = Some(e.to_string());
            }
        }
    }

    info!(scenes = scenes.len(), status = %status, "Refinement complete");

    let mut result = PhaseResult::new(Phase::Refinement, status, PhasePayload::Refinement { scenes });
    result.error = error;
    Ok(result)
}

/// Deterministic prompt enhancement applied to every planned scene.
///
/// Also the schema-complete refinement fallback used by recovery.
pub(crate) fn template_refinement(plan: &StoryboardPlan) -> Vec<Scene> {
    plan.scenes
        .iter()
        .map(|scene| {
            let mut refined = scene.clone();
            refined.enhanced_prompt = Some(format!(
                "High-quality cinematic {}, professional lighting, smooth camera movement, \
                 {} vertical format, {} style",
                scene.description,
                scene.technical_params.resolution,
                scene.technical_params.style,
            ));
            refined
        })
        .collect()
}

async fn refine_with_text_service(
    ctx: &RunContext,
    plan: &StoryboardPlan,
) -> PipelineResult<Option<RefinedPrompts>> {
    let instructions = "Refine each scene description into a professional video generation \
        prompt. Return ONLY a JSON object: {\"refined_prompts\": [{\"scene_number\": 1, \
        \"enhanced_prompt\": \"...\", \"recommended_backend\": \"hailuo-02|runway-gen3|\
        pika-labs|veo-2\"}]} with one entry per scene.";

    let context = serde_json::to_string(&plan.scenes)?;
    let text = ctx.text_client.generate(instructions, &context).await?;

    match extract_json::<RefinedPrompts>(&text) {
        Extracted::Structured(refined) => Ok(Some(refined)),
        Extracted::RawText(_) => Ok(None),
    }
}

fn apply_refinement(scenes: &mut [Scene], refined: RefinedPrompts) {
    for prompt in refined.refined_prompts {
        if let Some(scene) = scenes
            .iter_mut()
            .find(|s| s.scene_number == prompt.scene_number)
        {
            if !prompt.enhanced_prompt.trim().is_empty() {
                scene.enhanced_prompt = Some(prompt.enhanced_prompt);
            }
            scene.recommended_backend = prompt.recommended_backend;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::planning::template_storyboard;
    use reel_models::{ContentMode, PipelineContext, Platform};

    fn plan() -> StoryboardPlan {
        template_storyboard(&PipelineContext::new(
            "30s fashion showcase",
            Platform::Instagram,
            30,
            ContentMode::Music,
            "/tmp/run",
        ))
    }

    #[test]
    fn template_refinement_fills_every_prompt() {
        let scenes = template_refinement(&plan());
        assert_eq!(scenes.len(), 3);
        for scene in &scenes {
            let prompt = scene.enhanced_prompt.as_deref().unwrap();
            assert!(prompt.contains("cinematic"));
            assert!(prompt.contains("1080x1920"));
        }
    }

    #[test]
    fn template_refinement_preserves_durations() {
        let plan = plan();
        let scenes = template_refinement(&plan);
        let total: u32 = scenes.iter().map(|s| s.duration_seconds).sum();
        assert_eq!(total, plan.total_duration);
    }

    #[test]
    fn refinement_overlay_matches_by_scene_number() {
        let mut scenes = template_refinement(&plan());
        apply_refinement(
            &mut scenes,
            RefinedPrompts {
                refined_prompts: vec![RefinedPrompt {
                    scene_number: 2,
                    enhanced_prompt: "Slow dolly over fabric texture".to_string(),
                    recommended_backend: Some("veo-2".to_string()),
                }],
            },
        );
        assert_eq!(
            scenes[1].enhanced_prompt.as_deref(),
            Some("Slow dolly over fabric texture")
        );
        assert_eq!(scenes[1].recommended_backend.as_deref(), Some("veo-2"));
        // Untouched scenes keep the template prompt
        assert!(scenes[0]
            .enhanced_prompt
            .as_deref()
            .unwrap()
            .contains("cinematic"));
    }
}
