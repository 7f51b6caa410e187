//! Phase 1: content planning.
//!
//! Classifies the brief, settles the content mode, splits scene timing
//! and drafts the storyboard. The text service enriches scene copy when
//! it is available; the deterministic template below is both the
//! offline path and the structural fallback.

use serde::Deserialize;
use tracing::{info, warn};

use reel_genai::{extract_json, Extracted};
use reel_models::{
    split_scene_durations, ContentCategory, Phase, PhasePayload, PhaseResult, PhaseStatus,
    PipelineContext, Scene, StoryboardPlan, VisualStyle,
};

use crate::context::RunContext;
use crate::error::PipelineResult;

/// Scene copy drafted by the text service.
#[derive(Debug, Deserialize)]
struct DraftScene {
    title: String,
    description: String,
    #[serde(default)]
    key_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DraftStoryboard {
    scenes: Vec<DraftScene>,
}

/// Run the planning phase.
pub async fn run(ctx: &RunContext) -> PipelineResult<PhaseResult> {
    let mut plan = template_storyboard(&ctx.pipeline);
    let mut status = PhaseStatus::Success;
    let mut error = None;

    if ctx.text_client.is_available() {
        match draft_with_text_service(ctx, &plan).await {
            Ok(Some(draft)) => apply_draft(&mut plan, draft),
            Ok(None) => {
                warn!("Text service returned prose without JSON, keeping template storyboard");
                status = PhaseStatus::Partial;
                error = Some("storyboard draft was not structured".to_string());
            }
            Err(e) => {
                warn!(error = %e, "Storyboard draft failed, keeping template storyboard");
                status = PhaseStatus::Partial;
                error = Some(e.to_string());
            }
        }
    }

    info!(
        category = %plan.category,
        mode = %plan.selected_mode,
        scenes = plan.scenes.len(),
        total = plan.total_duration,
        "Planning complete"
    );

    let mut result = PhaseResult::new(Phase::Planning, status, PhasePayload::Planning(plan));
    result.error = error;
    Ok(result)
}

/// Deterministic storyboard built from the brief alone.
///
/// Also used by the recovery coordinator as the schema-complete
/// planning fallback.
pub(crate) fn template_storyboard(pipeline: &PipelineContext) -> StoryboardPlan {
    let category = ContentCategory::classify(&pipeline.brief);
    let (recommended_mode, rationale) = category.suggest_mode(&pipeline.brief);

    let durations = split_scene_durations(pipeline.target_duration, None);
    let scenes: Vec<Scene> = durations
        .iter()
        .enumerate()
        .map(|(idx, &duration)| {
            let number = idx as u32 + 1;
            let (title, description, key_message) =
                scene_copy(number, durations.len(), &pipeline.brief);
            let mut scene = Scene::planned(number, duration, title, description);
            scene.key_message = Some(key_message);
            scene
        })
        .collect();

    StoryboardPlan {
        category,
        recommended_mode,
        selected_mode: pipeline.content_mode,
        mode_rationale: rationale.to_string(),
        total_duration: pipeline.target_duration,
        scenes,
        visual_style: VisualStyle::default(),
    }
}

fn scene_copy(number: u32, total: usize, brief: &str) -> (String, String, String) {
    let last = number as usize == total;
    if number == 1 {
        (
            "Opening".to_string(),
            format!("Opening hook introducing {brief}"),
            "Grab attention in the first seconds".to_string(),
        )
    } else if last {
        (
            "Conclusion".to_string(),
            format!("Closing moment with a call to action for {brief}"),
            "Leave a clear takeaway".to_string(),
        )
    } else {
        (
            "Main Content".to_string(),
            format!("Main showcase of {brief}"),
            "Deliver the core of the story".to_string(),
        )
    }
}

async fn draft_with_text_service(
    ctx: &RunContext,
    plan: &StoryboardPlan,
) -> PipelineResult<Option<DraftStoryboard>> {
    let instructions = format!(
        "Draft a storyboard for a {duration}s vertical {platform} reel. \
         Return ONLY a JSON object: {{\"scenes\": [{{\"title\": \"...\", \
         \"description\": \"...\", \"key_message\": \"...\"}}]}} with exactly \
         {count} scenes.",
        duration = plan.total_duration,
        platform = ctx.pipeline.platform,
        count = plan.scenes.len(),
    );
    let context = format!(
        "Brief: {}\nCategory: {}\nContent mode: {}",
        ctx.pipeline.brief, plan.category, plan.selected_mode
    );

    let text = ctx.text_client.generate(&instructions, &context).await?;
    match extract_json::<DraftStoryboard>(&text) {
        Extracted::Structured(draft) => Ok(Some(draft)),
        Extracted::RawText(_) => Ok(None),
    }
}

/// Overlay drafted copy onto the template, keeping the deterministic
/// timing split.
fn apply_draft(plan: &mut StoryboardPlan, draft: DraftStoryboard) {
    for (scene, drafted) in plan.scenes.iter_mut().zip(draft.scenes) {
        scene.title = drafted.title;
        scene.description = drafted.description;
        if drafted.key_message.is_some() {
            scene.key_message = drafted.key_message;
        }
    }
}
