//! Scenes, storyboards and scene timing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::platform::{ContentCategory, ContentMode, REEL_RESOLUTION};

/// Technical generation parameters for one scene.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TechnicalParams {
    /// Output resolution, e.g. "1080x1920"
    pub resolution: String,
    /// Clip duration in seconds
    pub duration_seconds: u32,
    /// Visual style hint passed to the backend
    pub style: String,
}

impl TechnicalParams {
    /// Default vertical-reel parameters for a given duration.
    pub fn vertical(duration_seconds: u32) -> Self {
        Self {
            resolution: REEL_RESOLUTION.to_string(),
            duration_seconds,
            style: "cinematic".to_string(),
        }
    }
}

/// One timed, described segment of the target reel.
///
/// Created by planning, enriched by refinement, consumed 1:1 by
/// video generation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// 1-based position in the storyboard
    pub scene_number: u32,

    /// Allocated duration in seconds
    pub duration_seconds: u32,

    /// Short scene title
    pub title: String,

    /// What happens in the scene
    pub description: String,

    /// Core message the scene should land
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_message: Option<String>,

    /// Model-ready prompt, filled in by refinement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_prompt: Option<String>,

    /// Backend recommendation from refinement (free text, validated
    /// against the registry at selection time)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_backend: Option<String>,

    /// Generation parameters
    pub technical_params: TechnicalParams,
}

impl Scene {
    /// Create a planned scene without refinement data.
    pub fn planned(
        scene_number: u32,
        duration_seconds: u32,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            scene_number,
            duration_seconds,
            title: title.into(),
            description: description.into(),
            key_message: None,
            enhanced_prompt: None,
            recommended_backend: None,
            technical_params: TechnicalParams::vertical(duration_seconds),
        }
    }

    /// Prompt to send to the generation backend: the enhanced prompt when
    /// refinement produced one, the raw description otherwise.
    pub fn generation_prompt(&self) -> &str {
        self.enhanced_prompt.as_deref().unwrap_or(&self.description)
    }
}

/// Visual style guidelines for the whole reel.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VisualStyle {
    pub color_palette: String,
    pub aesthetic_mood: String,
    pub engagement_hooks: String,
}

impl Default for VisualStyle {
    fn default() -> Self {
        Self {
            color_palette: "vibrant".to_string(),
            aesthetic_mood: "engaging".to_string(),
            engagement_hooks: "visual_variety".to_string(),
        }
    }
}

/// Output of the planning phase.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoryboardPlan {
    /// Classified content category
    pub category: ContentCategory,

    /// Mode the planner recommends for this brief
    pub recommended_mode: ContentMode,

    /// Mode actually used (the user's request wins)
    pub selected_mode: ContentMode,

    /// Rationale for the recommendation
    pub mode_rationale: String,

    /// Total storyboard duration in seconds
    pub total_duration: u32,

    /// Ordered scenes; durations sum to `total_duration`
    pub scenes: Vec<Scene>,

    /// Style guidelines
    pub visual_style: VisualStyle,
}

impl StoryboardPlan {
    /// Sum of scene durations.
    pub fn scenes_duration(&self) -> u32 {
        self.scenes.iter().map(|s| s.duration_seconds).sum()
    }
}

/// Split a total duration into per-scene durations.
///
/// Short reels get two scenes with a slightly longer opener; everything
/// else gets three scenes with the integer remainder going to the first
/// and last scene. The split is exact: the parts always sum to `total`.
pub fn split_scene_durations(total: u32, scene_count: Option<usize>) -> Vec<u32> {
    let count = scene_count.unwrap_or(if total <= 15 { 2 } else { 3 });

    match count {
        0 | 1 => vec![total],
        2 => {
            let first = (f64::from(total) * 0.55) as u32;
            vec![first, total - first]
        }
        3 => {
            let base = total / 3;
            let mut remainder = total % 3;
            let mut scenes = [base; 3];
            if remainder > 0 {
                scenes[0] += 1;
                remainder -= 1;
            }
            if remainder > 0 {
                scenes[2] += 1;
            }
            scenes.to_vec()
        }
        n => {
            let base = total / n as u32;
            let remainder = (total % n as u32) as usize;
            let mut scenes = vec![base; n];
            for slot in scenes.iter_mut().take(remainder) {
                *slot += 1;
            }
            scenes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifteen_seconds_splits_into_two_scenes() {
        let split = split_scene_durations(15, None);
        assert_eq!(split.len(), 2);
        assert_eq!(split.iter().sum::<u32>(), 15);
        assert!(split[0] >= split[1]);
    }

    #[test]
    fn thirty_seconds_splits_into_three_exact_scenes() {
        assert_eq!(split_scene_durations(30, None), vec![10, 10, 10]);
    }

    #[test]
    fn twenty_seconds_distributes_remainder_first_then_last() {
        // 20 = 6+6+6 with 2 left over: first and last scene each get one
        assert_eq!(split_scene_durations(20, None), vec![7, 6, 7]);
    }

    #[test]
    fn explicit_scene_count_is_honored() {
        let split = split_scene_durations(30, Some(4));
        assert_eq!(split.len(), 4);
        assert_eq!(split.iter().sum::<u32>(), 30);
    }

    #[test]
    fn split_always_sums_to_total() {
        for total in 5..=60 {
            let split = split_scene_durations(total, None);
            assert_eq!(split.iter().sum::<u32>(), total, "total={total}");
        }
    }

    #[test]
    fn generation_prompt_prefers_enhanced() {
        let mut scene = Scene::planned(1, 10, "Opening", "A model walks a runway");
        assert_eq!(scene.generation_prompt(), "A model walks a runway");
        scene.enhanced_prompt = Some("Cinematic runway walk, 35mm".to_string());
        assert_eq!(scene.generation_prompt(), "Cinematic runway walk, 35mm");
    }
}
