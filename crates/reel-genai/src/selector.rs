//! Backend selection and cost estimation.

use std::collections::BTreeMap;

use tracing::debug;

use reel_models::phase::BackendUsage;
use reel_models::{ContentCategory, QualityDimension, Scene, VideoBackend};

/// Cost estimate for a set of scenes.
#[derive(Debug, Clone)]
pub struct CostEstimate {
    pub total: f64,
    pub per_backend: BTreeMap<VideoBackend, BackendUsage>,
}

/// Picks a generation backend per scene.
///
/// Priority order: an explicit recommendation naming a registry entry,
/// then content heuristics, then the fixed default.
#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    default_backend: VideoBackend,
}

impl ModelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the backend for one scene.
    pub fn select_backend(&self, scene: &Scene, category: ContentCategory) -> VideoBackend {
        // 1. Explicit recommendation, if it names a known backend
        if let Some(recommended) = scene.recommended_backend.as_deref() {
            if let Ok(backend) = recommended.parse::<VideoBackend>() {
                debug!(scene = scene.scene_number, backend = %backend, "Using recommended backend");
                return backend;
            }
            debug!(
                scene = scene.scene_number,
                recommended, "Recommendation does not match the registry, falling through"
            );
        }

        // 2. Content heuristics: scene texture first, then category
        let text = format!(
            "{} {} {}",
            scene.title,
            scene.description,
            scene.technical_params.style
        )
        .to_lowercase();

        if ["transition", "dynamic", "fast cuts", "fast-paced"]
            .iter()
            .any(|k| text.contains(k))
        {
            return VideoBackend::RunwayGen3;
        }
        if ["artistic", "stylized", "abstract", "surreal"]
            .iter()
            .any(|k| text.contains(k))
        {
            return VideoBackend::PikaLabs;
        }
        if ["premium", "luxury", "flagship"].iter().any(|k| text.contains(k)) {
            return VideoBackend::Veo2;
        }

        match category {
            // Realistic human activity renders best on the default model
            ContentCategory::Educational | ContentCategory::Fitness => VideoBackend::Hailuo02,
            ContentCategory::Business => VideoBackend::Veo2,
            _ => self.default_backend,
        }
    }

    /// Backend whose declared strengths cover a failed quality dimension.
    pub fn backend_for_dimension(&self, dimension: QualityDimension) -> VideoBackend {
        VideoBackend::ALL
            .iter()
            .copied()
            .find(|b| b.covers(dimension))
            .unwrap_or(VideoBackend::RunwayGen3)
    }

    /// Estimate generation cost across scenes with a per-backend breakdown.
    pub fn estimate_cost(&self, scenes: &[Scene], category: ContentCategory) -> CostEstimate {
        let mut per_backend: BTreeMap<VideoBackend, BackendUsage> = BTreeMap::new();
        let mut total = 0.0;

        for scene in scenes {
            let backend = self.select_backend(scene, category);
            let cost = backend.cost_per_clip();
            total += cost;
            let usage = per_backend.entry(backend).or_default();
            usage.clips += 1;
            usage.cost += cost;
        }

        CostEstimate { total, per_backend }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_with(description: &str, recommended: Option<&str>) -> Scene {
        let mut scene = Scene::planned(1, 10, "Scene", description);
        scene.recommended_backend = recommended.map(str::to_string);
        scene
    }

    #[test]
    fn explicit_recommendation_wins() {
        let selector = ModelSelector::new();
        let scene = scene_with("a calm lake", Some("veo-2"));
        assert_eq!(
            selector.select_backend(&scene, ContentCategory::Lifestyle),
            VideoBackend::Veo2
        );
    }

    #[test]
    fn unknown_recommendation_falls_through_to_heuristics() {
        let selector = ModelSelector::new();
        let scene = scene_with("dynamic transition montage", Some("sora-9000"));
        assert_eq!(
            selector.select_backend(&scene, ContentCategory::Lifestyle),
            VideoBackend::RunwayGen3
        );
    }

    #[test]
    fn stylized_scenes_pick_the_artistic_backend() {
        let selector = ModelSelector::new();
        let scene = scene_with("stylized neon dreamscape", None);
        assert_eq!(
            selector.select_backend(&scene, ContentCategory::Lifestyle),
            VideoBackend::PikaLabs
        );
    }

    #[test]
    fn business_category_picks_premium_backend() {
        let selector = ModelSelector::new();
        let scene = scene_with("executive walks into the office", None);
        assert_eq!(
            selector.select_backend(&scene, ContentCategory::Business),
            VideoBackend::Veo2
        );
    }

    #[test]
    fn plain_scenes_use_the_default() {
        let selector = ModelSelector::new();
        let scene = scene_with("a model poses in sunlight", None);
        assert_eq!(
            selector.select_backend(&scene, ContentCategory::Fashion),
            VideoBackend::Hailuo02
        );
    }

    #[test]
    fn dimension_lookup_finds_covering_backend() {
        let selector = ModelSelector::new();
        assert_eq!(
            selector.backend_for_dimension(QualityDimension::TechnicalQuality),
            VideoBackend::RunwayGen3
        );
        assert_eq!(
            selector.backend_for_dimension(QualityDimension::EngagementPotential),
            VideoBackend::PikaLabs
        );
    }

    #[test]
    fn cost_estimate_sums_unit_costs_with_breakdown() {
        let selector = ModelSelector::new();
        let scenes = vec![
            scene_with("a model poses", None),
            scene_with("dynamic transition sweep", None),
            scene_with("closing look", None),
        ];
        let estimate = selector.estimate_cost(&scenes, ContentCategory::Fashion);

        // 2x hailuo-02 + 1x runway-gen3
        let expected = 2.0 * VideoBackend::Hailuo02.cost_per_clip() + VideoBackend::RunwayGen3.cost_per_clip();
        assert!((estimate.total - expected).abs() < 1e-9);
        assert_eq!(estimate.per_backend[&VideoBackend::Hailuo02].clips, 2);
        assert_eq!(estimate.per_backend[&VideoBackend::RunwayGen3].clips, 1);
    }
}
