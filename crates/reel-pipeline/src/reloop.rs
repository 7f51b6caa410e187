//! Reloop strategy engine.
//!
//! Turns a failed quality report into the cheapest remediation the
//! score warrants, as an explicit first-match decision list.

use tracing::info;

use reel_genai::ModelSelector;
use reel_models::{
    QualityDimension, QualityReport, ReloopDecision, ReloopStrategy, THRESHOLD_CRITICAL_FAILURE,
};

/// Number of failed dimensions treated as a structural failure.
const STRUCTURAL_FAILURE_COUNT: usize = 3;

/// Picks a remediation strategy from a failed assessment.
#[derive(Default)]
pub struct ReloopEngine {
    selector: ModelSelector,
}

impl ReloopEngine {
    pub fn new(selector: ModelSelector) -> Self {
        Self { selector }
    }

    /// Decide how to remediate a failed report. Returns `None` iff the
    /// report passed.
    ///
    /// The critical-score guard is evaluated before the per-dimension
    /// rules so a collapsed run always regenerates from scratch instead
    /// of patching one symptom.
    pub fn decide(&self, report: &QualityReport) -> Option<ReloopDecision> {
        if report.pass_status.is_pass() {
            return None;
        }

        let failed = &report.failed_criteria;
        let mut switch_backend = None;

        let (strategy, reasoning) = if report.is_critical_failure() {
            (
                ReloopStrategy::CompleteRegeneration,
                format!(
                    "overall score {:.2} below critical threshold {:.2}",
                    report.overall_score, THRESHOLD_CRITICAL_FAILURE
                ),
            )
        } else if failed.contains(&QualityDimension::TechnicalQuality) {
            (
                ReloopStrategy::ParameterAdjustment,
                "technical issues are resolvable with synchronization parameter fixes".to_string(),
            )
        } else if failed.contains(&QualityDimension::ContentQuality) {
            (
                ReloopStrategy::PromptRefinement,
                "content issues are best addressed through enhanced prompts".to_string(),
            )
        } else if failed.contains(&QualityDimension::EngagementPotential)
            || failed.len() >= STRUCTURAL_FAILURE_COUNT
        {
            (
                ReloopStrategy::ContentRestructure,
                "low engagement requires restructuring the content plan".to_string(),
            )
        } else {
            let dimension = report
                .worst_failed_dimension()
                .unwrap_or(QualityDimension::TechnicalQuality);
            let backend = self.selector.backend_for_dimension(dimension);
            switch_backend = Some(backend);
            (
                ReloopStrategy::ModelSwitch,
                format!("switching to {backend}, whose strengths cover {dimension}"),
            )
        };

        let estimated_improvement = strategy.estimated_improvement();
        let projected = (report.overall_score + estimated_improvement).min(1.0);
        let actual_improvement = projected - report.overall_score;
        let cost = strategy.cost_level();
        let cost_benefit_ratio = (actual_improvement * 10.0) / f64::from(cost.rank());

        let decision = ReloopDecision {
            strategy,
            target_phase: strategy.target_phase(),
            confidence: strategy.confidence(),
            estimated_cost: cost,
            estimated_improvement,
            cost_benefit_ratio,
            switch_backend,
            reasoning,
        };

        info!(
            strategy = %decision.strategy,
            target = %decision.target_phase,
            confidence = decision.confidence,
            "Reloop decision made"
        );
        Some(decision)
    }
}
