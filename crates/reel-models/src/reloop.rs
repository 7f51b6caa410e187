//! Reloop strategies and decisions.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::backend::VideoBackend;
use crate::phase::Phase;

/// Relative cost of a remediation strategy, ranked 1 (cheapest) to 5.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CostLevel {
    Minimal,
    Small,
    Variable,
    Moderate,
    Full,
}

impl CostLevel {
    /// Numeric rank used in cost/benefit ratios.
    pub fn rank(&self) -> u8 {
        match self {
            CostLevel::Minimal => 1,
            CostLevel::Small => 2,
            CostLevel::Variable => 3,
            CostLevel::Moderate => 4,
            CostLevel::Full => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CostLevel::Minimal => "minimal",
            CostLevel::Small => "small",
            CostLevel::Variable => "variable",
            CostLevel::Moderate => "moderate",
            CostLevel::Full => "full",
        }
    }
}

impl fmt::Display for CostLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The five escalating remediation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReloopStrategy {
    /// Technical fixes during re-synchronization
    ParameterAdjustment,
    /// Re-run refinement with improved prompts
    PromptRefinement,
    /// Regenerate video with a different backend
    ModelSwitch,
    /// Redesign the storyboard structure
    ContentRestructure,
    /// Restart the whole pipeline
    CompleteRegeneration,
}

impl ReloopStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReloopStrategy::ParameterAdjustment => "parameter_adjustment",
            ReloopStrategy::PromptRefinement => "prompt_refinement",
            ReloopStrategy::ModelSwitch => "model_switch",
            ReloopStrategy::ContentRestructure => "content_restructure",
            ReloopStrategy::CompleteRegeneration => "complete_regeneration",
        }
    }

    /// Transition table: the phase this strategy re-enters.
    pub fn target_phase(&self) -> Phase {
        match self {
            ReloopStrategy::ParameterAdjustment => Phase::Sync,
            ReloopStrategy::PromptRefinement => Phase::Refinement,
            ReloopStrategy::ModelSwitch => Phase::VideoGen,
            ReloopStrategy::ContentRestructure => Phase::Planning,
            ReloopStrategy::CompleteRegeneration => Phase::Planning,
        }
    }

    /// Declared cost level of this strategy.
    pub fn cost_level(&self) -> CostLevel {
        match self {
            ReloopStrategy::ParameterAdjustment => CostLevel::Minimal,
            ReloopStrategy::PromptRefinement => CostLevel::Small,
            ReloopStrategy::ModelSwitch => CostLevel::Variable,
            ReloopStrategy::ContentRestructure => CostLevel::Moderate,
            ReloopStrategy::CompleteRegeneration => CostLevel::Full,
        }
    }

    /// Fixed score improvement estimate for cost/benefit analysis.
    pub fn estimated_improvement(&self) -> f64 {
        match self {
            ReloopStrategy::ParameterAdjustment => 0.05,
            ReloopStrategy::PromptRefinement => 0.10,
            ReloopStrategy::ModelSwitch => 0.08,
            ReloopStrategy::ContentRestructure => 0.15,
            ReloopStrategy::CompleteRegeneration => 0.25,
        }
    }

    /// How confident the engine is that this strategy addresses the failure.
    pub fn confidence(&self) -> f64 {
        match self {
            ReloopStrategy::ParameterAdjustment => 0.80,
            ReloopStrategy::PromptRefinement => 0.85,
            ReloopStrategy::ModelSwitch => 0.70,
            ReloopStrategy::ContentRestructure => 0.75,
            ReloopStrategy::CompleteRegeneration => 0.90,
        }
    }
}

impl fmt::Display for ReloopStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision derived from a failed quality report.
///
/// Exists only when the report failed; not persisted beyond the
/// iteration it was made for.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReloopDecision {
    /// Selected remediation strategy
    pub strategy: ReloopStrategy,

    /// Phase the pipeline re-enters
    pub target_phase: Phase,

    /// Engine confidence in [0,1]
    pub confidence: f64,

    /// Declared cost of the strategy
    pub estimated_cost: CostLevel,

    /// Projected overall-score improvement
    pub estimated_improvement: f64,

    /// Projected benefit per unit of cost
    pub cost_benefit_ratio: f64,

    /// Backend to switch to, set only for model_switch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_backend: Option<VideoBackend>,

    /// Why this strategy was chosen
    pub reasoning: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_levels_are_strictly_ordered() {
        let ranks: Vec<u8> = [
            CostLevel::Minimal,
            CostLevel::Small,
            CostLevel::Variable,
            CostLevel::Moderate,
            CostLevel::Full,
        ]
        .iter()
        .map(|c| c.rank())
        .collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn transition_table_matches_strategy_semantics() {
        assert_eq!(
            ReloopStrategy::ParameterAdjustment.target_phase(),
            Phase::Sync
        );
        assert_eq!(
            ReloopStrategy::PromptRefinement.target_phase(),
            Phase::Refinement
        );
        assert_eq!(ReloopStrategy::ModelSwitch.target_phase(), Phase::VideoGen);
        assert_eq!(
            ReloopStrategy::ContentRestructure.target_phase(),
            Phase::Planning
        );
        assert_eq!(
            ReloopStrategy::CompleteRegeneration.target_phase(),
            Phase::Planning
        );
    }

    #[test]
    fn bigger_improvements_cost_more() {
        // Improvement estimates grow with cost rank, except model_switch
        // whose benefit depends on the backend picked
        assert!(
            ReloopStrategy::CompleteRegeneration.estimated_improvement()
                > ReloopStrategy::ContentRestructure.estimated_improvement()
        );
        assert!(
            ReloopStrategy::ContentRestructure.estimated_improvement()
                > ReloopStrategy::PromptRefinement.estimated_improvement()
        );
        assert!(
            ReloopStrategy::PromptRefinement.estimated_improvement()
                > ReloopStrategy::ParameterAdjustment.estimated_improvement()
        );
    }
}
