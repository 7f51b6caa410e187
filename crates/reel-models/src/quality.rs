//! Quality assessment report types.

use std::collections::BTreeSet;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Minimum technical quality score.
pub const THRESHOLD_TECHNICAL: f64 = 0.80;
/// Minimum content quality score.
pub const THRESHOLD_CONTENT: f64 = 0.75;
/// Minimum brand alignment score.
pub const THRESHOLD_BRAND: f64 = 0.85;
/// Minimum platform optimization score.
pub const THRESHOLD_PLATFORM: f64 = 0.80;
/// Minimum engagement potential score.
pub const THRESHOLD_ENGAGEMENT: f64 = 0.70;
/// Weighted overall score required to pass.
pub const THRESHOLD_OVERALL_PASS: f64 = 0.76;
/// Overall score below which only a full regeneration makes sense.
pub const THRESHOLD_CRITICAL_FAILURE: f64 = 0.50;

/// Assessed quality dimensions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum QualityDimension {
    /// File integrity, resolution, sync
    TechnicalQuality,
    /// Narrative flow and visual appeal
    ContentQuality,
    /// Voice and messaging consistency
    BrandAlignment,
    /// Format and duration compliance
    PlatformOptimization,
    /// Predicted social performance
    EngagementPotential,
}

impl QualityDimension {
    pub const ALL: &'static [QualityDimension] = &[
        QualityDimension::TechnicalQuality,
        QualityDimension::ContentQuality,
        QualityDimension::BrandAlignment,
        QualityDimension::PlatformOptimization,
        QualityDimension::EngagementPotential,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityDimension::TechnicalQuality => "technical_quality",
            QualityDimension::ContentQuality => "content_quality",
            QualityDimension::BrandAlignment => "brand_alignment",
            QualityDimension::PlatformOptimization => "platform_optimization",
            QualityDimension::EngagementPotential => "engagement_potential",
        }
    }

    /// Weight of this dimension in the overall score. Weights sum to 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            QualityDimension::TechnicalQuality => 0.25,
            QualityDimension::ContentQuality => 0.25,
            QualityDimension::BrandAlignment => 0.20,
            QualityDimension::PlatformOptimization => 0.15,
            QualityDimension::EngagementPotential => 0.15,
        }
    }

    /// Per-dimension minimum score.
    pub fn threshold(&self) -> f64 {
        match self {
            QualityDimension::TechnicalQuality => THRESHOLD_TECHNICAL,
            QualityDimension::ContentQuality => THRESHOLD_CONTENT,
            QualityDimension::BrandAlignment => THRESHOLD_BRAND,
            QualityDimension::PlatformOptimization => THRESHOLD_PLATFORM,
            QualityDimension::EngagementPotential => THRESHOLD_ENGAGEMENT,
        }
    }
}

impl fmt::Display for QualityDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw per-dimension scores in [0,1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct DimensionScores {
    pub technical_quality: f64,
    pub content_quality: f64,
    pub brand_alignment: f64,
    pub platform_optimization: f64,
    pub engagement_potential: f64,
}

impl DimensionScores {
    /// Uniform scores across all dimensions.
    pub fn uniform(score: f64) -> Self {
        Self {
            technical_quality: score,
            content_quality: score,
            brand_alignment: score,
            platform_optimization: score,
            engagement_potential: score,
        }
    }

    pub fn get(&self, dimension: QualityDimension) -> f64 {
        match dimension {
            QualityDimension::TechnicalQuality => self.technical_quality,
            QualityDimension::ContentQuality => self.content_quality,
            QualityDimension::BrandAlignment => self.brand_alignment,
            QualityDimension::PlatformOptimization => self.platform_optimization,
            QualityDimension::EngagementPotential => self.engagement_potential,
        }
    }

    /// Clamp every score into [0,1].
    pub fn clamped(mut self) -> Self {
        for dim in QualityDimension::ALL {
            let v = self.get(*dim).clamp(0.0, 1.0);
            self.set(*dim, v);
        }
        self
    }

    fn set(&mut self, dimension: QualityDimension, value: f64) {
        match dimension {
            QualityDimension::TechnicalQuality => self.technical_quality = value,
            QualityDimension::ContentQuality => self.content_quality = value,
            QualityDimension::BrandAlignment => self.brand_alignment = value,
            QualityDimension::PlatformOptimization => self.platform_optimization = value,
            QualityDimension::EngagementPotential => self.engagement_potential = value,
        }
    }
}

/// Overall pass/fail outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    Pass,
    Fail,
}

impl PassStatus {
    pub fn is_pass(&self) -> bool {
        matches!(self, PassStatus::Pass)
    }
}

/// Coarse quality grade derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Excellent,
    Good,
    Acceptable,
    NeedsImprovement,
    Poor,
}

impl QualityGrade {
    fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            QualityGrade::Excellent
        } else if score >= 0.8 {
            QualityGrade::Good
        } else if score >= THRESHOLD_OVERALL_PASS {
            QualityGrade::Acceptable
        } else if score >= 0.6 {
            QualityGrade::NeedsImprovement
        } else {
            QualityGrade::Poor
        }
    }
}

/// Result of one quality assessment pass.
///
/// Passing requires the weighted overall score to clear
/// [`THRESHOLD_OVERALL_PASS`] AND every dimension to clear its own
/// minimum; any dimension below threshold joins `failed_criteria`
/// regardless of the overall score.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QualityReport {
    /// Per-dimension scores, clamped to [0,1]
    pub scores: DimensionScores,

    /// Weighted convex combination of the dimension scores
    pub overall_score: f64,

    /// Pass/fail outcome
    pub pass_status: PassStatus,

    /// Dimensions below their per-dimension minimum
    pub failed_criteria: BTreeSet<QualityDimension>,

    /// Coarse grade for reporting
    pub grade: QualityGrade,
}

impl QualityReport {
    /// Build a report from raw dimension scores.
    pub fn from_scores(scores: DimensionScores) -> Self {
        let scores = scores.clamped();

        let overall_score: f64 = QualityDimension::ALL
            .iter()
            .map(|dim| scores.get(*dim) * dim.weight())
            .sum();

        let failed_criteria: BTreeSet<QualityDimension> = QualityDimension::ALL
            .iter()
            .copied()
            .filter(|dim| scores.get(*dim) < dim.threshold())
            .collect();

        let pass_status = if overall_score >= THRESHOLD_OVERALL_PASS && failed_criteria.is_empty() {
            PassStatus::Pass
        } else {
            PassStatus::Fail
        };

        Self {
            scores,
            overall_score,
            pass_status,
            failed_criteria,
            grade: QualityGrade::from_score(overall_score),
        }
    }

    /// Whether the overall score is below the critical-failure line.
    pub fn is_critical_failure(&self) -> bool {
        self.overall_score < THRESHOLD_CRITICAL_FAILURE
    }

    /// Worst-scoring failed dimension, if any.
    pub fn worst_failed_dimension(&self) -> Option<QualityDimension> {
        self.failed_criteria
            .iter()
            .copied()
            .min_by(|a, b| {
                self.scores
                    .get(*a)
                    .partial_cmp(&self.scores.get(*b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}
