//! Video generation backend registry.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quality::QualityDimension;

/// Available generation backends with declared cost and strengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VideoBackend {
    /// Realistic motion and human activity, cost-effective default
    #[default]
    Hailuo02,
    /// Creative transitions and dynamic scenes
    RunwayGen3,
    /// Stylized, engagement-oriented visuals
    PikaLabs,
    /// Premium quality and content fidelity
    Veo2,
}

impl VideoBackend {
    pub const ALL: &'static [VideoBackend] = &[
        VideoBackend::Hailuo02,
        VideoBackend::RunwayGen3,
        VideoBackend::PikaLabs,
        VideoBackend::Veo2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoBackend::Hailuo02 => "hailuo-02",
            VideoBackend::RunwayGen3 => "runway-gen3",
            VideoBackend::PikaLabs => "pika-labs",
            VideoBackend::Veo2 => "veo-2",
        }
    }

    /// Unit cost per generated clip in USD.
    pub fn cost_per_clip(&self) -> f64 {
        match self {
            VideoBackend::Hailuo02 => 0.49,
            VideoBackend::RunwayGen3 => 1.20,
            VideoBackend::PikaLabs => 0.80,
            VideoBackend::Veo2 => 2.50,
        }
    }

    /// Quality dimensions this backend is declared strong at.
    pub fn strengths(&self) -> &'static [QualityDimension] {
        match self {
            VideoBackend::Hailuo02 => &[QualityDimension::PlatformOptimization],
            VideoBackend::RunwayGen3 => &[QualityDimension::TechnicalQuality],
            VideoBackend::PikaLabs => &[QualityDimension::EngagementPotential],
            VideoBackend::Veo2 => &[
                QualityDimension::ContentQuality,
                QualityDimension::BrandAlignment,
            ],
        }
    }

    /// Whether this backend's declared strengths cover a quality dimension.
    pub fn covers(&self, dimension: QualityDimension) -> bool {
        self.strengths().contains(&dimension)
    }
}

impl fmt::Display for VideoBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VideoBackend {
    type Err = BackendParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "hailuo-02" | "hailuo02" => Ok(VideoBackend::Hailuo02),
            "runway-gen3" | "runwaygen3" => Ok(VideoBackend::RunwayGen3),
            "pika-labs" | "pikalabs" => Ok(VideoBackend::PikaLabs),
            "veo-2" | "veo2" => Ok(VideoBackend::Veo2),
            _ => Err(BackendParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown generation backend: {0}")]
pub struct BackendParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_registry_names() {
        assert_eq!(
            "hailuo-02".parse::<VideoBackend>().unwrap(),
            VideoBackend::Hailuo02
        );
        assert_eq!(
            "runway_gen3".parse::<VideoBackend>().unwrap(),
            VideoBackend::RunwayGen3
        );
        assert!("sora".parse::<VideoBackend>().is_err());
    }

    #[test]
    fn strengths_cover_expected_dimensions() {
        assert!(VideoBackend::RunwayGen3.covers(QualityDimension::TechnicalQuality));
        assert!(VideoBackend::PikaLabs.covers(QualityDimension::EngagementPotential));
        assert!(VideoBackend::Veo2.covers(QualityDimension::ContentQuality));
        assert!(!VideoBackend::Hailuo02.covers(QualityDimension::TechnicalQuality));
    }

    #[test]
    fn default_backend_is_cheapest_general_purpose() {
        assert_eq!(VideoBackend::default(), VideoBackend::Hailuo02);
        assert!(VideoBackend::Hailuo02.cost_per_clip() < VideoBackend::Veo2.cost_per_clip());
    }
}
