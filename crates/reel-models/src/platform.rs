//! Platform specifications and content classification.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target resolution for vertical reels.
pub const REEL_RESOLUTION: &str = "1080x1920";
/// Reel frame width in pixels.
pub const REEL_WIDTH: u32 = 1080;
/// Reel frame height in pixels.
pub const REEL_HEIGHT: u32 = 1920;
/// Vertical aspect ratio string.
pub const REEL_ASPECT_RATIO: &str = "9:16";

/// Target social media platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Instagram,
    Tiktok,
    Facebook,
}

impl Platform {
    pub const ALL: &'static [Platform] = &[Platform::Instagram, Platform::Tiktok, Platform::Facebook];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Facebook => "facebook",
        }
    }

    /// Acceptable duration range (seconds) for the platform's reel format.
    pub fn duration_range(&self) -> (u32, u32) {
        match self {
            Platform::Instagram => (15, 30),
            Platform::Tiktok => (9, 21),
            Platform::Facebook => (15, 60),
        }
    }

    /// Whether a duration sits inside the platform's optimal window.
    pub fn is_optimal_duration(&self, duration: u32) -> bool {
        let (min, max) = self.duration_range();
        (min..=max).contains(&duration)
    }

    /// Baseline engagement expectation used by the engagement predictor.
    pub fn engagement_base(&self) -> f64 {
        match self {
            Platform::Instagram => 0.70,
            Platform::Tiktok => 0.75,
            Platform::Facebook => 0.65,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::Tiktok),
            "facebook" => Ok(Platform::Facebook),
            _ => Err(PlatformParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown platform: {0}")]
pub struct PlatformParseError(String);

/// Audio mode for the generated reel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    /// Background music under the visuals
    #[default]
    Music,
    /// Spoken narration track
    Narration,
}

impl ContentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentMode::Music => "music",
            ContentMode::Narration => "narration",
        }
    }
}

impl fmt::Display for ContentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContentMode {
    type Err = ContentModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "music" => Ok(ContentMode::Music),
            "narration" => Ok(ContentMode::Narration),
            _ => Err(ContentModeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown content mode: {0}")]
pub struct ContentModeParseError(String);

/// Coarse content category derived from the brief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    Educational,
    Fashion,
    Food,
    Fitness,
    Business,
    Lifestyle,
}

impl ContentCategory {
    /// Classify a brief into a content category via keyword heuristics.
    pub fn classify(brief: &str) -> Self {
        let lower = brief.to_lowercase();

        const EDUCATIONAL: &[&str] = &[
            "tutorial", "how to", "learn", "guide", "tips", "explain", "teach", "step", "process",
        ];
        const FASHION: &[&str] = &[
            "fashion", "style", "outfit", "look", "wear", "trend", "clothing", "brand showcase",
        ];
        const FOOD: &[&str] = &[
            "food", "cooking", "recipe", "kitchen", "meal", "dish", "ingredient", "restaurant",
        ];
        const FITNESS: &[&str] = &[
            "fitness", "workout", "exercise", "health", "gym", "training", "motivation",
        ];
        const BUSINESS: &[&str] = &[
            "business", "professional", "corporate", "startup", "marketing", "sales",
        ];

        let matches = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        if matches(EDUCATIONAL) {
            ContentCategory::Educational
        } else if matches(FASHION) {
            ContentCategory::Fashion
        } else if matches(FOOD) {
            ContentCategory::Food
        } else if matches(FITNESS) {
            ContentCategory::Fitness
        } else if matches(BUSINESS) {
            ContentCategory::Business
        } else {
            ContentCategory::Lifestyle
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Educational => "educational",
            ContentCategory::Fashion => "fashion",
            ContentCategory::Food => "food",
            ContentCategory::Fitness => "fitness",
            ContentCategory::Business => "business",
            ContentCategory::Lifestyle => "lifestyle",
        }
    }

    /// Suggest a content mode for this category and brief.
    ///
    /// Visual-showcase briefs prefer music even when they contain
    /// explanation keywords, matching how briefs are actually phrased.
    pub fn suggest_mode(&self, brief: &str) -> (ContentMode, &'static str) {
        let lower = brief.to_lowercase();

        if *self == ContentCategory::Educational {
            return (
                ContentMode::Narration,
                "Educational content benefits from clear explanations",
            );
        }

        const VISUAL: &[&str] = &[
            "showcase", "display", "show", "reveal", "transformation", "before/after", "brand",
        ];
        if VISUAL.iter().any(|k| lower.contains(k)) {
            return (
                ContentMode::Music,
                "Visual storytelling is enhanced by background music",
            );
        }

        const COMPLEX: &[&str] = &[
            "explain", "why", "how", "process", "method", "technique", "analysis", "tutorial",
        ];
        if COMPLEX.iter().any(|k| lower.contains(k)) {
            return (
                ContentMode::Narration,
                "Complex topics require verbal explanation for clarity",
            );
        }

        match self {
            ContentCategory::Business => (
                ContentMode::Narration,
                "Business content often requires clear communication",
            ),
            ContentCategory::Fashion => (
                ContentMode::Music,
                "Fashion content is highly visual and benefits from music",
            ),
            ContentCategory::Food => (
                ContentMode::Music,
                "Food visuals are enhanced by atmospheric music",
            ),
            ContentCategory::Fitness => (
                ContentMode::Music,
                "Fitness content works well with energetic background music",
            ),
            _ => (
                ContentMode::Music,
                "Lifestyle content benefits from mood-setting music",
            ),
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
