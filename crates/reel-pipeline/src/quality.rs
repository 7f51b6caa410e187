//! Quality assessment engine.
//!
//! Scoring sits behind the [`QualityScorer`] trait so the heuristic
//! default can be swapped for real measurement without changing the
//! engine contract.

use std::path::Path;

use tracing::info;

use reel_models::{
    AudioTrack, ContentMode, DimensionScores, GeneratedClip, PipelineContext, QualityReport,
    SyncedReel, REEL_RESOLUTION,
};

/// Everything the scorer may inspect for one assessment.
pub struct ReelArtifact<'a> {
    pub reel: &'a SyncedReel,
    pub clips: &'a [GeneratedClip],
    pub audio: Option<&'a AudioTrack>,
}

/// Pluggable scoring interface.
pub trait QualityScorer: Send + Sync {
    /// Produce raw dimension scores for an artifact. Implementations
    /// must be pure with respect to the artifact: assessing an
    /// unchanged artifact twice yields the same scores.
    fn score(&self, artifact: &ReelArtifact<'_>, ctx: &PipelineContext) -> DimensionScores;
}

/// Default heuristic scorer.
#[derive(Debug, Default)]
pub struct HeuristicScorer;

const MIN_REEL_BYTES: u64 = 100 * 1024;
const MAX_REEL_BYTES: u64 = 100 * 1024 * 1024;

impl HeuristicScorer {
    fn file_integrity(&self, path: &Path) -> f64 {
        let Ok(metadata) = std::fs::metadata(path) else {
            return 0.0;
        };
        if metadata.len() == 0 {
            return 0.0;
        }

        let supported_ext = path
            .extension()
            .map(|e| {
                let e = e.to_string_lossy().to_lowercase();
                e == "mp4" || e == "mov" || e == "avi"
            })
            .unwrap_or(false);
        if !supported_ext {
            return 0.6;
        }

        let mut score = 0.8;
        if metadata.len() < MIN_REEL_BYTES {
            score -= 0.2;
        } else if metadata.len() > MAX_REEL_BYTES {
            score -= 0.1;
        }
        score
    }

    fn resolution_compliance(&self, reel: &SyncedReel) -> f64 {
        if reel.resolution == REEL_RESOLUTION {
            1.0
        } else if reel.resolution == "unknown" {
            0.7
        } else {
            0.6
        }
    }

    fn technical(&self, artifact: &ReelArtifact<'_>) -> f64 {
        let integrity = self.file_integrity(&artifact.reel.file_path);
        let resolution = self.resolution_compliance(artifact.reel);
        let sync = artifact.reel.sync_quality.score();
        integrity * 0.4 + resolution * 0.3 + sync * 0.3
    }

    fn narrative_flow(&self, artifact: &ReelArtifact<'_>) -> f64 {
        let mut score = 0.7;
        let duration = artifact.reel.total_duration;
        if duration < 10 {
            score -= 0.1;
        } else if duration > 35 {
            score -= 0.05;
        }
        let clips = artifact.reel.clips_used;
        if clips < 2 {
            score -= 0.1;
        } else if clips > 5 {
            score -= 0.05;
        }
        score
    }

    fn visual_appeal(&self, artifact: &ReelArtifact<'_>) -> f64 {
        let mut score = 0.6;
        if artifact.reel.enhancements_applied {
            score += 0.15;
        }
        if artifact.reel.transitions_applied {
            score += 0.15;
        }
        score += match artifact.reel.quality_grade.as_str() {
            "professional" => 0.1,
            "high" => 0.05,
            "mock" => 0.05,
            _ => 0.0,
        };
        score
    }

    fn content(&self, artifact: &ReelArtifact<'_>) -> f64 {
        self.narrative_flow(artifact) * 0.6 + self.visual_appeal(artifact) * 0.4
    }

    fn brand(&self, artifact: &ReelArtifact<'_>, ctx: &PipelineContext) -> f64 {
        let mut score = 0.85;

        const BRAND_KEYWORDS: &[&str] = &[
            "brand", "company", "business", "logo", "marketing", "product",
        ];
        let brief = ctx.brief.to_lowercase();
        if BRAND_KEYWORDS.iter().any(|k| brief.contains(k)) {
            // Narration gives tighter control over brand messaging
            if ctx.content_mode == ContentMode::Narration {
                score += 0.05;
            } else {
                score -= 0.02;
            }
        }

        match artifact.reel.quality_grade.as_str() {
            "professional" => score += 0.05,
            "mock" => score -= 0.1,
            _ => {}
        }
        score
    }

    fn platform(&self, artifact: &ReelArtifact<'_>, ctx: &PipelineContext) -> f64 {
        let mut score = 0.7;

        if artifact.reel.resolution == REEL_RESOLUTION {
            score += 0.15;
        } else if artifact.reel.resolution == "unknown" {
            score -= 0.05;
        } else {
            score -= 0.1;
        }

        let duration = artifact.reel.total_duration;
        let (min, max) = ctx.platform.duration_range();
        if (min..=max).contains(&duration) {
            score += 0.1;
        } else if duration < min {
            score -= 0.08;
        } else {
            score -= 0.05;
        }

        if artifact.audio.is_some() {
            score += 0.05;
        }
        score
    }

    fn engagement(&self, artifact: &ReelArtifact<'_>, ctx: &PipelineContext) -> f64 {
        let mut score = ctx.platform.engagement_base();

        let duration = artifact.reel.total_duration;
        let (min, max) = ctx.platform.duration_range();
        if (min..=max).contains(&duration) {
            score += 0.1;
        } else if duration < min {
            score -= 0.05;
        } else {
            score -= 0.08;
        }

        match artifact.audio {
            Some(track) if track.mode == ContentMode::Narration => score += 0.05,
            Some(_) => score += 0.08,
            None => score -= 0.1,
        }
        score
    }
}

impl QualityScorer for HeuristicScorer {
    fn score(&self, artifact: &ReelArtifact<'_>, ctx: &PipelineContext) -> DimensionScores {
        DimensionScores {
            technical_quality: self.technical(artifact),
            content_quality: self.content(artifact),
            brand_alignment: self.brand(artifact, ctx),
            platform_optimization: self.platform(artifact, ctx),
            engagement_potential: self.engagement(artifact, ctx),
        }
    }
}

/// Quality assessment engine.
pub struct QualityEngine {
    scorer: Box<dyn QualityScorer>,
}

impl Default for QualityEngine {
    fn default() -> Self {
        Self::new(Box::new(HeuristicScorer))
    }
}

impl QualityEngine {
    pub fn new(scorer: Box<dyn QualityScorer>) -> Self {
        Self { scorer }
    }

    /// Score a finished artifact across the five weighted dimensions.
    pub fn assess(&self, artifact: &ReelArtifact<'_>, ctx: &PipelineContext) -> QualityReport {
        let scores = self.scorer.score(artifact, ctx);
        let report = QualityReport::from_scores(scores);
        info!(
            overall = format!("{:.3}", report.overall_score),
            pass = report.pass_status.is_pass(),
            failed = report.failed_criteria.len(),
            "Quality assessment complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{ClipStatus, Platform, SyncQuality};
    use std::path::PathBuf;

    fn reel_at(path: PathBuf, grade: &str, sync: SyncQuality) -> SyncedReel {
        SyncedReel {
            file_path: path,
            clips_used: 3,
            total_duration: 30,
            resolution: REEL_RESOLUTION.to_string(),
            sync_quality: sync,
            transitions_applied: grade == "professional",
            enhancements_applied: grade == "professional",
            quality_grade: grade.to_string(),
        }
    }

    fn music_track(path: PathBuf) -> AudioTrack {
        AudioTrack {
            file_path: Some(path),
            mode: ContentMode::Music,
            duration_seconds: 30,
            status: ClipStatus::Success,
            voice_style: None,
            cost_estimate: 0.1,
            error: None,
        }
    }

    fn context() -> PipelineContext {
        PipelineContext::new(
            "30s fashion showcase",
            Platform::Instagram,
            30,
            ContentMode::Music,
            "/tmp/run",
        )
    }

    #[test]
    fn professional_reel_with_audio_passes() {
        let dir = tempfile::tempdir().unwrap();
        let reel_path = dir.path().join("final_reel.mp4");
        // Big enough to clear the minimum size band
        std::fs::write(&reel_path, vec![0u8; 200 * 1024]).unwrap();
        let audio_path = dir.path().join("music.wav");
        std::fs::write(&audio_path, b"audio").unwrap();

        let reel = reel_at(reel_path, "professional", SyncQuality::Perfect);
        let audio = music_track(audio_path);
        let artifact = ReelArtifact {
            reel: &reel,
            clips: &[],
            audio: Some(&audio),
        };

        let report = QualityEngine::default().assess(&artifact, &context());
        assert!(report.pass_status.is_pass(), "report: {report:?}");
        assert!(report.overall_score >= 0.76);
    }

    #[test]
    fn mock_reel_fails_on_technical_quality() {
        let dir = tempfile::tempdir().unwrap();
        let reel_path = dir.path().join("final_reel.mp4");
        // Placeholder-sized artifact, under the 100KB integrity band
        std::fs::write(&reel_path, vec![0u8; 1024]).unwrap();
        let audio_path = dir.path().join("music.wav");
        std::fs::write(&audio_path, b"audio").unwrap();

        let reel = reel_at(reel_path, "mock", SyncQuality::Mock);
        let audio = music_track(audio_path);
        let artifact = ReelArtifact {
            reel: &reel,
            clips: &[],
            audio: Some(&audio),
        };

        let report = QualityEngine::default().assess(&artifact, &context());
        assert!(!report.pass_status.is_pass());
        assert!(report
            .failed_criteria
            .contains(&reel_models::QualityDimension::TechnicalQuality));
        // Degraded but structurally valid output is never a critical failure
        assert!(!report.is_critical_failure());
    }

    #[test]
    fn assessment_is_idempotent_on_unchanged_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let reel_path = dir.path().join("final_reel.mp4");
        std::fs::write(&reel_path, vec![0u8; 150 * 1024]).unwrap();

        let reel = reel_at(reel_path, "professional", SyncQuality::Good);
        let artifact = ReelArtifact {
            reel: &reel,
            clips: &[],
            audio: None,
        };

        let engine = QualityEngine::default();
        let ctx = context();
        let first = engine.assess(&artifact, &ctx);
        let second = engine.assess(&artifact, &ctx);

        assert_eq!(first.overall_score, second.overall_score);
        assert_eq!(first.pass_status, second.pass_status);
        assert_eq!(first.failed_criteria, second.failed_criteria);
    }

    #[test]
    fn missing_file_zeroes_integrity() {
        let reel = reel_at(PathBuf::from("/nonexistent/reel.mp4"), "mock", SyncQuality::Unknown);
        let artifact = ReelArtifact {
            reel: &reel,
            clips: &[],
            audio: None,
        };
        let scores = HeuristicScorer.score(&artifact, &context());
        // 0.4 * 0 + 0.3 * 1.0 + 0.3 * 0.6
        assert!((scores.technical_quality - 0.48).abs() < 1e-9);
    }
}
