//! Phase 6: quality assessment.

use tracing::info;

use reel_models::phase::QaOutcome;
use reel_models::{Phase, PhasePayload, PhaseResult, PhaseStatus};

use crate::context::RunContext;
use crate::error::{PipelineError, PipelineResult};
use crate::orchestrator::RunState;
use crate::quality::{QualityEngine, ReelArtifact};
use crate::reloop::ReloopEngine;
use crate::report;

/// Run the QA phase: assess the finished reel and, on failure, obtain
/// a reloop decision.
pub async fn run(
    ctx: &RunContext,
    state: &RunState,
    quality: &QualityEngine,
    reloop: &ReloopEngine,
) -> PipelineResult<PhaseResult> {
    let reel = state
        .reel
        .as_ref()
        .ok_or_else(|| PipelineError::missing_data("qa requires a synchronized reel"))?;

    let clips = state.clips();
    let artifact = ReelArtifact {
        reel,
        clips,
        audio: state.audio.as_ref(),
    };

    let qa_report = quality.assess(&artifact, &ctx.pipeline);
    report::write_qa_report(&ctx.dir, &qa_report).await?;

    let decision = reloop.decide(&qa_report);
    if let Some(decision) = &decision {
        info!(
            strategy = %decision.strategy,
            target = %decision.target_phase,
            "Quality gate failed, reloop proposed"
        );
    } else {
        info!(
            overall = format!("{:.3}", qa_report.overall_score),
            "Quality gate passed"
        );
    }

    Ok(PhaseResult::new(
        Phase::Qa,
        PhaseStatus::Success,
        PhasePayload::Qa(QaOutcome {
            report: qa_report,
            decision,
        }),
    ))
}
