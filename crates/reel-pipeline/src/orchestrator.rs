//! Pipeline orchestrator.
//!
//! Sequences the six phases, threads results forward, routes failures
//! through recovery, and drives the quality-gated reloop cycle. The
//! jump back to an earlier phase is the single cyclic edge in the
//! state machine, guarded by the reloop iteration counter.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info, warn};

use reel_models::phase::{QaOutcome, VideoGenOutput};
use reel_models::{
    AudioTrack, GeneratedClip, PassStatus, Phase, PhasePayload, PhaseResult, PhaseStatus,
    PipelineContext, ReloopDecision, ReloopStrategy, RunId, Scene, StoryboardPlan, SyncedReel,
    VideoBackend,
};

use crate::context::RunContext;
use crate::phases;
use crate::quality::QualityEngine;
use crate::recovery::RecoveryCoordinator;
use crate::reloop::ReloopEngine;
use crate::report;

/// Accumulated state of one run.
///
/// The `results` chain is append-only: a reloop re-entry appends new
/// results, it never rewrites history.
#[derive(Default)]
pub struct RunState {
    /// Reloop re-entries performed so far
    pub iteration: u32,
    /// Append-only chain of every phase execution
    pub results: Vec<PhaseResult>,
    /// Latest storyboard
    pub storyboard: Option<StoryboardPlan>,
    /// Latest refined scenes
    pub scenes: Vec<Scene>,
    /// Latest video generation output
    pub video: Option<VideoGenOutput>,
    /// Latest audio track
    pub audio: Option<AudioTrack>,
    /// Latest synchronized reel
    pub reel: Option<SyncedReel>,
    /// QA outcomes, one per iteration
    pub qa_history: Vec<QaOutcome>,
    /// Reloop decisions taken
    pub decisions: Vec<ReloopDecision>,
    /// Backend override installed by a model_switch decision
    pub backend_override: Option<VideoBackend>,
}

impl RunState {
    /// Clips from the latest video generation, empty before it ran.
    pub fn clips(&self) -> &[GeneratedClip] {
        self.video.as_ref().map(|v| v.clips.as_slice()).unwrap_or(&[])
    }

    /// Record a phase result and absorb its payload.
    fn apply(&mut self, result: &PhaseResult) {
        match &result.payload {
            Some(PhasePayload::Planning(plan)) => {
                self.storyboard = Some(plan.clone());
                self.scenes = plan.scenes.clone();
            }
            Some(PhasePayload::Refinement { scenes }) => {
                self.scenes = scenes.clone();
            }
            Some(PhasePayload::VideoGen(output)) => {
                self.video = Some(output.clone());
            }
            Some(PhasePayload::AudioGen(track)) => {
                self.audio = Some(track.clone());
            }
            Some(PhasePayload::Sync(reel)) => {
                self.reel = Some(reel.clone());
            }
            Some(PhasePayload::Qa(outcome)) => {
                self.qa_history.push(outcome.clone());
            }
            None => {}
        }
        self.results.push(result.clone());
    }

    fn total_cost(&self) -> f64 {
        let video: f64 = self
            .results
            .iter()
            .filter_map(|r| match &r.payload {
                Some(PhasePayload::VideoGen(output)) => Some(output.summary.total_cost),
                _ => None,
            })
            .sum();
        let audio: f64 = self
            .results
            .iter()
            .filter_map(|r| match &r.payload {
                Some(PhasePayload::AudioGen(track)) => Some(track.cost_estimate),
                _ => None,
            })
            .sum();
        video + audio
    }

    /// Whether any executed phase produced degraded or partial output.
    fn any_degraded(&self) -> bool {
        self.results.iter().any(|r| {
            r.fallback_used || matches!(r.status, PhaseStatus::Mock | PhaseStatus::Partial)
        })
    }
}

/// Final outcome of a run. Degraded output is labeled as such, never
/// presented as full success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// QA passed on fully real output
    Completed,
    /// The run finished but some output is mock/partial, or the reloop
    /// budget ran out before the quality gate passed
    Degraded,
    /// The run halted on an unrecoverable failure
    Failed,
}

/// Result object yielded by every run.
#[derive(Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub status: RunStatus,
    pub context: PipelineContext,
    pub iterations: u32,
    pub total_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_reel: Option<PathBuf>,
    pub qa_history: Vec<QaOutcome>,
    pub decisions: Vec<ReloopDecision>,
    pub phase_results: Vec<PhaseResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Drives one pipeline run to completion.
pub struct Orchestrator {
    ctx: RunContext,
    state: RunState,
    quality: QualityEngine,
    reloop: ReloopEngine,
    recovery: RecoveryCoordinator,
}

impl Orchestrator {
    pub fn new(ctx: RunContext) -> Self {
        let reloop = ReloopEngine::new(ctx.selector.clone());
        Self {
            ctx,
            state: RunState::default(),
            quality: QualityEngine::default(),
            reloop,
            recovery: RecoveryCoordinator::new(),
        }
    }

    /// Replace the default scorer (tests, real measurement backends).
    pub fn with_quality_engine(mut self, quality: QualityEngine) -> Self {
        self.quality = quality;
        self
    }

    /// Run the pipeline to termination.
    pub async fn run(mut self) -> RunReport {
        info!(
            run_id = %self.ctx.run_id,
            brief = %self.ctx.pipeline.brief,
            "Starting pipeline run"
        );

        let mut phase = Phase::Planning;

        loop {
            let result = self.execute(phase).await;
            let status = result.status;
            self.state.apply(&result);

            info!(phase = %phase, status = %status, "Phase finished");

            if status == PhaseStatus::Failed {
                let cause = result.error.clone().unwrap_or_else(|| "unknown".to_string());
                error!(phase = %phase, cause = %cause, "Run halted");
                return self.finish(RunStatus::Failed, Some(cause)).await;
            }

            if phase != Phase::Qa {
                // next() is total for non-QA phases
                phase = phase.next().expect("non-terminal phase");
                continue;
            }

            // QA ran: pass terminates, fail consults the reloop engine
            let outcome = self
                .state
                .qa_history
                .last()
                .cloned()
                .expect("qa phase recorded an outcome");

            if outcome.report.pass_status == PassStatus::Pass {
                let status = if self.state.any_degraded() {
                    RunStatus::Degraded
                } else {
                    RunStatus::Completed
                };
                return self.finish(status, None).await;
            }

            let Some(decision) = outcome.decision else {
                warn!("Quality gate failed without a reloop decision, finishing degraded");
                return self.finish(RunStatus::Degraded, None).await;
            };

            if self.state.iteration >= self.ctx.config.max_reloop_iterations {
                warn!(
                    iterations = self.state.iteration,
                    "Reloop budget exhausted, finishing with degraded output"
                );
                self.state.decisions.push(decision);
                return self.finish(RunStatus::Degraded, None).await;
            }

            self.state.iteration += 1;
            if decision.strategy == ReloopStrategy::ModelSwitch {
                self.state.backend_override = decision.switch_backend;
            }
            phase = decision.target_phase;
            info!(
                iteration = self.state.iteration,
                strategy = %decision.strategy,
                target = %phase,
                "Re-entering pipeline"
            );
            self.state.decisions.push(decision);
        }
    }

    /// Execute one phase, routing errors through recovery.
    async fn execute(&mut self, phase: Phase) -> PhaseResult {
        let attempt = match phase {
            Phase::Planning => phases::planning::run(&self.ctx).await,
            Phase::Refinement => phases::refinement::run(&self.ctx, &self.state).await,
            Phase::VideoGen => phases::video_gen::run(&self.ctx, &self.state).await,
            Phase::AudioGen => phases::audio_gen::run(&self.ctx, &self.state).await,
            Phase::Sync => phases::sync::run(&self.ctx, &self.state).await,
            Phase::Qa => {
                phases::qa::run(&self.ctx, &self.state, &self.quality, &self.reloop).await
            }
        };

        match attempt {
            Ok(result) => result,
            Err(err) => {
                let recovery = self
                    .recovery
                    .handle(phase, &err, &self.ctx, &self.state)
                    .await;
                match (recovery.can_continue, recovery.fallback_payload) {
                    (true, Some(payload)) => {
                        warn!(phase = %phase, "Substituting recovery fallback payload");
                        PhaseResult::fallback(phase, payload, err.to_string())
                    }
                    _ => PhaseResult::failed(phase, err.to_string()),
                }
            }
        }
    }

    /// Write reports, release resources and build the run report.
    async fn finish(self, status: RunStatus, failure: Option<String>) -> RunReport {
        let Self { ctx, state, .. } = self;

        ctx.temp.release_all().await;
        ctx.temp
            .sweep_aged(&ctx.dir.tmp_dir(), ctx.config.temp_max_age)
            .await;

        let report = RunReport {
            run_id: ctx.run_id.clone(),
            status,
            context: ctx.pipeline.clone(),
            iterations: state.iteration,
            total_cost: state.total_cost(),
            final_reel: state.reel.as_ref().map(|r| r.file_path.clone()),
            qa_history: state.qa_history,
            decisions: state.decisions,
            phase_results: state.results,
            failure,
        };

        if let Err(e) = report::write_run_reports(&ctx.dir, &report).await {
            warn!(error = %e, "Failed to write run reports");
        }

        info!(
            run_id = %report.run_id,
            status = ?report.status,
            iterations = report.iterations,
            cost = format!("${:.2}", report.total_cost),
            "Pipeline run finished"
        );
        report
    }
}
