//! End-to-end pipeline tests in degraded (offline) mode.
//!
//! No credentials are configured, so the generation client writes mock
//! artifacts and the pipeline must still reach QA with a structurally
//! complete result.

use std::time::Duration;

use reel_genai::{GenerationClient, GenerationClientConfig, TextServiceClient, TextServiceConfig};
use reel_models::{
    ClipStatus, ContentMode, PassStatus, Phase, PhasePayload, PhaseStatus, PipelineContext,
    Platform, QualityDimension, ReloopStrategy,
};
use reel_pipeline::{Orchestrator, PipelineConfig, RunContext, RunDir, RunStatus};

async fn offline_context(brief: &str, duration: u32, mode: ContentMode, root: &std::path::Path) -> RunContext {
    let config = PipelineConfig {
        output_root: root.to_path_buf(),
        max_reloop_iterations: 3,
        scene_parallelism: 2,
        memory_budget_mb: None,
        temp_max_age: Duration::from_secs(3600),
    };

    let dir = RunDir::create(root, "instagram", brief).await.unwrap();
    let pipeline = PipelineContext::new(brief, Platform::Instagram, duration, mode, dir.path());

    // No API keys: video/audio jobs degrade to mock, text service is
    // unavailable and planning stays on the deterministic template
    let video_client = GenerationClient::new(GenerationClientConfig {
        api_key: None,
        ..Default::default()
    })
    .unwrap();
    let text_client = TextServiceClient::new(TextServiceConfig::default()).unwrap();

    RunContext::with_clients(config, pipeline, dir, video_client, text_client)
}

#[tokio::test]
async fn offline_run_reaches_qa_with_mock_artifacts() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = offline_context("30s fashion showcase", 30, ContentMode::Music, tmp.path()).await;

    let report = Orchestrator::new(ctx).run().await;

    // The run finishes, labeled degraded rather than presented as success
    assert_eq!(report.status, RunStatus::Degraded);

    // Planning: three scenes summing to the 30s target
    let plan = report
        .phase_results
        .iter()
        .find_map(|r| match &r.payload {
            Some(PhasePayload::Planning(plan)) => Some(plan.clone()),
            _ => None,
        })
        .expect("planning result present");
    assert_eq!(plan.scenes.len(), 3);
    let total: u32 = plan.scenes.iter().map(|s| s.duration_seconds).sum();
    assert!((i64::from(total) - 30).abs() <= 1);

    // Video generation: one mock clip per scene, files on disk, non-empty
    let video_result = report
        .phase_results
        .iter()
        .find(|r| r.phase == Phase::VideoGen)
        .expect("video generation result present");
    assert_eq!(video_result.status, PhaseStatus::Mock);
    let video = match &video_result.payload {
        Some(PhasePayload::VideoGen(output)) => output.clone(),
        other => panic!("unexpected video payload: {other:?}"),
    };
    assert_eq!(video.clips.len(), 3);
    for clip in &video.clips {
        assert_eq!(clip.status, ClipStatus::Mock);
        let path = clip.file_path.as_ref().expect("mock clip has a file");
        let size = std::fs::metadata(path).unwrap().len();
        assert!(size > 0, "mock clip file must be non-empty");
    }
    // Clip ids follow scene order
    let ids: Vec<u32> = video.clips.iter().map(|c| c.clip_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    // One final reel exists
    let reel = report.final_reel.as_ref().expect("final reel path");
    assert!(reel.exists());
    assert!(std::fs::metadata(reel).unwrap().len() > 0);

    // QA ran and produced a full report plus a reloop decision
    let outcome = report.qa_history.last().expect("qa outcome");
    for dim in QualityDimension::ALL {
        let score = outcome.report.scores.get(*dim);
        assert!((0.0..=1.0).contains(&score), "{dim} out of range: {score}");
    }
    assert!(outcome.report.overall_score >= 0.0 && outcome.report.overall_score <= 1.0);
    assert_eq!(outcome.report.pass_status, PassStatus::Fail);
    assert!(!report.decisions.is_empty());

    // Mock output fails on technical quality, which targets SYNC
    let first = &report.decisions[0];
    assert_eq!(first.strategy, ReloopStrategy::ParameterAdjustment);
    assert_eq!(first.target_phase, Phase::Sync);
}

#[tokio::test]
async fn reloop_appends_results_until_budget_exhausted() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = offline_context("30s fashion showcase", 30, ContentMode::Music, tmp.path()).await;

    let report = Orchestrator::new(ctx).run().await;

    // Three re-entries were spent
    assert_eq!(report.iterations, 3);
    // One QA outcome per iteration plus the initial pass
    assert_eq!(report.qa_history.len(), 4);

    // The chain is append-only: six first-pass results plus two
    // (SYNC, QA) per re-entry
    assert_eq!(report.phase_results.len(), 6 + 3 * 2);
    assert_eq!(report.phase_results.last().unwrap().phase, Phase::Qa);

    // Earlier results are retained untouched
    let planning_results: Vec<_> = report
        .phase_results
        .iter()
        .filter(|r| r.phase == Phase::Planning)
        .collect();
    assert_eq!(planning_results.len(), 1);
}

#[tokio::test]
async fn run_reports_are_written_to_the_run_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = offline_context("20s coffee brand promo", 20, ContentMode::Narration, tmp.path()).await;
    let run_dir = ctx.dir.path().to_path_buf();

    let report = Orchestrator::new(ctx).run().await;

    assert!(run_dir.join("reel_metadata.json").exists());
    assert!(run_dir.join("reel_summary.md").exists());
    assert!(run_dir.join("reel_preview.html").exists());
    assert!(run_dir.join("qa_report.json").exists());
    assert!(run_dir.join("final_reel.mp4").exists());

    // Narration mode produced a narration track
    assert!(run_dir.join("audio").join("narration.wav").exists());

    // qa_report.json round-trips as a quality report
    let body = std::fs::read(run_dir.join("qa_report.json")).unwrap();
    let parsed: reel_models::QualityReport = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        parsed.pass_status,
        report.qa_history.last().unwrap().report.pass_status
    );
}

#[tokio::test]
async fn twenty_second_brief_gets_three_scenes_summing_to_target() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = offline_context("quick workout tips", 20, ContentMode::Music, tmp.path()).await;

    let report = Orchestrator::new(ctx).run().await;

    let plan = report
        .phase_results
        .iter()
        .find_map(|r| match &r.payload {
            Some(PhasePayload::Planning(plan)) => Some(plan.clone()),
            _ => None,
        })
        .unwrap();
    let total: u32 = plan.scenes.iter().map(|s| s.duration_seconds).sum();
    assert!((i64::from(total) - 20).abs() <= 1);
}
