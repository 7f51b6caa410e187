//! Per-run execution context.

use tracing::info;

use reel_genai::{GenerationClient, ModelSelector, TextServiceClient};
use reel_models::{ContentMode, PipelineContext, Platform, RunId};

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::workdir::{RunDir, TempRegistry};

/// Everything a phase needs, constructed once per run and passed by
/// reference. Replaces the global client singletons of earlier designs.
pub struct RunContext {
    pub run_id: RunId,
    pub config: PipelineConfig,
    pub pipeline: PipelineContext,
    pub dir: RunDir,
    pub temp: TempRegistry,
    pub video_client: GenerationClient,
    pub text_client: TextServiceClient,
    pub selector: ModelSelector,
}

impl RunContext {
    /// Build a context from a brief, creating the run directory and
    /// environment-configured clients.
    pub async fn create(
        config: PipelineConfig,
        brief: impl Into<String>,
        platform: Platform,
        target_duration: u32,
        content_mode: ContentMode,
    ) -> PipelineResult<Self> {
        let brief = brief.into();
        let run_id = RunId::new();
        let dir = RunDir::create(&config.output_root, platform.as_str(), &brief).await?;

        let pipeline = PipelineContext::new(
            brief,
            platform,
            target_duration,
            content_mode,
            dir.path(),
        );

        let video_client = GenerationClient::from_env()?;
        let text_client = TextServiceClient::from_env()?;

        info!(
            run_id = %run_id,
            platform = %platform,
            duration = target_duration,
            mode = %content_mode,
            live_generation = video_client.is_live(),
            text_service = text_client.is_available(),
            "Run context created"
        );

        Ok(Self {
            run_id,
            config,
            pipeline,
            dir,
            temp: TempRegistry::new(),
            video_client,
            text_client,
            selector: ModelSelector::new(),
        })
    }

    /// Build a context around pre-constructed clients (tests).
    pub fn with_clients(
        config: PipelineConfig,
        pipeline: PipelineContext,
        dir: RunDir,
        video_client: GenerationClient,
        text_client: TextServiceClient,
    ) -> Self {
        Self {
            run_id: RunId::new(),
            config,
            pipeline,
            dir,
            temp: TempRegistry::new(),
            video_client,
            text_client,
            selector: ModelSelector::new(),
        }
    }
}
