//! Reel generation binary.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_models::{ContentMode, Platform};
use reel_pipeline::{Orchestrator, PipelineConfig, RunContext, RunStatus};

/// Turn a short brief into a finished vertical reel.
#[derive(Debug, Parser)]
#[command(name = "reel", version, about)]
struct Cli {
    /// Natural-language brief, e.g. "30s fashion showcase"
    brief: String,

    /// Target platform: instagram, tiktok or facebook
    #[arg(long, default_value = "instagram")]
    platform: Platform,

    /// Target duration in seconds
    #[arg(long, default_value_t = 20)]
    duration: u32,

    /// Audio mode: music or narration
    #[arg(long, default_value = "music")]
    mode: ContentMode,

    /// Output root directory (defaults to REEL_OUTPUT_ROOT or ./reels)
    #[arg(long)]
    output_root: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("reel=info".parse().expect("static directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let cli = Cli::parse();

    let mut config = PipelineConfig::from_env();
    if let Some(output_root) = cli.output_root {
        config.output_root = output_root;
    }

    info!(
        brief = %cli.brief,
        platform = %cli.platform,
        duration = cli.duration,
        mode = %cli.mode,
        "Starting reel generation"
    );

    let ctx = RunContext::create(config, cli.brief, cli.platform, cli.duration, cli.mode)
        .await
        .context("failed to create run context")?;
    let run_dir = ctx.dir.path().to_path_buf();

    let report = Orchestrator::new(ctx).run().await;

    println!();
    println!("Run {}: {:?}", report.run_id, report.status);
    if let Some(reel) = &report.final_reel {
        println!("Final reel: {}", reel.display());
    }
    if let Some(outcome) = report.qa_history.last() {
        println!(
            "Quality: {:.3} ({:?})",
            outcome.report.overall_score, outcome.report.pass_status
        );
    }
    println!("Total cost: ${:.2}", report.total_cost);
    println!("Outputs: {}", run_dir.display());

    if report.status == RunStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}
