//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Approximate memory footprint of one in-flight generation job.
const JOB_MEMORY_MB: u64 = 512;
/// Hard cap on concurrent scene generation.
const MAX_SCENE_PARALLEL: usize = 4;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory under which per-run folders are created
    pub output_root: PathBuf,
    /// Maximum reloop re-entries before the run is forced to terminate
    pub max_reloop_iterations: u32,
    /// Concurrent scene generation slots
    pub scene_parallelism: usize,
    /// Optional memory budget constraining the worker pool
    pub memory_budget_mb: Option<u64>,
    /// Age after which orphaned temp files are swept
    pub temp_max_age: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let memory_budget_mb = None;
        Self {
            output_root: PathBuf::from("reels"),
            max_reloop_iterations: 3,
            scene_parallelism: detect_scene_parallelism(memory_budget_mb),
            memory_budget_mb,
            temp_max_age: Duration::from_secs(3600),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let memory_budget_mb = std::env::var("REEL_MEMORY_BUDGET_MB")
            .ok()
            .and_then(|s| s.parse().ok());

        Self {
            output_root: std::env::var("REEL_OUTPUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("reels")),
            max_reloop_iterations: std::env::var("REEL_MAX_RELOOPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            scene_parallelism: std::env::var("REEL_SCENE_PARALLEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| detect_scene_parallelism(memory_budget_mb)),
            memory_budget_mb,
            temp_max_age: Duration::from_secs(
                std::env::var("REEL_TEMP_MAX_AGE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
        }
    }
}

/// Size the scene worker pool from available CPUs, leaving headroom for
/// the encoder, clamped by the memory budget when one is set.
fn detect_scene_parallelism(memory_budget_mb: Option<u64>) -> usize {
    let by_cpu = num_cpus::get().saturating_sub(1).max(1);
    let mut workers = by_cpu.min(MAX_SCENE_PARALLEL);

    if let Some(budget) = memory_budget_mb {
        let by_memory = (budget / JOB_MEMORY_MB).max(1) as usize;
        workers = workers.min(by_memory);
    }

    workers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallelism_is_bounded() {
        let workers = detect_scene_parallelism(None);
        assert!(workers >= 1);
        assert!(workers <= MAX_SCENE_PARALLEL);
    }

    #[test]
    fn memory_pressure_reduces_workers() {
        // A 512MB budget admits exactly one concurrent job
        assert_eq!(detect_scene_parallelism(Some(512)), 1);
        // A tiny budget still admits one worker rather than zero
        assert_eq!(detect_scene_parallelism(Some(64)), 1);
        // A generous budget defers to the CPU bound
        let roomy = detect_scene_parallelism(Some(64 * 1024));
        assert_eq!(roomy, detect_scene_parallelism(None));
    }
}
