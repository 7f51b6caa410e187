//! Per-run working directory and temp file tracking.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

/// Per-run output directory, exclusively owned by one orchestrator.
///
/// Layout:
/// ```text
/// reel_{platform}_{slug}_{timestamp}/
///   raw_clips/          generated clips
///   audio/              audio tracks
///   tmp/                registered temp files
///   final_reel.mp4
///   reel_metadata.json
///   reel_summary.md
///   reel_preview.html
///   qa_report.json
///   error_log.json
///   recovery_log.json
/// ```
#[derive(Debug, Clone)]
pub struct RunDir {
    root: PathBuf,
}

impl RunDir {
    /// Create a unique run directory under `output_root`.
    pub async fn create(
        output_root: &Path,
        platform: &str,
        brief: &str,
    ) -> std::io::Result<Self> {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let slug = brief_slug(brief);
        let name = format!("reel_{platform}_{slug}_{timestamp}");
        let root = output_root.join(name);

        tokio::fs::create_dir_all(root.join("raw_clips")).await?;
        tokio::fs::create_dir_all(root.join("audio")).await?;
        tokio::fs::create_dir_all(root.join("tmp")).await?;

        debug!(dir = %root.display(), "Created run directory");
        Ok(Self { root })
    }

    /// Open an existing directory as a run dir (tests).
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn raw_clips(&self) -> PathBuf {
        self.root.join("raw_clips")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.root.join("audio")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    pub fn final_reel(&self) -> PathBuf {
        self.root.join("final_reel.mp4")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join("reel_metadata.json")
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join("reel_summary.md")
    }

    pub fn preview_path(&self) -> PathBuf {
        self.root.join("reel_preview.html")
    }

    pub fn qa_report_path(&self) -> PathBuf {
        self.root.join("qa_report.json")
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.root.join("error_log.json")
    }

    pub fn recovery_log_path(&self) -> PathBuf {
        self.root.join("recovery_log.json")
    }

    /// Path for one generated clip, keyed by scene number.
    pub fn clip_path(&self, scene_number: u32) -> PathBuf {
        self.raw_clips().join(format!("clip_{scene_number}.mp4"))
    }
}

/// Turn a brief into a short filesystem-safe slug.
fn brief_slug(brief: &str) -> String {
    let cleaned: String = brief
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(20)
        .collect()
}

/// Registry of temporary files created during a run.
///
/// Files are registered as they are created and released on phase
/// completion or error; an age-based sweep catches anything orphaned
/// by a crashed step.
#[derive(Debug, Default)]
pub struct TempRegistry {
    registered: Mutex<Vec<PathBuf>>,
}

impl TempRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a temp file for later release.
    pub fn register(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!(path = %path.display(), "Registered temp file");
        self.registered.lock().expect("temp registry poisoned").push(path);
    }

    /// Delete all registered temp files. Idempotent.
    pub async fn release_all(&self) {
        let paths: Vec<PathBuf> = self
            .registered
            .lock()
            .expect("temp registry poisoned")
            .drain(..)
            .collect();

        for path in paths {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to release temp file");
                }
            }
        }
    }

    /// Delete files in `dir` older than `max_age`. Safety net for temp
    /// files that escaped registration.
    pub async fn sweep_aged(&self, dir: &Path, max_age: Duration) {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(_) => return,
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let aged_out = metadata
                .modified()
                .ok()
                .and_then(|m| m.elapsed().ok())
                .map(|elapsed| elapsed > max_age)
                .unwrap_or(false);
            if aged_out {
                debug!(path = %entry.path().display(), "Sweeping aged temp file");
                tokio::fs::remove_file(entry.path()).await.ok();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_safe_and_short() {
        assert_eq!(brief_slug("30s Fashion Showcase!"), "30s_fashion_showcase");
        let long = brief_slug("a very long brief that keeps going and going and going");
        assert!(long.len() <= 20);
        assert!(!long.contains(' '));
    }

    #[tokio::test]
    async fn run_dir_creates_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = RunDir::create(tmp.path(), "instagram", "fashion showcase")
            .await
            .unwrap();
        assert!(dir.raw_clips().is_dir());
        assert!(dir.audio_dir().is_dir());
        assert!(dir.tmp_dir().is_dir());
        assert!(dir
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("reel_instagram_fashion_showcase"));
    }

    #[tokio::test]
    async fn release_all_removes_registered_files() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("scratch.bin");
        std::fs::write(&file, b"scratch").unwrap();

        let registry = TempRegistry::new();
        registry.register(&file);
        registry.release_all().await;

        assert!(!file.exists());
        // Releasing again is a no-op
        registry.release_all().await;
    }

    #[tokio::test]
    async fn sweep_ignores_fresh_files() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("fresh.bin");
        std::fs::write(&file, b"fresh").unwrap();

        let registry = TempRegistry::new();
        registry
            .sweep_aged(tmp.path(), Duration::from_secs(3600))
            .await;
        assert!(file.exists());
    }
}
