//! Reel assembly: stitching, audio muxing and aspect correction.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::command::{run_ffmpeg, FfmpegCommand};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;

const ENCODE_TIMEOUT: Duration = Duration::from_secs(600);

/// Concatenate clips into one video using the concat demuxer.
///
/// Inputs are stitched in the given order; the caller is responsible
/// for passing them sorted by scene number.
pub async fn stitch_clips(clips: &[PathBuf], output: &Path) -> MediaResult<()> {
    if clips.is_empty() {
        return Err(MediaError::NoClips);
    }
    for clip in clips {
        if !clip.exists() {
            return Err(MediaError::FileNotFound(clip.clone()));
        }
    }

    // concat demuxer needs a list file next to the output
    let list_path = output.with_extension("concat.txt");
    let mut list = String::new();
    for clip in clips {
        list.push_str(&format!("file '{}'\n", clip.display()));
    }
    tokio::fs::write(&list_path, list).await?;

    let command = FfmpegCommand::new(&list_path, output)
        .input_arg("-f")
        .input_arg("concat")
        .input_arg("-safe")
        .input_arg("0")
        .video_codec("libx264")
        .output_args(["-preset", "fast", "-crf", "18"])
        .output_args(["-pix_fmt", "yuv420p"]);

    let result = run_ffmpeg(&command, ENCODE_TIMEOUT).await;
    tokio::fs::remove_file(&list_path).await.ok();
    result?;

    info!(clips = clips.len(), output = %output.display(), "Stitched clips");
    Ok(())
}

/// Mux an audio track under a video, trimming to the shorter stream.
pub async fn mux_audio(video: &Path, audio: &Path, output: &Path) -> MediaResult<()> {
    if !video.exists() {
        return Err(MediaError::FileNotFound(video.to_path_buf()));
    }
    if !audio.exists() {
        return Err(MediaError::FileNotFound(audio.to_path_buf()));
    }

    let command = FfmpegCommand::new(video, output)
        .add_input(audio)
        .output_args(["-map", "0:v:0", "-map", "1:a:0"])
        .video_codec("copy")
        .audio_codec("aac")
        .output_args(["-b:a", "128k"])
        .output_arg("-shortest");

    run_ffmpeg(&command, ENCODE_TIMEOUT).await?;
    info!(output = %output.display(), "Muxed audio track");
    Ok(())
}

/// Re-encode a clip to the target frame size, preserving content via
/// scale-then-pad.
pub async fn reencode_aspect(input: &Path, width: u32, height: u32) -> MediaResult<PathBuf> {
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let output = aspect_output_path(input);
    let filter = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = width,
        h = height
    );

    let command = FfmpegCommand::new(input, &output)
        .video_filter(filter)
        .video_codec("libx264")
        .output_args(["-preset", "fast", "-crf", "18"])
        .audio_codec("copy");

    run_ffmpeg(&command, ENCODE_TIMEOUT).await?;
    Ok(output)
}

fn aspect_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "clip".to_string());
    let ext = input
        .extension()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "mp4".to_string());
    input.with_file_name(format!("{stem}_vertical.{ext}"))
}

/// Result of the aspect-ratio post-check.
#[derive(Debug, Clone)]
pub struct AspectOutcome {
    /// Path to use downstream (re-encoded or the original)
    pub path: PathBuf,
    /// Whether a re-encode happened
    pub reencoded: bool,
    /// Non-fatal warning recorded when the check or encode could not run
    pub warning: Option<String>,
}

/// Ensure a clip matches the target frame size.
///
/// Mismatched artifacts are re-encoded; when probing or encoding fails
/// the original passes through unchanged with a recorded warning. This
/// never fails the clip.
pub async fn ensure_target_aspect(clip: &Path, width: u32, height: u32) -> AspectOutcome {
    let info = match probe_video(clip).await {
        Ok(info) => info,
        Err(e) => {
            warn!(clip = %clip.display(), error = %e, "Aspect probe failed, passing clip through");
            return AspectOutcome {
                path: clip.to_path_buf(),
                reencoded: false,
                warning: Some(format!("aspect probe failed: {e}")),
            };
        }
    };

    if info.matches_resolution(width, height) {
        return AspectOutcome {
            path: clip.to_path_buf(),
            reencoded: false,
            warning: None,
        };
    }

    match reencode_aspect(clip, width, height).await {
        Ok(path) => {
            info!(clip = %clip.display(), "Re-encoded clip to target aspect");
            AspectOutcome {
                path,
                reencoded: true,
                warning: None,
            }
        }
        Err(e) => {
            warn!(clip = %clip.display(), error = %e, "Aspect re-encode failed, passing clip through");
            AspectOutcome {
                path: clip.to_path_buf(),
                reencoded: false,
                warning: Some(format!("aspect re-encode failed: {e}")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stitching_nothing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = stitch_clips(&[], &dir.path().join("out.mp4")).await;
        assert!(matches!(result, Err(MediaError::NoClips)));
    }

    #[tokio::test]
    async fn stitching_missing_clip_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp4");
        let result = stitch_clips(&[missing.clone()], &dir.path().join("out.mp4")).await;
        assert!(matches!(result, Err(MediaError::FileNotFound(p)) if p == missing));
    }

    #[tokio::test]
    async fn aspect_check_passes_through_on_probe_failure() {
        // A placeholder file is not probeable; the clip must survive
        // with a warning instead of failing
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("clip.mp4");
        std::fs::write(&clip, b"not a real video").unwrap();

        let outcome = ensure_target_aspect(&clip, 1080, 1920).await;
        assert_eq!(outcome.path, clip);
        assert!(!outcome.reencoded);
        assert!(outcome.warning.is_some());
    }

    #[test]
    fn aspect_output_path_keeps_extension() {
        let out = aspect_output_path(Path::new("/tmp/run/raw_clips/clip_2.mp4"));
        assert_eq!(out, Path::new("/tmp/run/raw_clips/clip_2_vertical.mp4"));
    }
}
