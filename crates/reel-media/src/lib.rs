//! FFmpeg CLI wrapper for reel assembly.
//!
//! This crate provides:
//! - An FFmpeg command builder and async runner
//! - FFprobe video inspection
//! - Clip stitching, audio muxing and aspect-ratio re-encode

pub mod command;
pub mod compose;
pub mod error;
pub mod probe;

pub use command::{FfmpegCommand, run_ffmpeg};
pub use compose::{ensure_target_aspect, mux_audio, reencode_aspect, stitch_clips, AspectOutcome};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};

/// Check whether the local encoder toolchain is present.
pub fn encoder_available() -> bool {
    which::which("ffmpeg").is_ok() && which::which("ffprobe").is_ok()
}
