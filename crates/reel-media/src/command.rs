//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg invocations.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file paths, each preceded by -i
    inputs: Vec<PathBuf>,
    /// Output file path
    output: PathBuf,
    /// Arguments placed before the inputs
    input_args: Vec<String>,
    /// Arguments placed after the inputs
    output_args: Vec<String>,
}

impl FfmpegCommand {
    /// Create a command with one input.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            inputs: vec![input.as_ref().to_path_buf()],
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
        }
    }

    /// Add an additional input file.
    pub fn add_input(mut self, input: impl AsRef<Path>) -> Self {
        self.inputs.push(input.as_ref().to_path_buf());
        self
    }

    /// Add an argument before the inputs.
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add an argument after the inputs.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set the video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set the audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Build the full argument list.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
        ];
        args.extend(self.input_args.clone());
        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.to_string_lossy().to_string());
        }
        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());
        args
    }
}

/// Run an FFmpeg command with a timeout.
pub async fn run_ffmpeg(command: &FfmpegCommand, timeout: Duration) -> MediaResult<()> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let args = command.build_args();
    debug!(args = ?args, "Running ffmpeg");

    let child = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output();

    let output = tokio::time::timeout(timeout, child)
        .await
        .map_err(|_| MediaError::Timeout(timeout.as_secs()))??;

    if !output.status.success() {
        return Err(MediaError::ffmpeg_failed(
            "encode failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
            output.status.code(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_args_orders_inputs_and_output() {
        let cmd = FfmpegCommand::new("in.mp4", "out.mp4")
            .add_input("audio.wav")
            .output_args(["-c:v", "copy"])
            .output_arg("-shortest");
        let args = cmd.build_args();

        let in_pos = args.iter().position(|a| a == "in.mp4").unwrap();
        let audio_pos = args.iter().position(|a| a == "audio.wav").unwrap();
        assert!(in_pos < audio_pos);
        assert_eq!(args.last().unwrap(), "out.mp4");
        assert_eq!(args[in_pos - 1], "-i");
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn filters_land_after_inputs() {
        let cmd = FfmpegCommand::new("in.mp4", "out.mp4").video_filter("scale=1080:1920");
        let args = cmd.build_args();
        let filter_pos = args.iter().position(|a| a == "-vf").unwrap();
        let input_pos = args.iter().position(|a| a == "in.mp4").unwrap();
        assert!(filter_pos > input_pos);
    }
}
