//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// One `-i` input with its preceding arguments.
#[derive(Debug, Clone)]
struct Input {
    /// Arguments placed before this input's `-i` (e.g. `-ss`, `-loop`).
    args: Vec<String>,
    /// Path or lavfi source description.
    source: String,
}

/// Builder for FFmpeg commands.
///
/// Supports multiple inputs; per-input arguments attach to the most recently
/// added input, matching FFmpeg's positional argument rules.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<Input>,
    output: PathBuf,
    /// Arguments placed after the inputs (filters, codecs, maps).
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a command with a single file input.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            inputs: vec![Input {
                args: Vec::new(),
                source: input.as_ref().to_string_lossy().to_string(),
            }],
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Create a command with no inputs yet, for generated (lavfi) sources.
    pub fn generate(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add another file input.
    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.inputs.push(Input {
            args: Vec::new(),
            source: path.as_ref().to_string_lossy().to_string(),
        });
        self
    }

    /// Add a lavfi-generated input (e.g. `anullsrc=...`, `sine=...`).
    pub fn lavfi_input(mut self, spec: impl Into<String>) -> Self {
        self.inputs.push(Input {
            args: vec!["-f".to_string(), "lavfi".to_string()],
            source: spec.into(),
        });
        self
    }

    /// Add an argument before the most recent input's `-i`.
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        if let Some(input) = self.inputs.last_mut() {
            input.args.push(arg.into());
        }
        self
    }

    /// Loop the most recent input (still-image inputs).
    pub fn loop_input(self) -> Self {
        self.input_arg("-loop").input_arg("1")
    }

    /// Seek position for the most recent input.
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{seconds:.3}"))
    }

    /// Read limit for the most recent input. Unlike [`Self::duration`], this
    /// bounds how much source is decoded, so filters may still stretch the
    /// output beyond it.
    pub fn read_duration(self, seconds: f64) -> Self {
        self.input_arg("-t").input_arg(format!("{seconds:.3}"))
    }

    /// Add an output argument (after the inputs).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Read/render duration limit.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{seconds:.3}"))
    }

    /// Stop writing at this output timestamp.
    pub fn until(self, seconds: f64) -> Self {
        self.output_arg("-to").output_arg(format!("{seconds:.3}"))
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Map a stream into the output.
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Copy all streams without re-encoding.
    pub fn codec_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Drop the audio track.
    pub fn no_audio(self) -> Self {
        self.output_arg("-an")
    }

    /// Truncate the output to the shortest input stream.
    pub fn shortest(self) -> Self {
        self.output_arg("-shortest")
    }

    /// Set encoder preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Set audio bitrate.
    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Build the full argument list.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.source.clone());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with a bounded timeout.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Bound the command's runtime; expiry kills the process.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = if let Some(timeout_secs) = self.timeout_secs {
            let deadline = std::time::Duration::from_secs(timeout_secs);
            match tokio::time::timeout(deadline, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => return Err(MediaError::Timeout(timeout_secs)),
            }
        } else {
            child.wait_with_output().await?
        };

        if output.status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
                output.status.code(),
            ))
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("input.mp4", "output.mp4")
            .seek(10.0)
            .duration(30.0)
            .video_codec("libx264")
            .no_audio();

        let args = cmd.build_args();
        assert!(args.contains(&"-ss".to_string()));
        assert!(args.contains(&"10.000".to_string()));
        assert!(args.contains(&"-c:v".to_string()));
        assert!(args.contains(&"-an".to_string()));
        assert_eq!(args.last().unwrap(), "output.mp4");
    }

    #[test]
    fn test_input_args_precede_their_input() {
        let cmd = FfmpegCommand::new("main.mp4", "out.mp4")
            .input("ending.png")
            .loop_input()
            .lavfi_input("anullsrc=r=44100:cl=stereo");

        let args = cmd.build_args();
        let loop_pos = args.iter().position(|a| a == "-loop").unwrap();
        let ending_pos = args.iter().position(|a| a == "ending.png").unwrap();
        let lavfi_pos = args.iter().position(|a| a == "lavfi").unwrap();
        assert!(loop_pos < ending_pos);
        assert!(ending_pos < lavfi_pos);
        // Three inputs, three -i flags.
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 3);
    }

    #[test]
    fn test_seek_attaches_to_latest_input() {
        let cmd = FfmpegCommand::new("a.mp4", "out.mp4").input("b.mp4").seek(5.0);
        let args = cmd.build_args();
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let b = args.iter().position(|a| a == "b.mp4").unwrap();
        let a = args.iter().position(|a| a == "a.mp4").unwrap();
        assert!(a < ss && ss < b);
    }
}
