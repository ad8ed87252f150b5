//! Media probing via FFprobe.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Probed properties of a media file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaProbe {
    /// Duration in seconds.
    pub duration: f64,
    /// Width in pixels, if the file has a video stream.
    pub width: Option<u32>,
    /// Height in pixels, if the file has a video stream.
    pub height: Option<u32>,
    /// Whether the file carries an audio stream.
    pub has_audio: bool,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe a media file for duration and resolution.
///
/// Works for audio-only files as well; `width`/`height` are `None` when no
/// video stream is present.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaProbe> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration:stream=codec_type,width,height",
            "-of",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("ffprobe exited with status {}", output.status),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| {
            MediaError::InvalidMedia(format!("no duration reported for {}", path.display()))
        })?;

    if duration <= 0.0 {
        return Err(MediaError::InvalidMedia(format!(
            "non-positive duration for {}",
            path.display()
        )));
    }

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    let probe = MediaProbe {
        duration,
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
        has_audio: parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio")),
    };

    debug!(path = %path.display(), duration = probe.duration, "Probed media");
    Ok(probe)
}
