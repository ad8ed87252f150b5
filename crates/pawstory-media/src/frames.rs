//! Frame sampling and transport-side frame compression.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Extract frames from a video at a fixed rate, scaled down for analysis.
///
/// Frames are written to `out_dir` as `frame_%04d.jpg` and returned sorted by
/// filename, which preserves temporal order.
pub async fn extract_frames(
    video: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    fps: f64,
    scale: &str,
) -> MediaResult<Vec<PathBuf>> {
    let video = video.as_ref();
    let out_dir = out_dir.as_ref();

    if !video.exists() {
        return Err(MediaError::FileNotFound(video.to_path_buf()));
    }

    tokio::fs::create_dir_all(out_dir).await?;

    let pattern = out_dir.join("frame_%04d.jpg");
    let cmd = FfmpegCommand::new(video, &pattern)
        .video_filter(format!("fps={fps},scale={scale}"))
        .output_arg("-q:v")
        .output_arg("5");

    FfmpegRunner::new().with_timeout(300).run(&cmd).await?;

    let mut frames = Vec::new();
    let mut entries = tokio::fs::read_dir(out_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("frame_") && n.ends_with(".jpg"))
        {
            frames.push(path);
        }
    }
    frames.sort();

    info!(
        video = %video.display(),
        count = frames.len(),
        fps,
        "Extracted frames"
    );
    Ok(frames)
}

/// Re-encode a frame to a bounded size, returning the compressed JPEG bytes.
///
/// Used when shipping frames to a vision API; the on-disk frame is untouched.
pub async fn compress_frame(
    frame: impl AsRef<Path>,
    max_width: u32,
    max_height: u32,
) -> MediaResult<Vec<u8>> {
    let frame = frame.as_ref();

    if !frame.exists() {
        return Err(MediaError::FileNotFound(frame.to_path_buf()));
    }

    // scale=...:force_original_aspect_ratio=decrease never upscales.
    let filter = format!(
        "scale={max_width}:{max_height}:force_original_aspect_ratio=decrease"
    );

    let output = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-i"])
        .arg(frame)
        .args(["-vf", &filter, "-q:v", "5", "-f", "image2", "-"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffmpeg_failed(
            format!("frame compression failed for {}", frame.display()),
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
            output.status.code(),
        ));
    }

    debug!(
        frame = %frame.display(),
        bytes = output.stdout.len(),
        "Compressed frame"
    );
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extract_frames_missing_video() {
        let tmp = tempfile::tempdir().unwrap();
        let result = extract_frames("/nonexistent/video.mp4", tmp.path(), 2.0, "640:360").await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_compress_frame_missing_file() {
        let result = compress_frame("/nonexistent/frame.jpg", 640, 360).await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }

    #[test]
    fn test_frame_pattern_sorts_in_order() {
        let mut names = vec![
            PathBuf::from("frame_0010.jpg"),
            PathBuf::from("frame_0002.jpg"),
            PathBuf::from("frame_0001.jpg"),
        ];
        names.sort();
        assert_eq!(names[0], PathBuf::from("frame_0001.jpg"));
        assert_eq!(names[2], PathBuf::from("frame_0010.jpg"));
    }
}
