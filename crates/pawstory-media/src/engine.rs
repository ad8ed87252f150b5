//! The [`MediaEngine`] capability trait and its FFmpeg-backed implementation.
//!
//! Every transcoding pass the pipeline performs goes through this trait, so
//! pipeline code can be tested against a mock without FFmpeg installed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::frames;
use crate::probe::{probe_media, MediaProbe};
use crate::subtitles::escape_drawtext;

/// Fade duration applied at clip boundaries, seconds.
pub const CLIP_FADE_SECS: f64 = 0.5;

/// Options for trimming one highlight clip out of a source video.
#[derive(Debug, Clone)]
pub struct TrimOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Trim window start, seconds into the source.
    pub start: f64,
    /// Trim window end, seconds into the source.
    pub end: f64,
    /// Playback retiming factor; `None` keeps original speed.
    pub speed_factor: Option<f64>,
    /// Target frame width.
    pub width: u32,
    /// Target frame height.
    pub height: u32,
}

/// Options for rendering a still-image ending card.
#[derive(Debug, Clone)]
pub struct EndingCardOptions {
    pub image: PathBuf,
    pub output: PathBuf,
    /// Text drawn over the lower third; pre-wrapped with newlines.
    pub text: String,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

/// All media operations the generation pipeline needs.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Probe duration, resolution and audio presence.
    async fn probe(&self, path: &Path) -> MediaResult<MediaProbe>;

    /// Sample frames at a fixed rate into `out_dir`, sorted by time.
    async fn extract_frames(
        &self,
        video: &Path,
        out_dir: &Path,
        fps: f64,
        scale: &str,
    ) -> MediaResult<Vec<PathBuf>>;

    /// Cut one clip with fade-in/fade-out, scaling and optional retiming.
    /// The output is video-only; narration audio is muxed later.
    async fn trim_with_fade(&self, opts: &TrimOptions) -> MediaResult<()>;

    /// Concatenate clips losslessly via the concat demuxer.
    async fn concat(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()>;

    /// Concatenate audio tracks into one narration track.
    async fn concat_audio(&self, tracks: &[PathBuf], output: &Path) -> MediaResult<()>;

    /// Mux an audio track onto a video, truncating to the shorter stream.
    async fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()>;

    /// Render a still image into a faded ending-card clip with silent audio.
    async fn ending_card(&self, opts: &EndingCardOptions) -> MediaResult<()>;

    /// Append a card clip to the main reel, re-encoding through the concat
    /// filter. Falls back to video-only concat when the reel has no audio.
    async fn append_card(&self, main: &Path, card: &Path, output: &Path) -> MediaResult<()>;

    /// Burn an SRT file into the video.
    async fn burn_subtitles(&self, video: &Path, srt: &Path, output: &Path) -> MediaResult<()>;

    /// Mix a background music track under the existing audio, fading the
    /// music out over the final seconds.
    async fn mix_music(
        &self,
        video: &Path,
        music: &Path,
        output: &Path,
        music_volume: f64,
    ) -> MediaResult<()>;

    /// Synthesize a gentle chord drone to use as fallback background music.
    async fn generate_music(&self, output: &Path, duration: f64) -> MediaResult<()>;

    /// Render a silent audio track, used for chapters whose narration
    /// synthesis failed so the concatenated track stays in sync.
    async fn generate_silence(&self, output: &Path, duration: f64) -> MediaResult<()>;
}

/// [`MediaEngine`] backed by the FFmpeg and FFprobe binaries.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    runner: FfmpegRunner,
}

impl FfmpegEngine {
    /// Create an engine, verifying both binaries are on PATH.
    pub fn new() -> MediaResult<Self> {
        crate::command::check_ffmpeg()?;
        crate::command::check_ffprobe()?;
        Ok(Self {
            runner: FfmpegRunner::new().with_timeout(600),
        })
    }

    async fn write_concat_list(paths: &[PathBuf], list_path: &Path) -> MediaResult<()> {
        let mut body = String::new();
        for path in paths {
            let abs = tokio::fs::canonicalize(path).await?;
            // Concat demuxer syntax: single-quoted, quotes escaped.
            let escaped = abs.to_string_lossy().replace('\'', "'\\''");
            body.push_str(&format!("file '{escaped}'\n"));
        }
        tokio::fs::write(list_path, body).await?;
        Ok(())
    }

    async fn concat_demuxer(&self, inputs: &[PathBuf], output: &Path) -> MediaResult<()> {
        if inputs.is_empty() {
            return Err(MediaError::InvalidMedia(
                "nothing to concatenate".to_string(),
            ));
        }
        let list_path = output.with_extension("txt");
        Self::write_concat_list(inputs, &list_path).await?;

        let cmd = FfmpegCommand::new(&list_path, output)
            .input_arg("-f")
            .input_arg("concat")
            .input_arg("-safe")
            .input_arg("0")
            .codec_copy();
        let result = self.runner.run(&cmd).await;
        let _ = tokio::fs::remove_file(&list_path).await;
        result
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe(&self, path: &Path) -> MediaResult<MediaProbe> {
        probe_media(path).await
    }

    async fn extract_frames(
        &self,
        video: &Path,
        out_dir: &Path,
        fps: f64,
        scale: &str,
    ) -> MediaResult<Vec<PathBuf>> {
        frames::extract_frames(video, out_dir, fps, scale).await
    }

    async fn trim_with_fade(&self, opts: &TrimOptions) -> MediaResult<()> {
        let duration = opts.end - opts.start;
        if duration <= 0.0 {
            return Err(MediaError::InvalidMedia(format!(
                "empty trim window [{:.3}, {:.3})",
                opts.start, opts.end
            )));
        }

        let mut filter = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
            w = opts.width,
            h = opts.height
        );

        // Retiming changes the rendered duration: V seconds of source at
        // speed s plays for V/s seconds.
        let rendered = match opts.speed_factor {
            Some(s) if s > 0.0 && (s - 1.0).abs() > f64::EPSILON => {
                filter.push_str(&format!(",setpts=PTS/{s:.4}"));
                duration / s
            }
            _ => duration,
        };

        let fade_out_start = (rendered - CLIP_FADE_SECS).max(0.0);
        filter.push_str(&format!(
            ",fade=t=in:st=0:d={CLIP_FADE_SECS},fade=t=out:st={fade_out_start:.3}:d={CLIP_FADE_SECS}"
        ));
        filter.push_str(",format=yuv420p");

        let cmd = FfmpegCommand::new(&opts.input, &opts.output)
            .seek(opts.start)
            .read_duration(duration)
            .video_filter(filter)
            .no_audio()
            .video_codec("libx264")
            .preset("fast")
            .output_arg("-r")
            .output_arg("30");

        self.runner.run(&cmd).await?;
        info!(
            output = %opts.output.display(),
            start = opts.start,
            end = opts.end,
            "Trimmed clip"
        );
        Ok(())
    }

    async fn concat(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()> {
        self.concat_demuxer(clips, output).await?;
        info!(clips = clips.len(), output = %output.display(), "Concatenated clips");
        Ok(())
    }

    async fn concat_audio(&self, tracks: &[PathBuf], output: &Path) -> MediaResult<()> {
        self.concat_demuxer(tracks, output).await
    }

    async fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(video, output)
            .input(audio)
            .map("0:v:0")
            .map("1:a:0")
            .video_codec("copy")
            .audio_codec("aac")
            .audio_bitrate("192k")
            .shortest();
        self.runner.run(&cmd).await
    }

    async fn ending_card(&self, opts: &EndingCardOptions) -> MediaResult<()> {
        if !opts.image.exists() {
            return Err(MediaError::FileNotFound(opts.image.clone()));
        }

        let fade_out_start = (opts.duration - CLIP_FADE_SECS).max(0.0);
        let text = escape_drawtext(&opts.text);
        let filter = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,\
             drawtext=text='{text}':fontcolor=white:fontsize=40:\
             box=1:boxcolor=black@0.5:boxborderw=16:\
             x=(w-text_w)/2:y=h-text_h-80,\
             fade=t=in:st=0:d={CLIP_FADE_SECS},\
             fade=t=out:st={fade_out_start:.3}:d={CLIP_FADE_SECS},\
             format=yuv420p",
            w = opts.width,
            h = opts.height
        );

        let cmd = FfmpegCommand::new(&opts.image, &opts.output)
            .loop_input()
            .lavfi_input("anullsrc=r=44100:cl=stereo")
            .duration(opts.duration)
            .video_filter(filter)
            .video_codec("libx264")
            .preset("fast")
            .output_arg("-r")
            .output_arg("30")
            .audio_codec("aac")
            .shortest();

        self.runner.run(&cmd).await?;
        info!(output = %opts.output.display(), "Rendered ending card");
        Ok(())
    }

    async fn append_card(&self, main: &Path, card: &Path, output: &Path) -> MediaResult<()> {
        let probe = probe_media(main).await?;

        let filter = if probe.has_audio {
            "[0:v][0:a][1:v][1:a]concat=n=2:v=1:a=1[v][a]"
        } else {
            "[0:v][1:v]concat=n=2:v=1:a=0[v]"
        };

        let mut cmd = FfmpegCommand::new(main, output)
            .input(card)
            .filter_complex(filter)
            .map("[v]");
        if probe.has_audio {
            cmd = cmd.map("[a]").audio_codec("aac");
        }
        cmd = cmd.video_codec("libx264").preset("fast");

        self.runner.run(&cmd).await
    }

    async fn burn_subtitles(&self, video: &Path, srt: &Path, output: &Path) -> MediaResult<()> {
        if !srt.exists() {
            return Err(MediaError::FileNotFound(srt.to_path_buf()));
        }

        // The subtitles filter parses its argument, so the path needs the
        // same escaping as drawtext values.
        let srt_path = escape_drawtext(&srt.to_string_lossy());
        let style = "FontSize=18,PrimaryColour=&HFFFFFF&,OutlineColour=&H000000&,\
                     Outline=2,MarginV=30";
        let filter = format!("subtitles='{srt_path}':force_style='{style}'");

        let cmd = FfmpegCommand::new(video, output)
            .video_filter(filter)
            .video_codec("libx264")
            .preset("fast")
            .audio_codec("copy");
        self.runner.run(&cmd).await
    }

    async fn mix_music(
        &self,
        video: &Path,
        music: &Path,
        output: &Path,
        music_volume: f64,
    ) -> MediaResult<()> {
        let probe = probe_media(video).await?;
        let cmd = music_mix_command(video, music, output, music_volume, &probe);
        self.runner.run(&cmd).await
    }

    async fn generate_music(&self, output: &Path, duration: f64) -> MediaResult<()> {
        // C major triad, mixed quiet with slow fades.
        let fade_start = (duration - 3.0).max(0.0);
        let filter = format!(
            "[0:a][1:a][2:a]amix=inputs=3:duration=first,volume=0.3,\
             afade=t=in:st=0:d=2,afade=t=out:st={fade_start:.3}:d=3[a]"
        );

        let cmd = FfmpegCommand::generate(output)
            .lavfi_input(format!("sine=frequency=261.63:duration={duration:.3}"))
            .lavfi_input(format!("sine=frequency=329.63:duration={duration:.3}"))
            .lavfi_input(format!("sine=frequency=392.00:duration={duration:.3}"))
            .filter_complex(filter)
            .map("[a]")
            .audio_bitrate("128k");

        self.runner.run(&cmd).await
    }

    async fn generate_silence(&self, output: &Path, duration: f64) -> MediaResult<()> {
        let cmd = FfmpegCommand::generate(output)
            .lavfi_input("anullsrc=r=44100:cl=stereo")
            .duration(duration)
            .audio_bitrate("128k");
        self.runner.run(&cmd).await
    }
}

/// Build the music-mix command for a probed timeline.
///
/// The music input is looped so a track shorter than the video never cuts
/// the output short; `-shortest` then ends at the video.
fn music_mix_command(
    video: &Path,
    music: &Path,
    output: &Path,
    music_volume: f64,
    probe: &MediaProbe,
) -> FfmpegCommand {
    let fade_start = (probe.duration - 3.0).max(0.0);

    let filter = if probe.has_audio {
        format!(
            "[1:a]volume={music_volume:.2},afade=t=out:st={fade_start:.3}:d=3[m];\
             [0:a][m]amix=inputs=2:duration=first:dropout_transition=2[a]"
        )
    } else {
        format!("[1:a]volume={music_volume:.2},afade=t=out:st={fade_start:.3}:d=3[a]")
    };

    FfmpegCommand::new(video, output)
        .input(music)
        .input_arg("-stream_loop")
        .input_arg("-1")
        .filter_complex(filter)
        .map("0:v")
        .map("[a]")
        .video_codec("copy")
        .audio_codec("aac")
        .shortest()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trim_rejects_empty_window() {
        let engine = FfmpegEngine {
            runner: FfmpegRunner::new(),
        };
        let opts = TrimOptions {
            input: PathBuf::from("in.mp4"),
            output: PathBuf::from("out.mp4"),
            start: 10.0,
            end: 10.0,
            speed_factor: None,
            width: 1280,
            height: 720,
        };
        let result = engine.trim_with_fade(&opts).await;
        assert!(matches!(result, Err(MediaError::InvalidMedia(_))));
    }

    #[tokio::test]
    async fn test_concat_rejects_empty_list() {
        let engine = FfmpegEngine {
            runner: FfmpegRunner::new(),
        };
        let result = engine.concat(&[], Path::new("out.mp4")).await;
        assert!(matches!(result, Err(MediaError::InvalidMedia(_))));
    }

    #[tokio::test]
    async fn test_ending_card_requires_image() {
        let engine = FfmpegEngine {
            runner: FfmpegRunner::new(),
        };
        let opts = EndingCardOptions {
            image: PathBuf::from("/nonexistent/card.png"),
            output: PathBuf::from("out.mp4"),
            text: "Thank you".to_string(),
            duration: 10.0,
            width: 1280,
            height: 720,
        };
        let result = engine.ending_card(&opts).await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }

    #[test]
    fn test_music_mix_loops_short_tracks() {
        let probe = MediaProbe {
            duration: 30.0,
            width: Some(1280),
            height: Some(720),
            has_audio: false,
        };
        let cmd = music_mix_command(
            Path::new("timeline.mp4"),
            Path::new("bed.mp3"),
            Path::new("out.mp4"),
            1.0,
            &probe,
        );
        let args = cmd.build_args();

        // The loop flag precedes the music input, so -shortest ends at the
        // video rather than the track.
        let loop_pos = args.iter().position(|a| a == "-stream_loop").unwrap();
        let music_pos = args.iter().position(|a| a == "bed.mp3").unwrap();
        let video_pos = args.iter().position(|a| a == "timeline.mp4").unwrap();
        assert!(video_pos < loop_pos && loop_pos < music_pos);
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn test_music_mix_keeps_existing_audio() {
        let probe = MediaProbe {
            duration: 30.0,
            width: Some(1280),
            height: Some(720),
            has_audio: true,
        };
        let cmd = music_mix_command(
            Path::new("timeline.mp4"),
            Path::new("bed.mp3"),
            Path::new("out.mp4"),
            0.5,
            &probe,
        );
        let args = cmd.build_args();
        let filter = args
            .iter()
            .position(|a| a == "-filter_complex")
            .map(|i| args[i + 1].clone())
            .unwrap();
        assert!(filter.contains("amix=inputs=2"));
        assert!(filter.contains("volume=0.50"));
    }
}
