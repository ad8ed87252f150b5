//! FFmpeg CLI wrapper for video processing.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multi-input support
//! - An async runner with bounded timeouts (tokio::process)
//! - FFprobe duration/resolution probing
//! - Frame sampling and transport-side frame compression
//! - The [`MediaEngine`] capability trait and its FFmpeg-backed
//!   implementation covering every compositing pass: trim+fade, concat,
//!   audio mux, ending card, subtitle burn-in and music mixing

pub mod command;
pub mod engine;
pub mod error;
pub mod frames;
pub mod probe;
pub mod subtitles;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use engine::{
    EndingCardOptions, FfmpegEngine, MediaEngine, TrimOptions, CLIP_FADE_SECS,
};
pub use error::{MediaError, MediaResult};
pub use frames::{compress_frame, extract_frames};
pub use probe::{probe_media, MediaProbe};
pub use subtitles::{escape_drawtext, format_srt_time, render_srt, wrap_text, SrtCue};
