//! Pipeline configuration, loaded from the environment.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{PipelineError, PipelineResult};

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Tunables for the analysis and generation pipelines.
///
/// Every knob has a production default; the environment overrides
/// individual values.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory for uploads, frames and rendered outputs.
    pub storage_dir: PathBuf,

    pub gemini_api_key: String,
    pub gemini_model: String,
    pub tts_api_key: String,

    /// Frame sampling rate for single-video jobs.
    pub job_frame_fps: f64,
    /// Frame sampling rate for project videos.
    pub project_frame_fps: f64,
    /// Downscale applied at extraction time.
    pub frame_scale: String,
    /// Frames per segment for jobs.
    pub job_segment_size: usize,
    /// Frames per segment for project videos.
    pub project_segment_size: usize,

    /// Cap on images shipped in one vision call.
    pub max_images_per_call: usize,
    /// Minimum gap between consecutive vision calls.
    pub classify_throttle_ms: u64,

    /// Requested number of story chapters.
    pub target_chapter_count: usize,
    /// Clip window length used when a chapter's highlight reference misses.
    pub clip_fallback_secs: f64,

    pub ending_card_secs: f64,
    /// Inclusive character band for the closing statement.
    pub closing_min_chars: usize,
    pub closing_max_chars: usize,

    pub target_width: u32,
    pub target_height: u32,
    /// Optional background music file; a sine bed is generated when unset.
    pub background_music: Option<PathBuf>,
    pub music_volume: f64,

    pub vision_timeout_secs: u64,
    pub narration_timeout_secs: u64,
    pub tts_timeout_secs: u64,
}

impl PipelineConfig {
    pub fn from_env() -> PipelineResult<Self> {
        let gemini_api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            PipelineError::InvalidConfig("GEMINI_API_KEY not set".to_string())
        })?;
        // TTS falls back to the Gemini key; both are Google Cloud keys.
        let tts_api_key =
            std::env::var("GOOGLE_TTS_API_KEY").unwrap_or_else(|_| gemini_api_key.clone());

        Ok(Self {
            storage_dir: PathBuf::from(env_or("STORAGE_DIR", "storage".to_string())),
            gemini_api_key,
            gemini_model: env_or("GEMINI_MODEL", "gemini-2.0-flash".to_string()),
            tts_api_key,
            job_frame_fps: env_or("JOB_FRAME_FPS", 2.0),
            project_frame_fps: env_or("PROJECT_FRAME_FPS", 0.5),
            frame_scale: env_or("FRAME_SCALE", "640:360".to_string()),
            job_segment_size: env_or("JOB_SEGMENT_SIZE", 6),
            project_segment_size: env_or("PROJECT_SEGMENT_SIZE", 3),
            max_images_per_call: env_or("MAX_IMAGES_PER_CALL", 10),
            classify_throttle_ms: env_or("CLASSIFY_THROTTLE_MS", 500),
            target_chapter_count: env_or("TARGET_CHAPTER_COUNT", 5),
            clip_fallback_secs: env_or("CLIP_FALLBACK_SECS", 15.0),
            ending_card_secs: env_or("ENDING_CARD_SECS", 10.0),
            closing_min_chars: env_or("CLOSING_MIN_CHARS", 40),
            closing_max_chars: env_or("CLOSING_MAX_CHARS", 60),
            target_width: env_or("TARGET_WIDTH", 1280),
            target_height: env_or("TARGET_HEIGHT", 720),
            background_music: std::env::var("BACKGROUND_MUSIC").ok().map(PathBuf::from),
            music_volume: env_or("MUSIC_VOLUME", 1.0),
            vision_timeout_secs: env_or("VISION_TIMEOUT_SECS", 60),
            narration_timeout_secs: env_or("NARRATION_TIMEOUT_SECS", 60),
            tts_timeout_secs: env_or("TTS_TIMEOUT_SECS", 30),
        })
    }

    /// Seconds of footage covered by one sampled frame.
    pub fn job_frame_interval(&self) -> f64 {
        1.0 / self.job_frame_fps
    }

    pub fn project_frame_interval(&self) -> f64 {
        1.0 / self.project_frame_fps
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("storage"),
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.0-flash".to_string(),
            tts_api_key: String::new(),
            job_frame_fps: 2.0,
            project_frame_fps: 0.5,
            frame_scale: "640:360".to_string(),
            job_segment_size: 6,
            project_segment_size: 3,
            max_images_per_call: 10,
            classify_throttle_ms: 500,
            target_chapter_count: 5,
            clip_fallback_secs: 15.0,
            ending_card_secs: 10.0,
            closing_min_chars: 40,
            closing_max_chars: 60,
            target_width: 1280,
            target_height: 720,
            background_music: None,
            music_volume: 1.0,
            vision_timeout_secs: 60,
            narration_timeout_secs: 60,
            tts_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_intervals() {
        let config = PipelineConfig::default();
        assert!((config.job_frame_interval() - 0.5).abs() < f64::EPSILON);
        assert!((config.project_frame_interval() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_gemini_key_is_a_config_error() {
        std::env::remove_var("GEMINI_API_KEY");
        let result = PipelineConfig::from_env();
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }
}
