//! Narration synthesis and audio/video duration alignment.

use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use pawstory_ai::{SpeechSynthesizer, VoiceProfile};
use pawstory_media::MediaEngine;
use pawstory_models::Story;

use crate::error::PipelineResult;

/// Bounds on the video retiming factor.
pub const MIN_SPEED_FACTOR: f64 = 0.5;
pub const MAX_SPEED_FACTOR: f64 = 2.0;

/// Retiming factor that plays `video_secs` of footage over `audio_secs` of
/// narration: `V / A`, clamped to [0.5, 2.0].
///
/// The compositor applies it as `setpts = PTS / factor`, so a factor below
/// 1.0 slows the clip down and above 1.0 speeds it up.
pub fn speed_factor(video_secs: f64, audio_secs: f64) -> f64 {
    if audio_secs <= 0.0 {
        return 1.0;
    }
    (video_secs / audio_secs).clamp(MIN_SPEED_FACTOR, MAX_SPEED_FACTOR)
}

/// Synthesizes narration audio per chapter and reconciles durations.
///
/// Synthesis failure is never fatal: the chapter stays silent with its
/// clip-window duration, and the final video keeps its natural pacing there.
pub struct AudioAligner {
    tts: Arc<dyn SpeechSynthesizer>,
    engine: Arc<dyn MediaEngine>,
    voice: VoiceProfile,
}

impl AudioAligner {
    pub fn new(
        tts: Arc<dyn SpeechSynthesizer>,
        engine: Arc<dyn MediaEngine>,
        voice: VoiceProfile,
    ) -> Self {
        Self { tts, engine, voice }
    }

    /// Synthesize each chapter's narration into `audio_dir`, probing the
    /// result to replace the chapter duration with the true audio length.
    pub async fn align(&self, story: &mut Story, audio_dir: &Path) -> PipelineResult<()> {
        tokio::fs::create_dir_all(audio_dir).await?;

        for chapter in &mut story.chapters {
            let audio_path = audio_dir.join(format!("chapter_{:02}.mp3", chapter.index));

            let bytes = match self.tts.synthesize(&chapter.narration, &self.voice).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(chapter = chapter.index, "Narration synthesis failed: {e}");
                    chapter.duration = chapter.clip_duration();
                    continue;
                }
            };

            tokio::fs::write(&audio_path, &bytes).await?;

            match self.engine.probe(&audio_path).await {
                Ok(probe) => {
                    chapter.audio_path = Some(audio_path);
                    chapter.duration = probe.duration;
                }
                Err(e) => {
                    warn!(chapter = chapter.index, "Narration audio unreadable: {e}");
                    let _ = tokio::fs::remove_file(&audio_path).await;
                    chapter.duration = chapter.clip_duration();
                }
            }
        }

        Ok(())
    }
}
