//! Capability traits for the external AI services.
//!
//! The pipeline depends on these traits only; the Gemini and Google TTS
//! adapters live behind them so tests can substitute doubles.

use async_trait::async_trait;
use std::path::PathBuf;

use pawstory_models::{Analysis, ToneMode};

use crate::error::AiResult;

/// Context about the subject of the footage, threaded into prompts.
#[derive(Debug, Clone, Default)]
pub struct PetContext {
    pub pet_name: Option<String>,
    pub pet_breed: Option<String>,
}

/// Multimodal frame classification.
#[async_trait]
pub trait VisionAnalysis: Send + Sync {
    /// Classify activity across a set of frames, returning one [`Analysis`].
    ///
    /// One attempt per call; any failure is reported, never retried here.
    async fn classify(&self, frames: &[PathBuf], context: &PetContext) -> AiResult<Analysis>;
}

/// One highlight summarized for the narration prompt.
#[derive(Debug, Clone)]
pub struct HighlightSummary {
    pub caption: String,
    pub duration: f64,
}

/// Highlights of one source video, in project order.
#[derive(Debug, Clone)]
pub struct VideoHighlights {
    /// 0-based position of the video within the project.
    pub video_index: usize,
    pub highlights: Vec<HighlightSummary>,
}

/// Inputs for story generation.
#[derive(Debug, Clone)]
pub struct StoryRequest {
    pub pet_name: String,
    pub pet_breed: Option<String>,
    /// How the narration addresses the human ("owner" by default).
    pub owner_title: String,
    pub tone: ToneMode,
    /// Requested number of chapters.
    pub chapter_count: usize,
    pub videos: Vec<VideoHighlights>,
}

/// One chapter as returned by the model, before validation.
#[derive(Debug, Clone)]
pub struct ChapterDraft {
    pub narration: String,
    /// 0-based index into the request's videos.
    pub video_index: usize,
    /// 0-based index into that video's highlights.
    pub highlight_index: usize,
}

/// A generated story before binding to concrete clip windows.
#[derive(Debug, Clone)]
pub struct StoryDraft {
    pub title: String,
    pub chapters: Vec<ChapterDraft>,
}

/// Inputs for the ending-card closing statement.
///
/// Carries the already-told story so the reply can echo its moments.
#[derive(Debug, Clone)]
pub struct ClosingRequest {
    pub pet_name: String,
    pub owner_title: String,
    pub owner_message: String,
    pub tone: ToneMode,
    pub story_title: String,
    /// Narration lines of the story's chapters, in order.
    pub chapter_narrations: Vec<String>,
}

/// Text generation for story and closing statement.
#[async_trait]
pub trait NarrationGenerator: Send + Sync {
    async fn generate_story(&self, request: &StoryRequest) -> AiResult<StoryDraft>;

    /// Generate the pet's short reply to the owner's message.
    async fn generate_closing(&self, request: &ClosingRequest) -> AiResult<String>;
}

/// Voice selection for speech synthesis.
#[derive(Debug, Clone)]
pub struct VoiceProfile {
    pub language_code: String,
    pub name: String,
    pub speaking_rate: f64,
    pub pitch: f64,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            language_code: "en-US".to_string(),
            name: "en-US-Neural2-F".to_string(),
            speaking_rate: 1.0,
            pitch: 2.0,
        }
    }
}

/// Text to speech.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize narration audio, returning encoded MP3 bytes.
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> AiResult<Vec<u8>>;
}
