//! External AI service adapters.
//!
//! The pipeline talks to three capabilities: multimodal frame classification,
//! story/narration text generation, and speech synthesis. Each lives behind a
//! trait in [`traits`]; the concrete adapters here speak to the Gemini and
//! Google Cloud TTS REST APIs over reqwest.

pub mod error;
pub mod gemini;
pub mod tts;
pub mod traits;

pub use error::{AiError, AiResult};
pub use gemini::{GeminiClient, GeminiNarrator, GeminiVision};
pub use traits::{
    ChapterDraft, ClosingRequest, HighlightSummary, NarrationGenerator, PetContext,
    SpeechSynthesizer, StoryDraft, StoryRequest, VideoHighlights, VisionAnalysis, VoiceProfile,
};
pub use tts::GoogleTts;
