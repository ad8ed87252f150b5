//! Pipeline error types.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised by the analysis and generation pipelines.
///
/// Orchestrators convert these to a terminal `failed` status with a
/// human-readable cause; nothing crosses the task boundary as a panic.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no frames could be extracted from the video")]
    NoFramesExtracted,

    #[error("no highlights were found in the footage")]
    NoHighlightsFound,

    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("story generation failed: {0}")]
    StoryFailed(String),

    #[error("video composition failed: {0}")]
    CompositionFailed(String),

    #[error(transparent)]
    Media(#[from] pawstory_media::MediaError),

    #[error(transparent)]
    Ai(#[from] pawstory_ai::AiError),

    #[error(transparent)]
    Store(#[from] pawstory_store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
