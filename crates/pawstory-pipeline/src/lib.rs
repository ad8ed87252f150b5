//! Analysis and generation pipelines.
//!
//! The pipeline turns uploaded pet videos into finished artifacts in two
//! shapes: a single-video highlight reel (jobs) and a multi-video narrated
//! story (projects). Components are built against the capability traits in
//! `pawstory-media` and `pawstory-ai`, so everything here is testable with
//! doubles.

pub mod audio;
pub mod classify;
pub mod compositor;
pub mod config;
pub mod error;
pub mod highlights;
pub mod logging;
pub mod narration;
pub mod orchestrator;
pub mod segmenting;

pub use audio::{speed_factor, AudioAligner, MAX_SPEED_FACTOR, MIN_SPEED_FACTOR};
pub use classify::ContentClassifier;
pub use compositor::{CompositorConfig, TimelineCompositor};
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use highlights::HighlightExtractor;
pub use logging::PipelineLogger;
pub use narration::{clamp_closing, fallback_closing, NarrationComposer};
pub use orchestrator::{
    job_output_path, project_output_path, JobOrchestrator, ProjectOrchestrator,
};
pub use segmenting::SegmentBuilder;
