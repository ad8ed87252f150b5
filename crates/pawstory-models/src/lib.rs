//! Shared data models for the PawStory backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs (single-video highlight extraction) and their lifecycle
//! - Projects (multi-video narrated stories) and their lifecycle
//! - Segments, frame-level analyses and merged highlights
//! - Stories, chapters and narration tone modes

pub mod analysis;
pub mod highlight;
pub mod ids;
pub mod job;
pub mod project;
pub mod segment;
pub mod story;
pub mod tone;

// Re-export common types
pub use analysis::{Analysis, Emotion, InteractionKind};
pub use highlight::{Highlight, CAPTION_JOIN};
pub use ids::{JobId, ProjectId, VideoId};
pub use job::{Job, JobStatus};
pub use project::{Project, ProjectStatus, VideoInfo};
pub use segment::Segment;
pub use story::{Chapter, Story};
pub use tone::{ToneMode, ToneProfile};
