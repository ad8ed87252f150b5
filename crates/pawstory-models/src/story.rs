//! Story and chapter definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::VideoId;

/// One narrated beat in the final story, bound to one source clip window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    /// 1-based chapter index.
    pub index: usize,
    /// Narration line spoken over this chapter.
    pub narration: String,
    /// Source video the clip window is cut from.
    pub video_id: VideoId,
    /// Clip window start, seconds.
    pub start: f64,
    /// Clip window end, seconds (exclusive).
    pub end: f64,
    /// Synthesized narration audio, absent when synthesis failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<PathBuf>,
    /// Audio duration once synthesized, clip-window duration until then.
    /// This is the timing source of truth for the subtitle track.
    pub duration: f64,
}

impl Chapter {
    /// Clip window length in seconds, independent of narration audio.
    pub fn clip_duration(&self) -> f64 {
        self.end - self.start
    }
}

/// The assembled narrated story for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub chapters: Vec<Chapter>,
    /// Owner's message to the pet, echoed on the ending card.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_message: Option<String>,
    /// Generated closing statement from the pet, shown on the ending card.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_statement: Option<String>,
}

impl Story {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            chapters: Vec::new(),
            owner_message: None,
            closing_statement: None,
        }
    }

    /// Total timeline length implied by chapter durations, seconds.
    pub fn total_duration(&self) -> f64 {
        self.chapters.iter().map(|c| c.duration).sum()
    }
}
