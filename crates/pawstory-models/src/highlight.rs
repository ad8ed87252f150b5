//! Merged highlight spans.

use serde::{Deserialize, Serialize};

use crate::{Emotion, InteractionKind};

/// Separator used when merging captions of adjacent qualifying segments.
pub const CAPTION_JOIN: &str = " → ";

/// A maximal run of qualifying segments: one candidate "good moment".
///
/// The span is half-open `[start, end)`; highlights from the same source
/// never overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub start: f64,
    pub end: f64,
    /// Captions of the merged segments, joined by [`CAPTION_JOIN`].
    pub caption: String,
    /// Interaction type carried from the seed segment.
    pub interaction: InteractionKind,
    /// Emotion carried from the seed segment.
    pub emotion: Emotion,
}

impl Highlight {
    /// Span length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
