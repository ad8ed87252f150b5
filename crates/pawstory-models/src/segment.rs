//! Fixed-duration slices of a source video.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::Analysis;

/// One fixed-duration slice of a source video.
///
/// Spans are half-open `[start, end)` in seconds; segments from the same
/// source are contiguous and non-overlapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// 1-based segment index within its source video.
    pub index: usize,
    /// Start of the covered window, seconds.
    pub start: f64,
    /// End of the covered window, seconds (exclusive).
    pub end: f64,
    /// Still frames sampled inside this window, in time order.
    pub frame_paths: Vec<PathBuf>,
    /// Classification result, absent until the classifier has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
}

impl Segment {
    /// Window length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether this segment counts towards a highlight.
    pub fn is_qualifying(&self) -> bool {
        self.analysis.as_ref().is_some_and(Analysis::is_qualifying)
    }
}
