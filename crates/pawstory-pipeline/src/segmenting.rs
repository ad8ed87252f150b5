//! Grouping sampled frames into fixed-duration segments.

use std::path::PathBuf;

use pawstory_models::Segment;

use crate::error::{PipelineError, PipelineResult};

/// Groups sampled frames into contiguous segments of a fixed frame count.
///
/// Spans come from index arithmetic alone: frame `i` covers
/// `[i * Δt, (i+1) * Δt)` where Δt is the sampling interval. The final
/// segment may be short.
#[derive(Debug, Clone)]
pub struct SegmentBuilder {
    /// Frames per segment.
    segment_size: usize,
    /// Seconds of footage covered by one frame.
    frame_interval: f64,
}

impl SegmentBuilder {
    pub fn new(segment_size: usize, frame_interval: f64) -> Self {
        debug_assert!(segment_size > 0);
        Self {
            segment_size,
            frame_interval,
        }
    }

    /// Build ⌈N / segment_size⌉ segments from N frames.
    pub fn build(&self, frames: &[PathBuf]) -> PipelineResult<Vec<Segment>> {
        if frames.is_empty() {
            return Err(PipelineError::NoFramesExtracted);
        }

        let segments = frames
            .chunks(self.segment_size)
            .enumerate()
            .map(|(i, chunk)| {
                let first = i * self.segment_size;
                let last = first + chunk.len();
                Segment {
                    index: i + 1,
                    start: first as f64 * self.frame_interval,
                    end: last as f64 * self.frame_interval,
                    frame_paths: chunk.to_vec(),
                    analysis: None,
                }
            })
            .collect();

        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(n: usize) -> Vec<PathBuf> {
        (1..=n)
            .map(|i| PathBuf::from(format!("frame_{i:04}.jpg")))
            .collect()
    }

    #[test]
    fn test_twelve_frames_half_second_interval() {
        // 12 frames at Δt=0.5s with 6 frames per segment: [0,3) and [3,6).
        let builder = SegmentBuilder::new(6, 0.5);
        let segments = builder.build(&frames(12)).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!((segments[0].start, segments[0].end), (0.0, 3.0));
        assert_eq!((segments[1].start, segments[1].end), (3.0, 6.0));
        assert_eq!(segments[0].index, 1);
        assert_eq!(segments[1].index, 2);
    }

    #[test]
    fn test_segment_count_is_ceiling() {
        let builder = SegmentBuilder::new(6, 0.5);
        for n in 1..40 {
            let segments = builder.build(&frames(n)).unwrap();
            assert_eq!(segments.len(), n.div_ceil(6), "n = {n}");
        }
    }

    #[test]
    fn test_segments_are_contiguous_and_cover_all_frames() {
        let builder = SegmentBuilder::new(3, 2.0);
        let segments = builder.build(&frames(13)).unwrap();

        let mut expected_start = 0.0;
        let mut total_frames = 0;
        for segment in &segments {
            assert!((segment.start - expected_start).abs() < 1e-9);
            assert!(segment.end > segment.start);
            expected_start = segment.end;
            total_frames += segment.frame_paths.len();
        }
        assert_eq!(total_frames, 13);
        // Final segment holds the single leftover frame.
        assert_eq!(segments.last().unwrap().frame_paths.len(), 1);
    }

    #[test]
    fn test_no_frames_is_an_error() {
        let builder = SegmentBuilder::new(6, 0.5);
        assert!(matches!(
            builder.build(&[]),
            Err(PipelineError::NoFramesExtracted)
        ));
    }
}
