//! Merging qualifying segments into highlight spans.

use pawstory_models::{Highlight, Segment, CAPTION_JOIN};

/// Run-length merge of qualifying segments.
///
/// Each maximal run of consecutive qualifying segments becomes one
/// [`Highlight`] spanning from the first segment's start to the last
/// segment's end. Zero highlights is a valid result.
#[derive(Debug, Clone, Default)]
pub struct HighlightExtractor;

impl HighlightExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, segments: &[Segment]) -> Vec<Highlight> {
        let mut highlights = Vec::new();
        let mut run: Option<Highlight> = None;

        for segment in segments {
            let analysis = segment
                .analysis
                .as_ref()
                .filter(|a| a.is_qualifying());

            match (analysis, &mut run) {
                (Some(analysis), Some(current)) => {
                    current.end = segment.end;
                    current.caption.push_str(CAPTION_JOIN);
                    current.caption.push_str(&analysis.caption);
                }
                (Some(analysis), None) => {
                    run = Some(Highlight {
                        start: segment.start,
                        end: segment.end,
                        caption: analysis.caption.clone(),
                        interaction: analysis.interaction,
                        emotion: analysis.emotion,
                    });
                }
                (None, _) => {
                    if let Some(current) = run.take() {
                        highlights.push(current);
                    }
                }
            }
        }
        if let Some(current) = run.take() {
            highlights.push(current);
        }

        highlights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawstory_models::{Analysis, Emotion, InteractionKind};

    fn segment(index: usize, qualifying: bool) -> Segment {
        let start = (index - 1) as f64 * 3.0;
        Segment {
            index,
            start,
            end: start + 3.0,
            frame_paths: vec![],
            analysis: Some(if qualifying {
                Analysis {
                    has_pet: true,
                    has_human: true,
                    interaction: InteractionKind::Playing,
                    emotion: Emotion::Happy,
                    caption: format!("moment {index}"),
                }
            } else {
                Analysis::fallback()
            }),
        }
    }

    fn segments(flags: &[bool]) -> Vec<Segment> {
        flags
            .iter()
            .enumerate()
            .map(|(i, q)| segment(i + 1, *q))
            .collect()
    }

    #[test]
    fn test_run_merge() {
        // Flags [T,T,F,T]: segments 1-2 merge, segment 4 stands alone.
        let highlights = HighlightExtractor::new().extract(&segments(&[true, true, false, true]));

        assert_eq!(highlights.len(), 2);
        assert_eq!((highlights[0].start, highlights[0].end), (0.0, 6.0));
        assert_eq!(highlights[0].caption, format!("moment 1{CAPTION_JOIN}moment 2"));
        assert_eq!((highlights[1].start, highlights[1].end), (9.0, 12.0));
        assert_eq!(highlights[1].caption, "moment 4");
    }

    #[test]
    fn test_no_qualifying_segments_yields_empty() {
        let highlights = HighlightExtractor::new().extract(&segments(&[false, false, false]));
        assert!(highlights.is_empty());
        assert!(HighlightExtractor::new().extract(&[]).is_empty());
    }

    #[test]
    fn test_all_qualifying_merges_to_one() {
        let highlights = HighlightExtractor::new().extract(&segments(&[true; 5]));
        assert_eq!(highlights.len(), 1);
        assert_eq!((highlights[0].start, highlights[0].end), (0.0, 15.0));
    }

    #[test]
    fn test_seed_segment_provides_metadata() {
        let mut segs = segments(&[true, true]);
        segs[1].analysis.as_mut().unwrap().interaction = InteractionKind::Cuddling;
        segs[1].analysis.as_mut().unwrap().emotion = Emotion::Calm;

        let highlights = HighlightExtractor::new().extract(&segs);
        assert_eq!(highlights[0].interaction, InteractionKind::Playing);
        assert_eq!(highlights[0].emotion, Emotion::Happy);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let segs = segments(&[true, false, true, true, false]);
        let first = HighlightExtractor::new().extract(&segs);
        let second = HighlightExtractor::new().extract(&segs);
        assert_eq!(first, second);
        // Highlights never overlap and stay ordered.
        for pair in first.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }
}
