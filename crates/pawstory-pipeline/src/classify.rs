//! Segment classification against the vision service.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use pawstory_ai::{PetContext, VisionAnalysis};
use pawstory_models::{Analysis, Segment};

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Classifies segments through a [`VisionAnalysis`] adapter.
///
/// Every classification attempt is made exactly once; any failure yields the
/// neutral fallback [`Analysis`] for the affected segments. Calls are spaced
/// by a rate limiter rather than inline sleeps.
pub struct ContentClassifier {
    vision: Arc<dyn VisionAnalysis>,
    limiter: Option<Limiter>,
    max_images_per_call: usize,
}

impl ContentClassifier {
    pub fn new(
        vision: Arc<dyn VisionAnalysis>,
        throttle_ms: u64,
        max_images_per_call: usize,
    ) -> Self {
        let limiter = Quota::with_period(Duration::from_millis(throttle_ms))
            .map(RateLimiter::direct);
        Self {
            vision,
            limiter,
            max_images_per_call: max_images_per_call.max(1),
        }
    }

    async fn throttle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Per-segment mode: one vision call per segment.
    ///
    /// Returns the number of segments that were classified successfully
    /// (the rest carry the fallback analysis).
    pub async fn classify_segments(
        &self,
        segments: &mut [Segment],
        context: &PetContext,
    ) -> usize {
        let mut successes = 0;

        for segment in segments.iter_mut() {
            self.throttle().await;

            let frames = uniform_subsample(&segment.frame_paths, self.max_images_per_call);
            match self.vision.classify(&frames, context).await {
                Ok(analysis) => {
                    debug!(
                        segment = segment.index,
                        caption = %analysis.caption,
                        "Segment classified"
                    );
                    segment.analysis = Some(analysis);
                    successes += 1;
                }
                Err(e) => {
                    warn!(segment = segment.index, "Classification failed: {e}");
                    segment.analysis = Some(Analysis::fallback());
                }
            }
        }

        successes
    }

    /// Single-call mode: one vision call over frames sampled from the whole
    /// video, with the result broadcast to every segment.
    ///
    /// Returns whether the call succeeded.
    pub async fn classify_video(&self, segments: &mut [Segment], context: &PetContext) -> bool {
        let all_frames: Vec<PathBuf> = segments
            .iter()
            .flat_map(|s| s.frame_paths.iter().cloned())
            .collect();
        let frames = uniform_subsample(&all_frames, self.max_images_per_call);

        self.throttle().await;
        let (analysis, success) = match self.vision.classify(&frames, context).await {
            Ok(analysis) => (analysis, true),
            Err(e) => {
                warn!("Video classification failed: {e}");
                (Analysis::fallback(), false)
            }
        };

        for segment in segments.iter_mut() {
            segment.analysis = Some(analysis.clone());
        }
        success
    }
}

/// Subsample to at most `max` items with a uniform stride of ⌈n / max⌉.
fn uniform_subsample(frames: &[PathBuf], max: usize) -> Vec<PathBuf> {
    if frames.len() <= max {
        return frames.to_vec();
    }
    let stride = frames.len().div_ceil(max);
    frames.iter().step_by(stride).cloned().collect()
}
