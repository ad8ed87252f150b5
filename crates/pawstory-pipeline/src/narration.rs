//! Story composition from detected highlights.

use std::sync::Arc;
use tracing::warn;

use pawstory_ai::{
    ClosingRequest, HighlightSummary, NarrationGenerator, StoryRequest, VideoHighlights,
};
use pawstory_models::{Chapter, Project, Story};

use crate::error::{PipelineError, PipelineResult};

/// Sentence-ending punctuation recognized by the closing-statement clamp.
const SENTENCE_ENDINGS: &[char] = &['。', '．', '.', '!', '?', '！', '？', '~', '～'];

/// Builds the narrated story for a project.
///
/// Flattens highlights across the project's videos, asks the narration
/// service for a fixed number of chapters, and validates every returned
/// `(video_index, highlight_index)` binding before trusting it.
pub struct NarrationComposer {
    narrator: Arc<dyn NarrationGenerator>,
    chapter_count: usize,
    clip_fallback_secs: f64,
    closing_min_chars: usize,
    closing_max_chars: usize,
}

impl NarrationComposer {
    pub fn new(
        narrator: Arc<dyn NarrationGenerator>,
        chapter_count: usize,
        clip_fallback_secs: f64,
        closing_min_chars: usize,
        closing_max_chars: usize,
    ) -> Self {
        Self {
            narrator,
            chapter_count,
            clip_fallback_secs,
            closing_min_chars,
            closing_max_chars,
        }
    }

    /// Generate the story. Fails fast with [`PipelineError::NoHighlightsFound`]
    /// when the project has no highlights at all.
    pub async fn compose(&self, project: &Project) -> PipelineResult<Story> {
        let videos: Vec<VideoHighlights> = project
            .videos
            .iter()
            .enumerate()
            .map(|(i, v)| VideoHighlights {
                video_index: i,
                highlights: v
                    .highlights
                    .iter()
                    .map(|h| HighlightSummary {
                        caption: h.caption.clone(),
                        duration: h.duration(),
                    })
                    .collect(),
            })
            .filter(|v| !v.highlights.is_empty())
            .collect();

        if videos.is_empty() {
            return Err(PipelineError::NoHighlightsFound);
        }

        let request = StoryRequest {
            pet_name: project.pet_name.clone(),
            pet_breed: project.pet_breed.clone(),
            owner_title: project.owner_title().to_string(),
            tone: project.tone,
            chapter_count: self.chapter_count,
            videos,
        };

        let draft = self
            .narrator
            .generate_story(&request)
            .await
            .map_err(|e| PipelineError::StoryFailed(e.to_string()))?;

        let mut story = Story::new(draft.title);
        for chapter in draft.chapters {
            let Some(video) = project.videos.get(chapter.video_index) else {
                warn!(
                    video_index = chapter.video_index,
                    "Discarding chapter bound to unknown video"
                );
                continue;
            };

            let (start, end) = match video.highlights.get(chapter.highlight_index) {
                Some(highlight) => (highlight.start, highlight.end),
                None => {
                    warn!(
                        video_index = chapter.video_index,
                        highlight_index = chapter.highlight_index,
                        "Highlight reference misses, using fallback window"
                    );
                    (0.0, self.clip_fallback_secs.min(video.duration))
                }
            };

            story.chapters.push(Chapter {
                index: story.chapters.len() + 1,
                narration: chapter.narration,
                video_id: video.id.clone(),
                start,
                end,
                audio_path: None,
                duration: end - start,
            });
        }

        if story.chapters.is_empty() {
            return Err(PipelineError::StoryFailed(
                "every generated chapter referenced an unknown video".to_string(),
            ));
        }

        if let Some(message) = &project.owner_message {
            story.owner_message = Some(message.clone());
            let closing = self.closing_statement(project, &story, message).await;
            story.closing_statement = Some(closing);
        }

        Ok(story)
    }

    /// Generate the pet's reply to the owner message, grounded in the story
    /// just told. Never fatal: any failure falls back to the deterministic
    /// template.
    async fn closing_statement(&self, project: &Project, story: &Story, message: &str) -> String {
        let request = ClosingRequest {
            pet_name: project.pet_name.clone(),
            owner_title: project.owner_title().to_string(),
            owner_message: message.to_string(),
            tone: project.tone,
            story_title: story.title.clone(),
            chapter_narrations: story
                .chapters
                .iter()
                .map(|c| c.narration.clone())
                .collect(),
        };

        let generated = match self.narrator.generate_closing(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Closing statement generation failed: {e}");
                String::new()
            }
        };

        clamp_closing(
            &generated,
            self.closing_min_chars,
            self.closing_max_chars,
        )
        .unwrap_or_else(|| fallback_closing(&project.pet_name))
    }
}

/// Clamp a closing statement into the inclusive `[min, max]` character band.
///
/// Over-long text is truncated at the last sentence-ending punctuation whose
/// position is at or after `min`, else hard-cut at `max`. Text shorter than
/// `min` is rejected (returns `None`) so the caller substitutes the fallback.
pub fn clamp_closing(text: &str, min: usize, max: usize) -> Option<String> {
    let text = text.trim();
    let chars: Vec<char> = text.chars().collect();

    if chars.len() < min {
        return None;
    }
    if chars.len() <= max {
        return Some(text.to_string());
    }

    let window = &chars[..max];
    let cut = window
        .iter()
        .enumerate()
        .skip(min.saturating_sub(1))
        .rev()
        .find(|(_, c)| SENTENCE_ENDINGS.contains(c))
        .map(|(i, _)| i + 1)
        .unwrap_or(max);

    Some(window[..cut].iter().collect())
}

/// Deterministic closing used when generation fails or falls below the band.
pub fn fallback_closing(pet_name: &str) -> String {
    format!("{pet_name} says: thank you for loving me every single day~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_rejected() {
        // 13 characters: below the band, caller must use the fallback.
        assert_eq!(clamp_closing("Love you lots", 40, 60), None);
    }

    #[test]
    fn test_in_band_text_kept() {
        let text = "Thank you for every walk and every warm nap together!";
        assert!(text.chars().count() >= 40 && text.chars().count() <= 60);
        assert_eq!(clamp_closing(text, 40, 60).as_deref(), Some(text));
    }

    #[test]
    fn test_long_text_cut_at_sentence_ending() {
        let text = "Thank you for every walk we took together, truly! \
                    And for all the treats you ever snuck me under the table.";
        let clamped = clamp_closing(text, 40, 60).unwrap();
        assert_eq!(
            clamped,
            "Thank you for every walk we took together, truly!"
        );
        let len = clamped.chars().count();
        assert!((40..=60).contains(&len));
    }

    #[test]
    fn test_long_text_without_punctuation_hard_cut() {
        let text = "a".repeat(100);
        let clamped = clamp_closing(&text, 40, 60).unwrap();
        assert_eq!(clamped.chars().count(), 60);
    }

    #[test]
    fn test_clamp_counts_chars_not_bytes() {
        let text = "ありがとう".repeat(20);
        let clamped = clamp_closing(&text, 40, 60).unwrap();
        assert_eq!(clamped.chars().count(), 60);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        assert_eq!(fallback_closing("Mochi"), fallback_closing("Mochi"));
        assert!(fallback_closing("Mochi").contains("Mochi"));
    }
}
