//! Final video assembly.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use pawstory_media::{
    render_srt, wrap_text, EndingCardOptions, MediaEngine, SrtCue, TrimOptions,
};
use pawstory_models::{Highlight, Project, Story};

use crate::audio::speed_factor;
use crate::error::{PipelineError, PipelineResult};

/// Character width subtitles and card text are wrapped to.
const SUBTITLE_WRAP_CHARS: usize = 40;
const CARD_WRAP_CHARS: usize = 28;

/// Compositor tunables, a slice of the pipeline config.
#[derive(Debug, Clone)]
pub struct CompositorConfig {
    pub target_width: u32,
    pub target_height: u32,
    pub ending_card_secs: f64,
    /// Supplied music file; a sine bed is generated when unset.
    pub background_music: Option<PathBuf>,
    pub music_volume: f64,
}

/// Assembles the final story video in four passes.
///
/// Pass 1 (trim, concat, narration mux) is fatal on failure. Passes 2-4
/// (ending card, subtitles, background music) are enrichments: a failure
/// logs a warning and carries the previous artifact forward. Each pass
/// removes its intermediates once its successor exists.
pub struct TimelineCompositor {
    engine: Arc<dyn MediaEngine>,
    config: CompositorConfig,
}

impl TimelineCompositor {
    pub fn new(engine: Arc<dyn MediaEngine>, config: CompositorConfig) -> Self {
        Self { engine, config }
    }

    /// Render the full narrated story video to `output`.
    pub async fn compose(
        &self,
        project: &Project,
        story: &Story,
        work_dir: &Path,
        output: &Path,
    ) -> PipelineResult<()> {
        tokio::fs::create_dir_all(work_dir).await?;

        let mut current = self.assemble_timeline(project, story, work_dir).await?;

        current = self.apply_ending_card(project, story, work_dir, current).await;
        current = self.apply_subtitles(story, work_dir, current).await;
        current = self.apply_music(work_dir, current).await;

        finalize(&current, output).await?;
        info!(output = %output.display(), "Story video rendered");
        Ok(())
    }

    /// Pass 1: cut each chapter's clip, concatenate, mux narration.
    async fn assemble_timeline(
        &self,
        project: &Project,
        story: &Story,
        work_dir: &Path,
    ) -> PipelineResult<PathBuf> {
        let mut clips = Vec::with_capacity(story.chapters.len());

        for chapter in &story.chapters {
            let video = project
                .videos
                .iter()
                .find(|v| v.id == chapter.video_id)
                .ok_or_else(|| {
                    PipelineError::CompositionFailed(format!(
                        "chapter {} references unknown video {}",
                        chapter.index, chapter.video_id
                    ))
                })?;

            let speed = chapter
                .audio_path
                .is_some()
                .then(|| speed_factor(chapter.clip_duration(), chapter.duration));

            let clip_path = work_dir.join(format!("clip_{:02}.mp4", chapter.index));
            let opts = TrimOptions {
                input: video.path.clone(),
                output: clip_path.clone(),
                start: chapter.start,
                end: chapter.end,
                speed_factor: speed,
                width: self.config.target_width,
                height: self.config.target_height,
            };
            self.engine
                .trim_with_fade(&opts)
                .await
                .map_err(|e| PipelineError::CompositionFailed(e.to_string()))?;
            clips.push(clip_path);
        }

        let timeline = work_dir.join("timeline.mp4");
        self.engine
            .concat(&clips, &timeline)
            .await
            .map_err(|e| PipelineError::CompositionFailed(e.to_string()))?;
        remove_all(&clips).await;

        if !story.chapters.iter().any(|c| c.audio_path.is_some()) {
            return Ok(timeline);
        }

        // Silent chapters get a silence gap so narration stays in sync.
        let mut tracks = Vec::with_capacity(story.chapters.len());
        for chapter in &story.chapters {
            match &chapter.audio_path {
                Some(path) => tracks.push(path.clone()),
                None => {
                    let gap = work_dir.join(format!("silence_{:02}.mp3", chapter.index));
                    self.engine
                        .generate_silence(&gap, chapter.duration)
                        .await
                        .map_err(|e| PipelineError::CompositionFailed(e.to_string()))?;
                    tracks.push(gap);
                }
            }
        }

        let narration = work_dir.join("narration.mp3");
        self.engine
            .concat_audio(&tracks, &narration)
            .await
            .map_err(|e| PipelineError::CompositionFailed(e.to_string()))?;

        let narrated = work_dir.join("narrated.mp4");
        self.engine
            .mux_audio(&timeline, &narration, &narrated)
            .await
            .map_err(|e| PipelineError::CompositionFailed(e.to_string()))?;

        let _ = tokio::fs::remove_file(&timeline).await;
        let _ = tokio::fs::remove_file(&narration).await;
        Ok(narrated)
    }

    /// Pass 2: render and append the ending card. Non-fatal.
    async fn apply_ending_card(
        &self,
        project: &Project,
        story: &Story,
        work_dir: &Path,
        current: PathBuf,
    ) -> PathBuf {
        let Some(image) = &project.ending_image else {
            return current;
        };

        let text = story
            .closing_statement
            .clone()
            .or_else(|| story.owner_message.clone())
            .unwrap_or_else(|| format!("Thank you, {}", project.pet_name));

        let card = work_dir.join("ending_card.mp4");
        let opts = EndingCardOptions {
            image: image.clone(),
            output: card.clone(),
            text: wrap_text(&text, CARD_WRAP_CHARS),
            duration: self.config.ending_card_secs,
            width: self.config.target_width,
            height: self.config.target_height,
        };

        if let Err(e) = self.engine.ending_card(&opts).await {
            warn!("Ending card render failed, continuing without it: {e}");
            return current;
        }

        let with_card = work_dir.join("with_card.mp4");
        match self.engine.append_card(&current, &card, &with_card).await {
            Ok(()) => {
                let _ = tokio::fs::remove_file(&card).await;
                let _ = tokio::fs::remove_file(&current).await;
                with_card
            }
            Err(e) => {
                warn!("Ending card append failed, continuing without it: {e}");
                let _ = tokio::fs::remove_file(&card).await;
                current
            }
        }
    }

    /// Pass 3: burn one subtitle cue per chapter, timed cumulatively from
    /// zero by chapter duration. Non-fatal.
    async fn apply_subtitles(&self, story: &Story, work_dir: &Path, current: PathBuf) -> PathBuf {
        let mut cues = Vec::with_capacity(story.chapters.len());
        let mut clock = 0.0;
        for chapter in &story.chapters {
            cues.push(SrtCue {
                start: clock,
                end: clock + chapter.duration,
                text: wrap_text(&chapter.narration, SUBTITLE_WRAP_CHARS),
            });
            clock += chapter.duration;
        }

        let srt_path = work_dir.join("story.srt");
        if let Err(e) = tokio::fs::write(&srt_path, render_srt(&cues)).await {
            warn!("Subtitle file write failed, continuing without subtitles: {e}");
            return current;
        }

        let subtitled = work_dir.join("subtitled.mp4");
        match self
            .engine
            .burn_subtitles(&current, &srt_path, &subtitled)
            .await
        {
            Ok(()) => {
                let _ = tokio::fs::remove_file(&srt_path).await;
                let _ = tokio::fs::remove_file(&current).await;
                subtitled
            }
            Err(e) => {
                warn!("Subtitle burn failed, continuing without subtitles: {e}");
                let _ = tokio::fs::remove_file(&srt_path).await;
                current
            }
        }
    }

    /// Pass 4: mix background music under the timeline. Non-fatal.
    async fn apply_music(&self, work_dir: &Path, current: PathBuf) -> PathBuf {
        let music = match &self.config.background_music {
            Some(path) if path.exists() => path.clone(),
            _ => {
                let duration = match self.engine.probe(&current).await {
                    Ok(probe) => probe.duration,
                    Err(e) => {
                        warn!("Timeline probe failed, skipping music: {e}");
                        return current;
                    }
                };
                let generated = work_dir.join("music.mp3");
                if let Err(e) = self.engine.generate_music(&generated, duration).await {
                    warn!("Music generation failed, skipping music: {e}");
                    return current;
                }
                generated
            }
        };

        let with_music = work_dir.join("with_music.mp4");
        match self
            .engine
            .mix_music(&current, &music, &with_music, self.config.music_volume)
            .await
        {
            Ok(()) => {
                let _ = tokio::fs::remove_file(&current).await;
                with_music
            }
            Err(e) => {
                warn!("Music mix failed, continuing without music: {e}");
                current
            }
        }
    }

    /// Render a single-video highlight reel: every highlight trimmed with
    /// fades at natural speed, then concatenated.
    pub async fn compose_reel(
        &self,
        video: &Path,
        highlights: &[Highlight],
        work_dir: &Path,
        output: &Path,
    ) -> PipelineResult<()> {
        tokio::fs::create_dir_all(work_dir).await?;

        let mut clips = Vec::with_capacity(highlights.len());
        for (i, highlight) in highlights.iter().enumerate() {
            let clip_path = work_dir.join(format!("clip_{:02}.mp4", i + 1));
            let opts = TrimOptions {
                input: video.to_path_buf(),
                output: clip_path.clone(),
                start: highlight.start,
                end: highlight.end,
                speed_factor: None,
                width: self.config.target_width,
                height: self.config.target_height,
            };
            self.engine
                .trim_with_fade(&opts)
                .await
                .map_err(|e| PipelineError::CompositionFailed(e.to_string()))?;
            clips.push(clip_path);
        }

        let reel = work_dir.join("reel.mp4");
        self.engine
            .concat(&clips, &reel)
            .await
            .map_err(|e| PipelineError::CompositionFailed(e.to_string()))?;
        remove_all(&clips).await;

        finalize(&reel, output).await?;
        info!(output = %output.display(), highlights = highlights.len(), "Reel rendered");
        Ok(())
    }
}

/// Move the finished artifact into place, falling back to copy across
/// filesystems.
async fn finalize(from: &Path, to: &Path) -> PipelineResult<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    if tokio::fs::rename(from, to).await.is_err() {
        tokio::fs::copy(from, to).await?;
        let _ = tokio::fs::remove_file(from).await;
    }
    Ok(())
}

async fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        let _ = tokio::fs::remove_file(path).await;
    }
}
