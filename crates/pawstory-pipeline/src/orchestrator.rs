//! Job and project pipeline orchestration.
//!
//! Orchestrators run on detached tokio tasks spawned by the HTTP handlers.
//! They never panic across the task boundary: every failure is converted to
//! a terminal `failed` status with a human-readable cause in the store.

use std::path::PathBuf;
use std::sync::Arc;

use pawstory_ai::PetContext;
use pawstory_media::MediaEngine;
use pawstory_models::{JobId, Project, ProjectId, ProjectStatus};
use pawstory_store::{JobStore, ProjectStore};

use crate::audio::AudioAligner;
use crate::classify::ContentClassifier;
use crate::compositor::TimelineCompositor;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::highlights::HighlightExtractor;
use crate::logging::PipelineLogger;
use crate::narration::NarrationComposer;
use crate::segmenting::SegmentBuilder;

/// Runs the single-video highlight pipeline.
pub struct JobOrchestrator {
    store: Arc<dyn JobStore>,
    engine: Arc<dyn MediaEngine>,
    classifier: ContentClassifier,
    extractor: HighlightExtractor,
    compositor: TimelineCompositor,
    config: PipelineConfig,
}

impl JobOrchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        engine: Arc<dyn MediaEngine>,
        classifier: ContentClassifier,
        compositor: TimelineCompositor,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            engine,
            classifier,
            extractor: HighlightExtractor::new(),
            compositor,
            config,
        }
    }

    /// Run the pipeline to a terminal status. Intended for `tokio::spawn`.
    pub async fn run(&self, job_id: JobId) {
        let logger = PipelineLogger::for_job(&job_id);
        match self.execute(&job_id, &logger).await {
            Ok(()) => logger.log_completion("highlight reel rendered"),
            Err(e) => {
                logger.log_error(&e.to_string());
                let message = e.to_string();
                let _ = self
                    .store
                    .update(&job_id, Box::new(move |j| j.fail(message)))
                    .await;
            }
        }
    }

    async fn execute(&self, job_id: &JobId, logger: &PipelineLogger) -> PipelineResult<()> {
        let job = self
            .store
            .update(job_id, Box::new(|j| j.start()))
            .await?;

        logger.log_stage("extract_frames");
        let frames = self
            .engine
            .extract_frames(
                &job.video_path,
                &job.frames_dir,
                self.config.job_frame_fps,
                &self.config.frame_scale,
            )
            .await?;

        logger.log_stage("segment");
        let builder = SegmentBuilder::new(
            self.config.job_segment_size,
            self.config.job_frame_interval(),
        );
        let mut segments = builder.build(&frames)?;

        logger.log_stage("classify");
        let successes = self
            .classifier
            .classify_segments(&mut segments, &PetContext::default())
            .await;
        // At least half the segments must classify for the result to mean
        // anything.
        if successes * 2 < segments.len() {
            return Err(PipelineError::AnalysisFailed(format!(
                "only {successes} of {} segments classified",
                segments.len()
            )));
        }

        logger.log_stage("extract_highlights");
        let highlights = self.extractor.extract(&segments);
        if highlights.is_empty() {
            return Err(PipelineError::NoHighlightsFound);
        }
        logger.log_progress(&format!("{} highlights found", highlights.len()));

        logger.log_stage("render_reel");
        let job_dir = self.config.storage_dir.join("videos").join(job_id.as_str());
        let output = job_dir.join("highlight.mp4");
        self.compositor
            .compose_reel(&job.video_path, &highlights, &job_dir.join("work"), &output)
            .await?;

        self.store
            .update(
                job_id,
                Box::new(move |j| {
                    j.segments = segments;
                    j.highlights = highlights;
                    j.output_path = Some(output);
                    j.complete();
                }),
            )
            .await?;
        Ok(())
    }
}

/// Runs the multi-video story pipeline.
pub struct ProjectOrchestrator {
    store: Arc<dyn ProjectStore>,
    engine: Arc<dyn MediaEngine>,
    classifier: ContentClassifier,
    extractor: HighlightExtractor,
    composer: NarrationComposer,
    aligner: AudioAligner,
    compositor: TimelineCompositor,
    config: PipelineConfig,
}

impl ProjectOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ProjectStore>,
        engine: Arc<dyn MediaEngine>,
        classifier: ContentClassifier,
        composer: NarrationComposer,
        aligner: AudioAligner,
        compositor: TimelineCompositor,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            engine,
            classifier,
            extractor: HighlightExtractor::new(),
            composer,
            aligner,
            compositor,
            config,
        }
    }

    /// Run the pipeline to a terminal status. Intended for `tokio::spawn`.
    pub async fn run(&self, project_id: ProjectId) {
        let logger = PipelineLogger::for_project(&project_id);
        match self.execute(&project_id, &logger).await {
            Ok(()) => logger.log_completion("story video rendered"),
            Err(e) => {
                logger.log_error(&e.to_string());
                let message = e.to_string();
                let _ = self
                    .store
                    .update(&project_id, Box::new(move |p| p.fail(message)))
                    .await;
            }
        }
    }

    async fn execute(
        &self,
        project_id: &ProjectId,
        logger: &PipelineLogger,
    ) -> PipelineResult<()> {
        let project = self
            .store
            .update(
                project_id,
                Box::new(|p| {
                    p.advance(ProjectStatus::Analyzing);
                }),
            )
            .await?;

        logger.log_stage("analyze");
        let analyzed = self.analyze_videos(project_id, &project, logger).await?;
        if analyzed == 0 {
            return Err(PipelineError::AnalysisFailed(
                "analysis failed for every video".to_string(),
            ));
        }
        logger.log_progress(&format!(
            "{analyzed} of {} videos analyzed",
            project.videos.len()
        ));

        let project = self
            .store
            .update(
                project_id,
                Box::new(|p| {
                    p.advance(ProjectStatus::GeneratingStory);
                }),
            )
            .await?;

        logger.log_stage("generate_story");
        let mut story = self.composer.compose(&project).await?;

        logger.log_stage("synthesize_narration");
        let project_dir = self
            .config
            .storage_dir
            .join("projects")
            .join(project_id.as_str());
        self.aligner.align(&mut story, &project_dir.join("audio")).await?;

        let story_for_store = story.clone();
        let project = self
            .store
            .update(
                project_id,
                Box::new(move |p| {
                    p.story = Some(story_for_store);
                    p.advance(ProjectStatus::GeneratingVideo);
                }),
            )
            .await?;

        logger.log_stage("compose_video");
        let output = project_dir.join("final.mp4");
        self.compositor
            .compose(&project, &story, &project_dir.join("work"), &output)
            .await?;

        self.store
            .update(
                project_id,
                Box::new(move |p| {
                    p.output_path = Some(output);
                    p.advance(ProjectStatus::Completed);
                }),
            )
            .await?;
        Ok(())
    }

    /// Analyze each video sequentially, writing results back per video.
    /// Returns how many videos were analyzed successfully.
    async fn analyze_videos(
        &self,
        project_id: &ProjectId,
        project: &Project,
        logger: &PipelineLogger,
    ) -> PipelineResult<usize> {
        let context = PetContext {
            pet_name: Some(project.pet_name.clone()),
            pet_breed: project.pet_breed.clone(),
        };
        let builder = SegmentBuilder::new(
            self.config.project_segment_size,
            self.config.project_frame_interval(),
        );

        let mut analyzed = 0;
        for (index, video) in project.videos.iter().enumerate() {
            let frames = match self
                .engine
                .extract_frames(
                    &video.path,
                    &video.frames_dir,
                    self.config.project_frame_fps,
                    &self.config.frame_scale,
                )
                .await
            {
                Ok(frames) => frames,
                Err(e) => {
                    logger.log_warning(&format!(
                        "frame extraction failed for {}: {e}",
                        video.original_name
                    ));
                    continue;
                }
            };

            let mut segments = match builder.build(&frames) {
                Ok(segments) => segments,
                Err(e) => {
                    logger.log_warning(&format!(
                        "segmentation failed for {}: {e}",
                        video.original_name
                    ));
                    continue;
                }
            };

            let success = self.classifier.classify_video(&mut segments, &context).await;
            let highlights = self.extractor.extract(&segments);

            if success {
                analyzed += 1;
            } else {
                logger.log_warning(&format!("analysis failed for {}", video.original_name));
            }

            self.store
                .update(
                    project_id,
                    Box::new(move |p| {
                        if let Some(v) = p.videos.get_mut(index) {
                            v.segments = segments;
                            v.highlights = highlights;
                            v.analyzed = success;
                        }
                    }),
                )
                .await?;
        }

        Ok(analyzed)
    }
}

/// Output location for a job's highlight reel.
pub fn job_output_path(storage_dir: &std::path::Path, job_id: &JobId) -> PathBuf {
    storage_dir
        .join("videos")
        .join(job_id.as_str())
        .join("highlight.mp4")
}

/// Output location for a project's final video.
pub fn project_output_path(storage_dir: &std::path::Path, project_id: &ProjectId) -> PathBuf {
    storage_dir
        .join("projects")
        .join(project_id.as_str())
        .join("final.mp4")
}
