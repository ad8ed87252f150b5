//! Application state and service wiring.

use std::sync::Arc;

use pawstory_ai::{
    GeminiClient, GeminiNarrator, GeminiVision, GoogleTts, NarrationGenerator,
    SpeechSynthesizer, VisionAnalysis, VoiceProfile,
};
use pawstory_media::{FfmpegEngine, MediaEngine};
use pawstory_pipeline::{
    AudioAligner, CompositorConfig, ContentClassifier, JobOrchestrator, NarrationComposer,
    PipelineConfig, ProjectOrchestrator, TimelineCompositor,
};
use pawstory_store::{InMemoryJobStore, InMemoryProjectStore, JobStore, ProjectStore};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline_config: PipelineConfig,
    pub engine: Arc<dyn MediaEngine>,
    pub jobs: Arc<dyn JobStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub job_orchestrator: Arc<JobOrchestrator>,
    pub project_orchestrator: Arc<ProjectOrchestrator>,
}

impl AppState {
    /// Wire up stores, adapters and orchestrators.
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let pipeline_config = PipelineConfig::from_env()?;

        let engine: Arc<dyn MediaEngine> = Arc::new(FfmpegEngine::new()?);
        let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let projects: Arc<dyn ProjectStore> = Arc::new(InMemoryProjectStore::new());

        let vision: Arc<dyn VisionAnalysis> = Arc::new(GeminiVision::new(GeminiClient::new(
            &pipeline_config.gemini_api_key,
            &pipeline_config.gemini_model,
            pipeline_config.vision_timeout_secs,
        )?));
        let narrator: Arc<dyn NarrationGenerator> =
            Arc::new(GeminiNarrator::new(GeminiClient::new(
                &pipeline_config.gemini_api_key,
                &pipeline_config.gemini_model,
                pipeline_config.narration_timeout_secs,
            )?));
        let tts: Arc<dyn SpeechSynthesizer> = Arc::new(GoogleTts::new(
            &pipeline_config.tts_api_key,
            pipeline_config.tts_timeout_secs,
        )?);

        let compositor_config = CompositorConfig {
            target_width: pipeline_config.target_width,
            target_height: pipeline_config.target_height,
            ending_card_secs: pipeline_config.ending_card_secs,
            background_music: pipeline_config.background_music.clone(),
            music_volume: pipeline_config.music_volume,
        };

        let job_orchestrator = Arc::new(JobOrchestrator::new(
            jobs.clone(),
            engine.clone(),
            ContentClassifier::new(
                vision.clone(),
                pipeline_config.classify_throttle_ms,
                pipeline_config.max_images_per_call,
            ),
            TimelineCompositor::new(engine.clone(), compositor_config.clone()),
            pipeline_config.clone(),
        ));

        let project_orchestrator = Arc::new(ProjectOrchestrator::new(
            projects.clone(),
            engine.clone(),
            ContentClassifier::new(
                vision,
                pipeline_config.classify_throttle_ms,
                pipeline_config.max_images_per_call,
            ),
            NarrationComposer::new(
                narrator,
                pipeline_config.target_chapter_count,
                pipeline_config.clip_fallback_secs,
                pipeline_config.closing_min_chars,
                pipeline_config.closing_max_chars,
            ),
            AudioAligner::new(tts, engine.clone(), VoiceProfile::default()),
            TimelineCompositor::new(engine.clone(), compositor_config),
            pipeline_config.clone(),
        ));

        Ok(Self {
            config,
            pipeline_config,
            engine,
            jobs,
            projects,
            job_orchestrator,
            project_orchestrator,
        })
    }
}
