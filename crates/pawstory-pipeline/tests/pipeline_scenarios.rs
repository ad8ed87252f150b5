//! End-to-end pipeline runs against mocked media and AI services.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;

use pawstory_ai::{
    AiError, AiResult, ChapterDraft, ClosingRequest, NarrationGenerator, PetContext,
    SpeechSynthesizer, StoryDraft, StoryRequest, VisionAnalysis, VoiceProfile,
};
use pawstory_media::{
    EndingCardOptions, MediaEngine, MediaProbe, MediaResult, TrimOptions,
};
use pawstory_models::{
    Analysis, Emotion, Highlight, InteractionKind, Job, JobStatus, Project, ProjectStatus,
    ToneMode, VideoId, VideoInfo,
};
use pawstory_pipeline::{
    fallback_closing, AudioAligner, CompositorConfig, ContentClassifier, JobOrchestrator,
    NarrationComposer, PipelineConfig, ProjectOrchestrator, TimelineCompositor,
};
use pawstory_store::{InMemoryJobStore, InMemoryProjectStore, JobStore, ProjectStore};

mock! {
    Engine {}

    #[async_trait]
    impl MediaEngine for Engine {
        async fn probe(&self, path: &Path) -> MediaResult<MediaProbe>;
        async fn extract_frames(
            &self,
            video: &Path,
            out_dir: &Path,
            fps: f64,
            scale: &str,
        ) -> MediaResult<Vec<PathBuf>>;
        async fn trim_with_fade(&self, opts: &TrimOptions) -> MediaResult<()>;
        async fn concat(&self, clips: &[PathBuf], output: &Path) -> MediaResult<()>;
        async fn concat_audio(&self, tracks: &[PathBuf], output: &Path) -> MediaResult<()>;
        async fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()>;
        async fn ending_card(&self, opts: &EndingCardOptions) -> MediaResult<()>;
        async fn append_card(&self, main: &Path, card: &Path, output: &Path) -> MediaResult<()>;
        async fn burn_subtitles(&self, video: &Path, srt: &Path, output: &Path) -> MediaResult<()>;
        async fn mix_music(
            &self,
            video: &Path,
            music: &Path,
            output: &Path,
            music_volume: f64,
        ) -> MediaResult<()>;
        async fn generate_music(&self, output: &Path, duration: f64) -> MediaResult<()>;
        async fn generate_silence(&self, output: &Path, duration: f64) -> MediaResult<()>;
    }
}

mock! {
    Vision {}

    #[async_trait]
    impl VisionAnalysis for Vision {
        async fn classify(&self, frames: &[PathBuf], context: &PetContext) -> AiResult<Analysis>;
    }
}

mock! {
    Narrator {}

    #[async_trait]
    impl NarrationGenerator for Narrator {
        async fn generate_story(&self, request: &StoryRequest) -> AiResult<StoryDraft>;
        async fn generate_closing(&self, request: &ClosingRequest) -> AiResult<String>;
    }
}

mock! {
    Tts {}

    #[async_trait]
    impl SpeechSynthesizer for Tts {
        async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> AiResult<Vec<u8>>;
    }
}

fn qualifying_analysis(caption: &str) -> Analysis {
    Analysis {
        has_pet: true,
        has_human: true,
        interaction: InteractionKind::Playing,
        emotion: Emotion::Happy,
        caption: caption.to_string(),
    }
}

fn non_qualifying_analysis() -> Analysis {
    Analysis {
        has_pet: true,
        has_human: false,
        interaction: InteractionKind::None,
        emotion: Emotion::Calm,
        caption: "pet resting alone".to_string(),
    }
}

fn fake_frames(n: usize) -> Vec<PathBuf> {
    (1..=n)
        .map(|i| PathBuf::from(format!("frame_{i:04}.jpg")))
        .collect()
}

fn touch_output(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"artifact").unwrap();
}

fn test_config(storage: &Path) -> PipelineConfig {
    PipelineConfig {
        storage_dir: storage.to_path_buf(),
        classify_throttle_ms: 0,
        ..PipelineConfig::default()
    }
}

fn video_info(name: &str) -> VideoInfo {
    VideoInfo {
        id: VideoId::new(),
        original_name: name.to_string(),
        path: PathBuf::from(format!("uploads/{name}")),
        duration: 30.0,
        frames_dir: PathBuf::from(format!("frames/{name}")),
        analyzed: false,
        segments: Vec::new(),
        highlights: Vec::new(),
    }
}

/// A filesystem-faking engine: every rendering operation just creates its
/// output file so downstream passes and the final move succeed.
fn rendering_engine() -> MockEngine {
    let mut engine = MockEngine::new();
    engine.expect_trim_with_fade().returning(|opts| {
        touch_output(&opts.output);
        Ok(())
    });
    engine.expect_concat().returning(|_, output| {
        touch_output(output);
        Ok(())
    });
    engine.expect_burn_subtitles().returning(|_, _, output| {
        touch_output(output);
        Ok(())
    });
    engine.expect_probe().returning(|_| {
        Ok(MediaProbe {
            duration: 24.0,
            width: Some(1280),
            height: Some(720),
            has_audio: false,
        })
    });
    engine.expect_generate_music().returning(|output, _| {
        touch_output(output);
        Ok(())
    });
    engine.expect_mix_music().returning(|_, _, output, _| {
        touch_output(output);
        Ok(())
    });
    engine
}

fn project_orchestrator(
    store: Arc<dyn ProjectStore>,
    engine: MockEngine,
    vision: MockVision,
    narrator: MockNarrator,
    tts: MockTts,
    config: PipelineConfig,
) -> ProjectOrchestrator {
    let engine: Arc<dyn MediaEngine> = Arc::new(engine);
    let classifier = ContentClassifier::new(
        Arc::new(vision),
        config.classify_throttle_ms,
        config.max_images_per_call,
    );
    let composer = NarrationComposer::new(
        Arc::new(narrator),
        config.target_chapter_count,
        config.clip_fallback_secs,
        config.closing_min_chars,
        config.closing_max_chars,
    );
    let aligner = AudioAligner::new(Arc::new(tts), engine.clone(), VoiceProfile::default());
    let compositor = TimelineCompositor::new(
        engine.clone(),
        CompositorConfig {
            target_width: config.target_width,
            target_height: config.target_height,
            ending_card_secs: config.ending_card_secs,
            background_music: config.background_music.clone(),
            music_volume: config.music_volume,
        },
    );
    ProjectOrchestrator::new(store, engine, classifier, composer, aligner, compositor, config)
}

#[tokio::test]
async fn project_with_no_highlights_fails() {
    let storage = tempfile::tempdir().unwrap();
    let store = Arc::new(InMemoryProjectStore::new());

    let mut project = Project::new("lazy sunday", "Biscuit", ToneMode::Playful);
    project.videos.push(video_info("nap.mp4"));
    project.videos.push(video_info("more_nap.mp4"));
    let project_id = project.id.clone();
    store.insert(project).await;

    let mut engine = MockEngine::new();
    engine
        .expect_extract_frames()
        .returning(|_, _, _, _| Ok(fake_frames(6)));

    // Classification succeeds but nothing qualifies.
    let mut vision = MockVision::new();
    vision
        .expect_classify()
        .returning(|_, _| Ok(non_qualifying_analysis()));

    let orchestrator = project_orchestrator(
        store.clone(),
        engine,
        vision,
        MockNarrator::new(),
        MockTts::new(),
        test_config(storage.path()),
    );
    orchestrator.run(project_id.clone()).await;

    let project = store.get(&project_id).await.unwrap();
    assert_eq!(project.status, ProjectStatus::Failed);
    assert!(project.error.as_deref().unwrap().contains("highlights"));
    assert!(project.story.is_none());
}

#[tokio::test]
async fn project_proceeds_when_two_of_five_videos_analyze() {
    let storage = tempfile::tempdir().unwrap();
    let store = Arc::new(InMemoryProjectStore::new());

    let mut project = Project::new("park week", "Mochi", ToneMode::Heartfelt);
    for i in 0..5 {
        project.videos.push(video_info(&format!("day_{i}.mp4")));
    }
    let project_id = project.id.clone();
    let good_ids = [project.videos[0].id.clone(), project.videos[1].id.clone()];
    store.insert(project).await;

    let mut engine = rendering_engine();
    engine
        .expect_extract_frames()
        .returning(|_, _, _, _| Ok(fake_frames(6)));

    // First two vision calls succeed with qualifying footage, the other
    // three videos fail outright.
    let calls = AtomicUsize::new(0);
    let mut vision = MockVision::new();
    vision.expect_classify().returning(move |_, _| {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        if n < 2 {
            Ok(qualifying_analysis("zoomies in the park"))
        } else {
            Err(AiError::Status {
                code: 503,
                body: "overloaded".to_string(),
            })
        }
    });

    let mut narrator = MockNarrator::new();
    narrator.expect_generate_story().returning(|request| {
        // Only the surviving videos' highlights reach the prompt.
        assert_eq!(request.videos.len(), 2);
        Ok(StoryDraft {
            title: "A Week At The Park".to_string(),
            chapters: vec![
                ChapterDraft {
                    narration: "I ran and ran until my ears flew.".to_string(),
                    video_index: 0,
                    highlight_index: 0,
                },
                ChapterDraft {
                    narration: "Then we played until the sun got sleepy.".to_string(),
                    video_index: 1,
                    highlight_index: 0,
                },
            ],
        })
    });

    let mut tts = MockTts::new();
    tts.expect_synthesize()
        .returning(|_, _| Err(AiError::EmptyResponse));

    let orchestrator = project_orchestrator(
        store.clone(),
        engine,
        vision,
        narrator,
        tts,
        test_config(storage.path()),
    );
    orchestrator.run(project_id.clone()).await;

    let project = store.get(&project_id).await.unwrap();
    assert_eq!(project.status, ProjectStatus::Completed, "{:?}", project.error);
    assert!(project.output_path.is_some());

    let story = project.story.unwrap();
    assert_eq!(story.chapters.len(), 2);
    for chapter in &story.chapters {
        assert!(good_ids.contains(&chapter.video_id));
    }

    // The failed videos were recorded as unanalyzed.
    assert_eq!(project.videos.iter().filter(|v| v.analyzed).count(), 2);
}

#[tokio::test]
async fn closing_statement_falls_back_when_generation_is_unusable() {
    let mut project = Project::new("goodbye", "Biscuit", ToneMode::Heartfelt);
    project.owner_message = Some("Thank you for eight wonderful years.".to_string());
    let mut video = video_info("years.mp4");
    video.highlights.push(Highlight {
        start: 0.0,
        end: 6.0,
        caption: "tail wags at the door".to_string(),
        interaction: InteractionKind::Playing,
        emotion: Emotion::Happy,
    });
    project.videos.push(video);

    // A reply below the character band, then an outright failure. Neither
    // may surface: the deterministic template replaces both.
    let closings: [AiResult<String>; 2] = [
        Ok("Love you!".to_string()),
        Err(AiError::EmptyResponse),
    ];
    for closing in closings {
        let mut narrator = MockNarrator::new();
        narrator.expect_generate_story().returning(|_| {
            Ok(StoryDraft {
                title: "Eight Summers".to_string(),
                chapters: vec![ChapterDraft {
                    narration: "I waited by the door every day.".to_string(),
                    video_index: 0,
                    highlight_index: 0,
                }],
            })
        });
        narrator
            .expect_generate_closing()
            .return_once(move |_| closing);

        let composer = NarrationComposer::new(Arc::new(narrator), 5, 15.0, 40, 60);
        let story = composer.compose(&project).await.unwrap();

        assert_eq!(
            story.closing_statement.as_deref(),
            Some(fallback_closing("Biscuit").as_str())
        );
        assert_eq!(
            story.owner_message.as_deref(),
            Some("Thank you for eight wonderful years.")
        );
    }
}

#[tokio::test]
async fn job_renders_reel_from_qualifying_segments() {
    let storage = tempfile::tempdir().unwrap();
    let store = Arc::new(InMemoryJobStore::new());

    let job = Job::new(PathBuf::from("uploads/fetch.mp4"), PathBuf::from("frames/fetch"));
    let job_id = job.id.clone();
    store.insert(job).await;

    let mut engine = rendering_engine();
    engine
        .expect_extract_frames()
        .returning(|_, _, _, _| Ok(fake_frames(12)));

    let mut vision = MockVision::new();
    vision
        .expect_classify()
        .times(2)
        .returning(|_, _| Ok(qualifying_analysis("fetch by the fence")));

    let config = test_config(storage.path());
    let engine: Arc<dyn MediaEngine> = Arc::new(engine);
    let classifier = ContentClassifier::new(Arc::new(vision), 0, config.max_images_per_call);
    let compositor = TimelineCompositor::new(
        engine.clone(),
        CompositorConfig {
            target_width: config.target_width,
            target_height: config.target_height,
            ending_card_secs: config.ending_card_secs,
            background_music: None,
            music_volume: 1.0,
        },
    );
    let orchestrator =
        JobOrchestrator::new(store.clone(), engine, classifier, compositor, config);
    orchestrator.run(job_id.clone()).await;

    let job = store.get(&job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed, "{:?}", job.error);
    assert_eq!(job.segments.len(), 2);
    assert_eq!(job.highlights.len(), 1);
    assert!(job.output_path.as_ref().unwrap().ends_with("highlight.mp4"));
}

#[tokio::test]
async fn job_fails_when_most_segments_cannot_classify() {
    let storage = tempfile::tempdir().unwrap();
    let store = Arc::new(InMemoryJobStore::new());

    let job = Job::new(PathBuf::from("uploads/blur.mp4"), PathBuf::from("frames/blur"));
    let job_id = job.id.clone();
    store.insert(job).await;

    let mut engine = MockEngine::new();
    engine
        .expect_extract_frames()
        .returning(|_, _, _, _| Ok(fake_frames(24)));

    // 1 of 4 segments classifies: under the half threshold.
    let calls = AtomicUsize::new(0);
    let mut vision = MockVision::new();
    vision.expect_classify().returning(move |_, _| {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(qualifying_analysis("a blurry tail wag"))
        } else {
            Err(AiError::EmptyResponse)
        }
    });

    let config = test_config(storage.path());
    let engine: Arc<dyn MediaEngine> = Arc::new(engine);
    let classifier = ContentClassifier::new(Arc::new(vision), 0, config.max_images_per_call);
    let compositor = TimelineCompositor::new(
        engine.clone(),
        CompositorConfig {
            target_width: config.target_width,
            target_height: config.target_height,
            ending_card_secs: config.ending_card_secs,
            background_music: None,
            music_volume: 1.0,
        },
    );
    let orchestrator =
        JobOrchestrator::new(store.clone(), engine, classifier, compositor, config);
    orchestrator.run(job_id.clone()).await;

    let job = store.get(&job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.as_deref().unwrap().contains("segments"));
}
