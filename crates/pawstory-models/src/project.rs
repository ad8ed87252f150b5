//! Multi-video story project definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Highlight, ProjectId, Segment, Story, ToneMode, VideoId};

/// Default title used for the owner when no relationship was given.
pub const DEFAULT_OWNER_TITLE: &str = "owner";

/// Project lifecycle state.
///
/// Transitions are strictly forward through the pipeline stages; `Failed` is
/// reachable from any non-terminal state and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Pending,
    Analyzing,
    GeneratingStory,
    GeneratingVideo,
    Completed,
    Failed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "pending",
            ProjectStatus::Analyzing => "analyzing",
            ProjectStatus::GeneratingStory => "generating_story",
            ProjectStatus::GeneratingVideo => "generating_video",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Legal moves are the single forward step in the stage order, or a jump
    /// to `Failed` from any non-terminal state. No stage may be skipped and
    /// nothing leaves a terminal state.
    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == ProjectStatus::Failed {
            return true;
        }
        matches!(
            (self, next),
            (ProjectStatus::Pending, ProjectStatus::Analyzing)
                | (ProjectStatus::Analyzing, ProjectStatus::GeneratingStory)
                | (ProjectStatus::GeneratingStory, ProjectStatus::GeneratingVideo)
                | (ProjectStatus::GeneratingVideo, ProjectStatus::Completed)
        )
    }
}

/// One uploaded source video within a project.
///
/// Each video is analyzed independently; its results are written back under
/// the project store's write lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: VideoId,
    pub original_name: String,
    pub path: PathBuf,
    /// Probed duration in seconds.
    pub duration: f64,
    pub frames_dir: PathBuf,
    #[serde(default)]
    pub analyzed: bool,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
}

/// A multi-video narrated story project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// The pet the story is about.
    pub pet_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_breed: Option<String>,
    /// How the owner relates to the pet (mom, dad, ...); narration addresses
    /// them by this title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_relationship: Option<String>,
    /// Still image shown on the ending card, if uploaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ending_image: Option<PathBuf>,
    /// Free-text message from the owner to the pet; triggers the closing
    /// statement generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_message: Option<String>,
    pub tone: ToneMode,
    pub status: ProjectStatus,
    #[serde(default)]
    pub videos: Vec<VideoInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story: Option<Story>,
    /// Rendered final video, present once completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Project {
    pub fn new(name: impl Into<String>, pet_name: impl Into<String>, tone: ToneMode) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            name: name.into(),
            pet_name: pet_name.into(),
            pet_breed: None,
            owner_relationship: None,
            ending_image: None,
            owner_message: None,
            tone,
            status: ProjectStatus::Pending,
            videos: Vec::new(),
            story: None,
            output_path: None,
            created_at: now,
            updated_at: now,
            error: None,
        }
    }

    /// Title the narration uses to address the owner.
    pub fn owner_title(&self) -> &str {
        self.owner_relationship
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_OWNER_TITLE)
    }

    /// Move to `next` if the state machine allows it. Returns whether the
    /// transition was applied.
    pub fn advance(&mut self, next: ProjectStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.touch();
        true
    }

    /// Move to terminal `Failed` with a cause.
    pub fn fail(&mut self, error: impl Into<String>) {
        if !self.status.is_terminal() {
            self.status = ProjectStatus::Failed;
            self.error = Some(error.into());
            self.touch();
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAGES: [ProjectStatus; 5] = [
        ProjectStatus::Pending,
        ProjectStatus::Analyzing,
        ProjectStatus::GeneratingStory,
        ProjectStatus::GeneratingVideo,
        ProjectStatus::Completed,
    ];

    #[test]
    fn test_completion_requires_every_stage() {
        let mut project = Project::new("trip", "Mochi", ToneMode::Playful);
        for stage in &STAGES[1..] {
            assert!(project.advance(*stage), "step into {stage:?}");
        }
        assert_eq!(project.status, ProjectStatus::Completed);
    }

    #[test]
    fn test_no_stage_skipping() {
        let mut project = Project::new("trip", "Mochi", ToneMode::Playful);
        assert!(!project.advance(ProjectStatus::GeneratingStory));
        assert!(!project.advance(ProjectStatus::Completed));
        assert_eq!(project.status, ProjectStatus::Pending);
    }

    #[test]
    fn test_failed_reachable_from_any_non_terminal() {
        for (i, stage) in STAGES[..4].iter().enumerate() {
            let mut project = Project::new("trip", "Mochi", ToneMode::Playful);
            for next in &STAGES[1..=i] {
                assert!(project.advance(*next));
            }
            assert_eq!(project.status, *stage);
            project.fail("boom");
            assert_eq!(project.status, ProjectStatus::Failed);
            assert_eq!(project.error.as_deref(), Some("boom"));
        }
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        let mut project = Project::new("trip", "Mochi", ToneMode::Playful);
        project.fail("boom");
        assert!(!project.advance(ProjectStatus::Analyzing));
        project.fail("again");
        assert_eq!(project.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_owner_title_default() {
        let mut project = Project::new("trip", "Mochi", ToneMode::Playful);
        assert_eq!(project.owner_title(), DEFAULT_OWNER_TITLE);
        project.owner_relationship = Some("mom".to_string());
        assert_eq!(project.owner_title(), "mom");
        project.owner_relationship = Some(String::new());
        assert_eq!(project.owner_title(), DEFAULT_OWNER_TITLE);
    }
}
