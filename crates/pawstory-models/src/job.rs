//! Single-video job definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Highlight, JobId, Segment};

/// Job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for the background pipeline to pick it up
    #[default]
    Pending,
    /// Pipeline is running
    Processing,
    /// Highlight reel rendered
    Completed,
    /// Terminal failure, `error` holds the cause
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A single-video highlight extraction job.
///
/// Created on upload, owned and mutated exclusively by the job orchestrator,
/// kept in memory for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// Uploaded source video.
    pub video_path: PathBuf,
    /// Directory the frame sampler writes stills into.
    pub frames_dir: PathBuf,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    /// Rendered highlight reel, present once completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Human-readable failure cause, present only when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// Create a pending job for an uploaded video.
    pub fn new(video_path: PathBuf, frames_dir: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            status: JobStatus::Pending,
            video_path,
            frames_dir,
            segments: Vec::new(),
            highlights: Vec::new(),
            output_path: None,
            created_at: now,
            updated_at: now,
            error: None,
        }
    }

    /// Move to `Processing`.
    pub fn start(&mut self) {
        self.status = JobStatus::Processing;
        self.touch();
    }

    /// Move to terminal `Completed`.
    pub fn complete(&mut self) {
        self.status = JobStatus::Completed;
        self.touch();
    }

    /// Move to terminal `Failed` with a cause.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_creation() {
        let job = Job::new(PathBuf::from("a.mp4"), PathBuf::from("frames"));
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.error.is_none());
        assert!(job.segments.is_empty());
    }

    #[test]
    fn test_job_lifecycle() {
        let mut job = Job::new(PathBuf::from("a.mp4"), PathBuf::from("frames"));
        job.start();
        assert_eq!(job.status, JobStatus::Processing);
        assert!(!job.status.is_terminal());

        job.fail("no frames extracted");
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.status.is_terminal());
        assert_eq!(job.error.as_deref(), Some("no frames extracted"));
    }
}
