//! Structured pipeline logging utilities.
//!
//! Provides consistent, structured logging for pipeline runs with
//! contextual information (target ID, pipeline stage).

use tracing::{error, info, warn, Span};

use pawstory_models::{JobId, ProjectId};

/// Pipeline logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct PipelineLogger {
    target_id: String,
    pipeline: String,
}

impl PipelineLogger {
    /// Create a logger for a single-video job run.
    pub fn for_job(job_id: &JobId) -> Self {
        Self {
            target_id: job_id.to_string(),
            pipeline: "job".to_string(),
        }
    }

    /// Create a logger for a story project run.
    pub fn for_project(project_id: &ProjectId) -> Self {
        Self {
            target_id: project_id.to_string(),
            pipeline: "project".to_string(),
        }
    }

    /// Log the start of a pipeline stage.
    pub fn log_stage(&self, stage: &str) {
        info!(
            target_id = %self.target_id,
            pipeline = %self.pipeline,
            stage = %stage,
            "Stage started"
        );
    }

    /// Log a progress update.
    pub fn log_progress(&self, message: &str) {
        info!(
            target_id = %self.target_id,
            pipeline = %self.pipeline,
            "Pipeline progress: {}", message
        );
    }

    /// Log a non-fatal degradation.
    pub fn log_warning(&self, message: &str) {
        warn!(
            target_id = %self.target_id,
            pipeline = %self.pipeline,
            "Pipeline warning: {}", message
        );
    }

    /// Log a fatal failure.
    pub fn log_error(&self, message: &str) {
        error!(
            target_id = %self.target_id,
            pipeline = %self.pipeline,
            "Pipeline error: {}", message
        );
    }

    /// Log successful completion.
    pub fn log_completion(&self, message: &str) {
        info!(
            target_id = %self.target_id,
            pipeline = %self.pipeline,
            "Pipeline completed: {}", message
        );
    }

    /// Create a tracing span for this run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "pipeline",
            target_id = %self.target_id,
            pipeline = %self.pipeline
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_carries_id() {
        let job_id = JobId::new();
        let logger = PipelineLogger::for_job(&job_id);
        assert_eq!(logger.target_id, job_id.to_string());
        assert_eq!(logger.pipeline, "job");
    }
}
