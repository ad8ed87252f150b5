//! Single-video highlight job endpoints.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use pawstory_models::{Job, JobId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::upload::{save_upload, video_extension};

/// Poll view of a job: status and error only, never pipeline internals.
#[derive(Debug, Serialize)]
pub struct JobView {
    pub id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub created_at: String,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.to_string(),
            status: job.status.as_str(),
            error: job.error.clone(),
            output_path: job.output_path.clone(),
            created_at: job.created_at.to_rfc3339(),
        }
    }
}

/// `POST /api/v1/poc/jobs` — upload a video and start the highlight pipeline.
pub async fn create_job(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<JobView>)> {
    let mut saved: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await? {
        if let Some(file_name) = field.file_name().map(str::to_string) {
            let bytes = field.bytes().await?.to_vec();
            saved = Some((file_name, bytes));
            break;
        }
    }
    let (file_name, bytes) = saved.ok_or_else(|| ApiError::bad_request("no video file in request"))?;
    let ext = video_extension(&file_name)?;

    let mut job = Job::new(PathBuf::new(), PathBuf::new());
    let job_dir = state
        .pipeline_config
        .storage_dir
        .join("videos")
        .join(job.id.as_str());
    job.video_path = save_upload(&job_dir, &format!("original.{ext}"), &bytes).await?;
    job.frames_dir = job_dir.join("frames");

    let view = JobView::from(&job);
    let job_id = job.id.clone();
    state.jobs.insert(job).await;

    info!(job_id = %job_id, file = %file_name, "Job created");
    let orchestrator = state.job_orchestrator.clone();
    tokio::spawn(async move {
        orchestrator.run(job_id).await;
    });

    Ok((StatusCode::ACCEPTED, Json(view)))
}

/// `GET /api/v1/poc/jobs/:id`
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobView>> {
    let job_id = JobId::from_string(id);
    let job = state
        .jobs
        .get(&job_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("job {job_id}")))?;
    Ok(Json(JobView::from(&job)))
}

/// `GET /api/v1/poc/jobs`
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobView>> {
    let jobs = state.jobs.list().await;
    Json(jobs.iter().map(JobView::from).collect())
}
