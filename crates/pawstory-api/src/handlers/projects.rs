//! Story project endpoints.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

use pawstory_models::{Project, ProjectId, ProjectStatus, ToneMode, VideoId, VideoInfo};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::upload::{image_extension, save_upload, video_extension};

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub pet_name: String,
    #[serde(default)]
    pub pet_breed: Option<String>,
    #[serde(default)]
    pub owner_relationship: Option<String>,
    /// playful | heartfelt | documentary, defaults to playful.
    #[serde(default)]
    pub tone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerMessageRequest {
    pub message: String,
}

/// Poll view of a project: status and error, never pipeline internals.
#[derive(Debug, Serialize)]
pub struct ProjectView {
    pub id: String,
    pub name: String,
    pub pet_name: String,
    pub tone: String,
    pub status: &'static str,
    pub video_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
}

impl From<&Project> for ProjectView {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.to_string(),
            name: project.name.clone(),
            pet_name: project.pet_name.clone(),
            tone: project.tone.to_string(),
            status: project.status.as_str(),
            video_count: project.videos.len(),
            story_title: project.story.as_ref().map(|s| s.title.clone()),
            output_path: project.output_path.clone(),
            error: project.error.clone(),
            created_at: project.created_at.to_rfc3339(),
        }
    }
}

async fn fetch_project(state: &AppState, id: &str) -> ApiResult<Project> {
    let project_id = ProjectId::from_string(id);
    state
        .projects
        .get(&project_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("project {project_id}")))
}

fn project_dir(state: &AppState, project: &Project) -> PathBuf {
    state
        .pipeline_config
        .storage_dir
        .join("projects")
        .join(project.id.as_str())
}

/// `POST /api/v2/story/projects`
pub async fn create_project(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectView>)> {
    if request.name.trim().is_empty() || request.pet_name.trim().is_empty() {
        return Err(ApiError::bad_request("name and pet_name are required"));
    }
    let tone = match &request.tone {
        Some(raw) => raw
            .parse::<ToneMode>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => ToneMode::default(),
    };

    let mut project = Project::new(request.name.trim(), request.pet_name.trim(), tone);
    project.pet_breed = request.pet_breed.filter(|s| !s.trim().is_empty());
    project.owner_relationship = request.owner_relationship.filter(|s| !s.trim().is_empty());

    let view = ProjectView::from(&project);
    info!(project_id = %project.id, "Project created");
    state.projects.insert(project).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `POST /api/v2/story/projects/:id/videos` — upload one or more source
/// videos. Only allowed before generation starts.
pub async fn upload_videos(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<ProjectView>> {
    let project = fetch_project(&state, &id).await?;
    if project.status != ProjectStatus::Pending {
        return Err(ApiError::conflict("videos can only be added before generation"));
    }

    let uploads_dir = project_dir(&state, &project).join("uploads");
    let mut added: Vec<VideoInfo> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let ext = video_extension(&file_name)?;
        let bytes = field.bytes().await?.to_vec();

        let video_id = VideoId::new();
        let stored_name = format!("{}.{ext}", Uuid::new_v4());
        let path = save_upload(&uploads_dir, &stored_name, &bytes).await?;

        // Reject unreadable uploads up front rather than mid-pipeline.
        let probe = state.engine.probe(&path).await.map_err(|e| {
            ApiError::bad_request(format!("{file_name} is not a readable video: {e}"))
        })?;

        let frames_dir = project_dir(&state, &project)
            .join("frames")
            .join(video_id.as_str());
        added.push(VideoInfo {
            id: video_id,
            original_name: file_name,
            path,
            duration: probe.duration,
            frames_dir,
            analyzed: false,
            segments: Vec::new(),
            highlights: Vec::new(),
        });
    }

    if added.is_empty() {
        return Err(ApiError::bad_request("no video files in request"));
    }

    let count = added.len();
    let updated = state
        .projects
        .update(&project.id, Box::new(move |p| p.videos.extend(added)))
        .await?;
    info!(project_id = %project.id, count, "Videos uploaded");
    Ok(Json(ProjectView::from(&updated)))
}

/// `POST /api/v2/story/projects/:id/ending-image`
pub async fn upload_ending_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<ProjectView>> {
    let project = fetch_project(&state, &id).await?;
    if project.status != ProjectStatus::Pending {
        return Err(ApiError::conflict("ending image can only be set before generation"));
    }

    let mut saved: Option<PathBuf> = None;
    while let Some(field) = multipart.next_field().await? {
        if let Some(file_name) = field.file_name().map(str::to_string) {
            let ext = image_extension(&file_name)?;
            let bytes = field.bytes().await?.to_vec();
            let path = save_upload(
                &project_dir(&state, &project),
                &format!("ending.{ext}"),
                &bytes,
            )
            .await?;
            saved = Some(path);
            break;
        }
    }
    let path = saved.ok_or_else(|| ApiError::bad_request("no image file in request"))?;

    let updated = state
        .projects
        .update(&project.id, Box::new(move |p| p.ending_image = Some(path)))
        .await?;
    Ok(Json(ProjectView::from(&updated)))
}

/// `POST /api/v2/story/projects/:id/owner-message`
pub async fn set_owner_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<OwnerMessageRequest>,
) -> ApiResult<Json<ProjectView>> {
    let project = fetch_project(&state, &id).await?;
    if project.status != ProjectStatus::Pending {
        return Err(ApiError::conflict("owner message can only be set before generation"));
    }
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::bad_request("message is empty"));
    }

    let updated = state
        .projects
        .update(
            &project.id,
            Box::new(move |p| p.owner_message = Some(message)),
        )
        .await?;
    Ok(Json(ProjectView::from(&updated)))
}

/// `POST /api/v2/story/projects/:id/generate` — kick off the story pipeline
/// on a detached task.
pub async fn generate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<ProjectView>)> {
    let project = fetch_project(&state, &id).await?;
    if project.status != ProjectStatus::Pending {
        return Err(ApiError::conflict(format!(
            "project is already {}",
            project.status.as_str()
        )));
    }
    if project.videos.is_empty() {
        return Err(ApiError::bad_request("project has no videos"));
    }

    info!(project_id = %project.id, videos = project.videos.len(), "Generation started");
    let orchestrator = state.project_orchestrator.clone();
    let project_id = project.id.clone();
    tokio::spawn(async move {
        orchestrator.run(project_id).await;
    });

    Ok((StatusCode::ACCEPTED, Json(ProjectView::from(&project))))
}

/// `GET /api/v2/story/projects/:id`
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectView>> {
    let project = fetch_project(&state, &id).await?;
    Ok(Json(ProjectView::from(&project)))
}

/// `GET /api/v2/story/projects`
pub async fn list_projects(State(state): State<AppState>) -> Json<Vec<ProjectView>> {
    let projects = state.projects.list().await;
    Json(projects.iter().map(ProjectView::from).collect())
}
