//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::jobs::{create_job, get_job, list_jobs};
use crate::handlers::projects::{
    create_project, generate, get_project, list_projects, set_owner_message,
    upload_ending_image, upload_videos,
};
use crate::handlers::health;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let job_routes = Router::new()
        .route("/jobs", post(create_job).get(list_jobs))
        .route("/jobs/:id", get(get_job));

    let project_routes = Router::new()
        .route("/projects", post(create_project).get(list_projects))
        .route("/projects/:id", get(get_project))
        .route("/projects/:id/videos", post(upload_videos))
        .route("/projects/:id/ending-image", post(upload_ending_image))
        .route("/projects/:id/owner-message", post(set_owner_message))
        .route("/projects/:id/generate", post(generate));

    let max_body = state.config.max_upload_bytes;

    Router::new()
        .route("/api/health", get(health))
        .nest("/api/v1/poc", job_routes)
        .nest("/api/v2/story", project_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
