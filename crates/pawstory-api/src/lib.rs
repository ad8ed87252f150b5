//! HTTP API for PawStory.
//!
//! Exposes the single-video job endpoints (`/api/v1/poc`) and the
//! multi-video story project endpoints (`/api/v2/story`). Uploads are
//! persisted under the storage directory; pipelines run on detached tokio
//! tasks and report progress through the stores.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod upload;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
