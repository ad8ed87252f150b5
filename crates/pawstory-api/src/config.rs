//! API server configuration.

/// HTTP-facing configuration; pipeline tunables live in
/// `pawstory_pipeline::PipelineConfig`.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on request bodies (uploads), bytes.
    pub max_upload_bytes: usize,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            max_upload_bytes: std::env::var("MAX_UPLOAD_MB")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(500)
                * 1024
                * 1024,
        }
    }
}
