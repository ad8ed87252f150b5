//! Error types for AI service adapters.

use thiserror::Error;

/// Result type for AI adapter calls.
pub type AiResult<T> = Result<T, AiError>;

/// Failure categories for external AI calls.
///
/// The three external categories (transport, status, payload) stay distinct
/// so callers can log what actually went wrong, even when they all degrade
/// to the same fallback.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("service returned an empty response")]
    EmptyResponse,

    #[error("malformed response payload: {0}")]
    MalformedPayload(String),

    #[error("media preprocessing failed: {0}")]
    Media(#[from] pawstory_media::MediaError),
}

impl AiError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload(message.into())
    }
}
