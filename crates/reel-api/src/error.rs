//! API error types.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reel_media::MediaError;
use reel_models::{ErrorResponse, ParseError};
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unreadable media: {0}")]
    UnreadableMedia(String),

    #[error("{0}")]
    AiGenerationFailed(String),

    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::UnreadableMedia(_)
            | ApiError::AiGenerationFailed(_)
            | ApiError::RenderFailed(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::InvalidParameter(_) => "invalid_parameter",
            ApiError::UnreadableMedia(_) => "unreadable_media",
            ApiError::AiGenerationFailed(_) => "ai_generation_failed",
            ApiError::RenderFailed(_) => "render_failed",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        if e.is_unreadable() {
            return ApiError::UnreadableMedia(e.to_string());
        }
        match e {
            MediaError::InvalidParameter(msg) => ApiError::InvalidParameter(msg),
            MediaError::FfmpegFailed {
                message,
                stderr,
                exit_code,
            } => {
                let mut detail = message;
                if let Some(code) = exit_code {
                    detail.push_str(&format!(" (exit code {code})"));
                }
                if let Some(tail) = stderr.filter(|s| !s.trim().is_empty()) {
                    detail.push_str(&format!(": {}", tail.trim()));
                }
                ApiError::RenderFailed(detail)
            }
            e @ (MediaError::FfmpegNotFound
            | MediaError::FfprobeNotFound
            | MediaError::FfprobeFailed { .. }
            | MediaError::Timeout(_)) => ApiError::RenderFailed(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ParseError> for ApiError {
    fn from(e: ParseError) -> Self {
        ApiError::InvalidParameter(e.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::InvalidRequest(format!("Malformed multipart body: {}", e.body_text()))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl ApiError {
    /// Message sent to the client. Production hides paths, tool output and upstream bodies.
    pub fn client_message(&self, production: bool) -> String {
        if !production {
            return self.to_string();
        }
        match self {
            ApiError::InvalidRequest(_) | ApiError::InvalidParameter(_) => self.to_string(),
            ApiError::UnreadableMedia(_) => "Could not read the uploaded media".to_string(),
            ApiError::AiGenerationFailed(_) => "AI Error: caption generation failed".to_string(),
            ApiError::RenderFailed(_) | ApiError::Internal(_) => {
                "An internal error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let production = std::env::var("ENVIRONMENT")
            .map(|env| env.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        (status, Json(ErrorResponse::new(self.client_message(production)))).into_response()
    }
}
