//! JSON bodies returned by the HTTP API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Successful `POST /api/generate-video` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GenerateVideoResponse {
    /// Always `"success"`
    pub status: String,
    /// Public path of the rendered file, e.g. `/static/output/<id>.mp4`
    pub video_url: String,
    /// Text burned into the video
    pub overlay_text: String,
    /// Generated social caption with hashtags
    pub captions: String,
}

impl GenerateVideoResponse {
    pub fn success(
        video_url: impl Into<String>,
        overlay_text: impl Into<String>,
        captions: impl Into<String>,
    ) -> Self {
        Self {
            status: "success".to_string(),
            video_url: video_url.into(),
            overlay_text: overlay_text.into(),
            captions: captions.into(),
        }
    }
}

/// Error body: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let body = GenerateVideoResponse::success("/static/output/a.mp4", "Hi", "#tag");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["video_url"], "/static/output/a.mp4");
        assert_eq!(json["overlay_text"], "Hi");
        assert_eq!(json["captions"], "#tag");
    }

    #[test]
    fn test_error_shape() {
        let json = serde_json::to_string(&ErrorResponse::new("Missing video")).unwrap();
        assert_eq!(json, r#"{"error":"Missing video"}"#);
    }
}
