//! Generated copy and Gemini wire types.

use serde::{Deserialize, Serialize};

use crate::error::AiError;

/// Prefix marking a failed generation in [`GeneratedCopy::overlay_text`].
pub const AI_ERROR_PREFIX: &str = "AI Error:";

/// Text produced for one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCopy {
    /// Short line burned into the video
    pub overlay_text: String,
    /// Social caption with hashtags
    pub caption: String,
}

impl GeneratedCopy {
    pub fn new(overlay_text: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            overlay_text: overlay_text.into(),
            caption: caption.into(),
        }
    }

    /// Copy carrying the failure sentinel.
    pub fn failed(error: &AiError) -> Self {
        Self {
            overlay_text: format!("{AI_ERROR_PREFIX} {error}"),
            caption: String::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.overlay_text.starts_with(AI_ERROR_PREFIX)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Part {
    pub text: String,
}

impl GenerateContentRequest {
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: text.into() }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}
