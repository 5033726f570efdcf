//! Overlay text and caption generation.
//!
//! [`CaptionGenerator`] is the seam the HTTP layer depends on;
//! [`GeminiClient`] implements it against the Gemini REST API.

pub mod client;
pub mod error;
pub mod prompts;
pub mod types;

pub use client::{generate_copy, CaptionGenerator, GeminiClient, GeminiConfig};
pub use error::{AiError, AiResult};
pub use types::{GeneratedCopy, AI_ERROR_PREFIX};
