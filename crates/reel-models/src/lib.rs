//! Shared data models for the reel-forge service.
//!
//! This crate provides Serde-serializable types for:
//! - Output encoding configuration
//! - Canvas, video, text, logo and audio layout settings
//! - Colors and logo darkness policies
//! - HTTP response bodies

pub mod color;
pub mod darkness;
pub mod encoding;
pub mod error;
pub mod response;
pub mod settings;

// Re-export common types
pub use color::Rgb;
pub use darkness::DarknessPolicy;
pub use encoding::EncodingConfig;
pub use error::{ParseError, ParseResult};
pub use response::{ErrorResponse, GenerateVideoResponse};
pub use settings::{
    AudioSettings, CanvasSettings, LogoSettings, MusicVolume, RenderSettings, TextSettings,
    VideoSettings,
};
