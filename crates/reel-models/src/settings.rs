//! Render layout and pipeline settings.
//!
//! Defaults reproduce the 1080x1920 social layout: a 980px-wide video band
//! centered on a white canvas, overlay text near the top and the logo near
//! the bottom.

use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::darkness::DarknessPolicy;
use crate::encoding::EncodingConfig;
use crate::error::ParseError;

/// Default ceiling for source duration in seconds.
pub const DEFAULT_MAX_DURATION_SECS: f64 = 60.0;
/// Default music volume on the 0-100 scale.
pub const DEFAULT_MUSIC_VOLUME: f64 = 60.0;

/// Background canvas settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CanvasSettings {
    pub width: u32,
    pub height: u32,
    pub color: Rgb,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            color: Rgb::WHITE,
        }
    }
}

/// Source video normalization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoSettings {
    /// Width the source is scaled to
    pub width: u32,
    /// Crop box height when the scaled frame is taller (None disables cropping)
    pub max_height: Option<u32>,
    /// Source duration ceiling in seconds (None disables the cap)
    pub max_duration_secs: Option<f64>,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: 980,
            max_height: Some(1225),
            max_duration_secs: Some(DEFAULT_MAX_DURATION_SECS),
        }
    }
}

/// Overlay text settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TextSettings {
    pub font_size: u32,
    pub color: Rgb,
    /// Wrap width in characters
    pub wrap_width: usize,
    /// Distance from the canvas top
    pub offset_y: u32,
    pub padding_x: u32,
    pub padding_y: u32,
    /// Preferred font file; platform fonts and the built-in font follow
    pub font_path: Option<String>,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            font_size: 40,
            color: Rgb::BLACK,
            wrap_width: 32,
            offset_y: 200,
            padding_x: 100,
            padding_y: 50,
            font_path: None,
        }
    }
}

/// Logo layer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LogoSettings {
    pub width: u32,
    pub offset_y: u32,
    pub darkness: DarknessPolicy,
    /// Also paint cleared pixels white
    pub whiten: bool,
}

impl Default for LogoSettings {
    fn default() -> Self {
        Self {
            width: 250,
            offset_y: 1350,
            darkness: DarknessPolicy::default(),
            whiten: false,
        }
    }
}

/// Audio mixing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioSettings {
    /// Gain applied to the original track when music is mixed in
    pub original_gain: f64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self { original_gain: 0.8 }
    }
}

/// Everything the compositing pipeline needs to know besides the inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderSettings {
    pub canvas: CanvasSettings,
    pub video: VideoSettings,
    pub text: TextSettings,
    pub logo: LogoSettings,
    pub audio: AudioSettings,
    pub encoding: EncodingConfig,
    /// Kill ffmpeg after this many seconds
    pub ffmpeg_timeout_secs: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            canvas: CanvasSettings::default(),
            video: VideoSettings::default(),
            text: TextSettings::default(),
            logo: LogoSettings::default(),
            audio: AudioSettings::default(),
            encoding: EncodingConfig::default(),
            ffmpeg_timeout_secs: 600,
        }
    }
}

impl RenderSettings {
    /// Create settings from `REEL_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        settings.canvas.width = env_or("REEL_CANVAS_WIDTH", settings.canvas.width);
        settings.canvas.height = env_or("REEL_CANVAS_HEIGHT", settings.canvas.height);
        settings.canvas.color = env_or("REEL_CANVAS_COLOR", settings.canvas.color);

        settings.video.width = env_or("REEL_VIDEO_WIDTH", settings.video.width);
        settings.video.max_height =
            env_optional("REEL_VIDEO_MAX_HEIGHT", settings.video.max_height);
        settings.video.max_duration_secs =
            env_optional("REEL_MAX_DURATION_SECS", settings.video.max_duration_secs);

        settings.text.font_size = env_or("REEL_TEXT_FONT_SIZE", settings.text.font_size);
        settings.text.color = env_or("REEL_TEXT_COLOR", settings.text.color);
        settings.text.wrap_width = env_or("REEL_TEXT_WRAP_WIDTH", settings.text.wrap_width);
        settings.text.offset_y = env_or("REEL_TEXT_OFFSET_Y", settings.text.offset_y);
        settings.text.font_path = std::env::var("REEL_FONT_PATH").ok().filter(|p| !p.is_empty());

        settings.logo.width = env_or("REEL_LOGO_WIDTH", settings.logo.width);
        settings.logo.offset_y = env_or("REEL_LOGO_OFFSET_Y", settings.logo.offset_y);
        settings.logo.darkness = env_or("REEL_LOGO_DARKNESS", settings.logo.darkness);
        settings.logo.whiten = env_or("REEL_LOGO_WHITEN", settings.logo.whiten);

        settings.audio.original_gain =
            env_or("REEL_ORIGINAL_AUDIO_GAIN", settings.audio.original_gain);

        settings.encoding.fps = env_or("REEL_FPS", settings.encoding.fps);
        settings.encoding.preset = env_or("REEL_PRESET", settings.encoding.preset.clone());
        settings.encoding.crf = env_or("REEL_CRF", settings.encoding.crf);
        settings.encoding.threads = env_or("REEL_THREADS", settings.encoding.threads);

        settings.ffmpeg_timeout_secs =
            env_or("REEL_FFMPEG_TIMEOUT_SECS", settings.ffmpeg_timeout_secs);

        settings
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Like `env_or`, but `0`, `off` and `none` switch the option off.
fn env_optional<T: FromStr>(key: &str, default: Option<T>) -> Option<T> {
    match std::env::var(key) {
        Ok(raw) => {
            let raw = raw.trim().to_lowercase();
            if raw == "0" || raw == "off" || raw == "none" {
                None
            } else {
                raw.parse().ok().or(default)
            }
        }
        Err(_) => default,
    }
}

/// Music loudness on the 0-100 scale used by the request form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MusicVolume(f64);

impl MusicVolume {
    pub fn new(volume: f64) -> Result<Self, ParseError> {
        if volume.is_finite() && (0.0..=100.0).contains(&volume) {
            Ok(Self(volume))
        } else {
            Err(ParseError::InvalidVolume(volume.to_string()))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Linear gain (`volume / 100`).
    pub fn gain(&self) -> f64 {
        self.0 / 100.0
    }
}

impl Default for MusicVolume {
    fn default() -> Self {
        Self(DEFAULT_MUSIC_VOLUME)
    }
}

impl FromStr for MusicVolume {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let volume: f64 = trimmed
            .parse()
            .map_err(|_| ParseError::InvalidVolume(s.to_string()))?;
        Self::new(volume)
    }
}
