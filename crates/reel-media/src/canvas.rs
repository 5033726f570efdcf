//! Solid-color background canvas.

use reel_models::{CanvasSettings, Rgb};

use crate::error::{MediaError, MediaResult};

/// A fixed-resolution background, rendered as an ffmpeg `color` source.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub color: Rgb,
    pub duration: f64,
    pub fps: u32,
}

impl Canvas {
    /// Build a canvas matching `duration` seconds at `fps`.
    pub fn new(settings: &CanvasSettings, duration: f64, fps: u32) -> MediaResult<Self> {
        if settings.width == 0 || settings.height == 0 {
            return Err(MediaError::invalid_parameter(format!(
                "canvas size must be positive, got {}x{}",
                settings.width, settings.height
            )));
        }
        if !(duration.is_finite() && duration > 0.0) {
            return Err(MediaError::invalid_parameter(format!(
                "canvas duration must be positive, got {duration}"
            )));
        }
        if fps == 0 {
            return Err(MediaError::invalid_parameter("canvas frame rate must be positive"));
        }

        Ok(Self {
            width: settings.width,
            height: settings.height,
            color: settings.color,
            duration,
            fps,
        })
    }

    /// Source filter producing the canvas, e.g. `color=c=0xFFFFFF:s=1080x1920:r=40:d=10.000`.
    pub fn source_filter(&self) -> String {
        format!(
            "color=c={}:s={}x{}:r={}:d={:.3}",
            self.color.to_ffmpeg(),
            self.width,
            self.height,
            self.fps,
            self.duration
        )
    }
}
