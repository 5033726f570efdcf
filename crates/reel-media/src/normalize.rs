//! Source video normalization: fixed width, optional center crop, duration cap.

use reel_models::VideoSettings;

use crate::error::{MediaError, MediaResult};
use crate::probe::MediaInfo;

/// Centered crop box inside the scaled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

/// Scale (and crop) geometry for a source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedGeometry {
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub crop: Option<CropBox>,
}

impl NormalizedGeometry {
    /// Scale `src_w x src_h` to `target_w` wide and crop to `max_h` when taller.
    pub fn plan(src_w: u32, src_h: u32, target_w: u32, max_h: Option<u32>) -> MediaResult<Self> {
        if src_w == 0 || src_h == 0 {
            return Err(MediaError::unreadable(format!(
                "source frame has no area ({src_w}x{src_h})"
            )));
        }
        if target_w == 0 || max_h == Some(0) {
            return Err(MediaError::invalid_parameter("target video size must be positive"));
        }

        let exact = src_h as f64 * target_w as f64 / src_w as f64;
        // libx264 wants even dimensions
        let scaled_height = ((exact / 2.0).round() as u32 * 2).max(2);

        let crop = match max_h {
            Some(max_h) if scaled_height > max_h => Some(CropBox {
                width: target_w,
                height: max_h,
                x: 0,
                y: (scaled_height - max_h) / 2,
            }),
            _ => None,
        };

        Ok(Self {
            scaled_width: target_w,
            scaled_height,
            crop,
        })
    }

    /// Size of the layer placed on the canvas.
    pub fn layer_size(&self) -> (u32, u32) {
        match self.crop {
            Some(c) => (c.width, c.height),
            None => (self.scaled_width, self.scaled_height),
        }
    }

    /// Filter chain from `input` to `output`, e.g. `[0:v]scale=980:1742,crop=...[vid]`.
    pub fn filter(&self, input: &str, output: &str) -> String {
        let mut chain = format!(
            "[{input}]scale={}:{},setsar=1",
            self.scaled_width, self.scaled_height
        );
        if let Some(c) = self.crop {
            chain.push_str(&format!(",crop={}:{}:{}:{}", c.width, c.height, c.x, c.y));
        }
        chain.push_str(&format!("[{output}]"));
        chain
    }
}

/// A probed source bound to its normalized geometry and effective duration.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedVideo {
    pub geometry: NormalizedGeometry,
    /// Seconds the output will last
    pub duration: f64,
    pub source_duration: f64,
    /// Whether the duration cap shortened the source
    pub capped: bool,
    pub has_audio: bool,
}

impl NormalizedVideo {
    pub fn from_probe(info: &MediaInfo, settings: &VideoSettings) -> MediaResult<Self> {
        if !(info.duration.is_finite() && info.duration > 0.0) {
            return Err(MediaError::unreadable("source video has no duration"));
        }
        let geometry =
            NormalizedGeometry::plan(info.width, info.height, settings.width, settings.max_height)?;
        let duration = effective_duration(info.duration, settings.max_duration_secs);

        Ok(Self {
            geometry,
            duration,
            source_duration: info.duration,
            capped: duration < info.duration,
            has_audio: info.has_audio,
        })
    }

    /// Input-side `-t` limit when the cap applies.
    pub fn input_limit(&self) -> Option<f64> {
        self.capped.then_some(self.duration)
    }
}

/// Source duration limited by an optional cap; non-positive caps are ignored.
pub fn effective_duration(source: f64, cap: Option<f64>) -> f64 {
    match cap {
        Some(cap) if cap.is_finite() && cap > 0.0 => source.min(cap),
        _ => source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(w: u32, h: u32, duration: f64) -> MediaInfo {
        MediaInfo {
            duration,
            width: w,
            height: h,
            fps: 30.0,
            codec: "h264".into(),
            has_video: true,
            has_audio: true,
            frame_count: None,
        }
    }

    #[test]
    fn test_portrait_source_is_cropped() {
        // 720x1280 -> 980x1742 (1742.2 rounded to even), crop 1225 centered
        let g = NormalizedGeometry::plan(720, 1280, 980, Some(1225)).unwrap();
        assert_eq!((g.scaled_width, g.scaled_height), (980, 1742));
        let crop = g.crop.unwrap();
        assert_eq!((crop.width, crop.height, crop.x, crop.y), (980, 1225, 0, 258));
        assert_eq!(g.layer_size(), (980, 1225));
    }

    #[test]
    fn test_landscape_source_is_not_cropped() {
        let g = NormalizedGeometry::plan(1920, 1080, 980, Some(1225)).unwrap();
        assert_eq!(g.scaled_height, 552);
        assert!(g.crop.is_none());
        assert_eq!(g.layer_size(), (980, 552));
    }

    #[test]
    fn test_no_max_height_never_crops() {
        let g = NormalizedGeometry::plan(720, 1280, 980, None).unwrap();
        assert!(g.crop.is_none());
        assert_eq!(g.layer_size(), (980, 1742));
    }

    #[test]
    fn test_crop_is_centered() {
        for (w, h) in [(100, 1000), (540, 960), (333, 777), (1080, 2400)] {
            let g = NormalizedGeometry::plan(w, h, 980, Some(1225)).unwrap();
            if let Some(c) = g.crop {
                let below = g.scaled_height - c.height - c.y;
                assert!(c.y.abs_diff(below) <= 1, "{w}x{h}");
            }
        }
    }

    #[test]
    fn test_filter_chain() {
        let g = NormalizedGeometry::plan(720, 1280, 980, Some(1225)).unwrap();
        assert_eq!(
            g.filter("0:v", "vid"),
            "[0:v]scale=980:1742,setsar=1,crop=980:1225:0:258[vid]"
        );
        let g = NormalizedGeometry::plan(1920, 1080, 980, Some(1225)).unwrap();
        assert_eq!(g.filter("0:v", "vid"), "[0:v]scale=980:552,setsar=1[vid]");
    }

    #[test]
    fn test_zero_source_is_unreadable() {
        assert!(NormalizedGeometry::plan(0, 1280, 980, None)
            .unwrap_err()
            .is_unreadable());
    }

    #[test]
    fn test_duration_cap() {
        assert_eq!(effective_duration(90.0, Some(60.0)), 60.0);
        assert_eq!(effective_duration(10.0, Some(60.0)), 10.0);
        assert_eq!(effective_duration(90.0, None), 90.0);
        assert_eq!(effective_duration(90.0, Some(0.0)), 90.0);

        let settings = VideoSettings::default();
        let long = NormalizedVideo::from_probe(&info(720, 1280, 90.0), &settings).unwrap();
        assert!(long.capped);
        assert_eq!(long.duration, 60.0);
        assert_eq!(long.input_limit(), Some(60.0));

        let short = NormalizedVideo::from_probe(&info(720, 1280, 10.0), &settings).unwrap();
        assert!(!short.capped);
        assert_eq!(short.duration, 10.0);
        assert_eq!(short.input_limit(), None);
    }
}
