//! Logo layer preparation: dark background removal and resizing.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use reel_models::{DarknessPolicy, LogoSettings};

use crate::error::{MediaError, MediaResult};

/// A processed logo raster on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoLayer {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Pixels made transparent
    pub cleared: usize,
}

/// Make every pixel matching `policy` fully transparent.
///
/// Other pixels are left untouched. With `whiten` the cleared pixels also get
/// white RGB so scaling does not bleed dark fringes into the edges.
pub fn strip_dark_background(image: &mut RgbaImage, policy: DarknessPolicy, whiten: bool) -> usize {
    let mut cleared = 0;
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        if policy.is_dark(r, g, b) {
            *pixel = if whiten {
                Rgba([255, 255, 255, 0])
            } else {
                Rgba([r, g, b, 0])
            };
            cleared += 1;
        }
    }
    cleared
}

/// Scale to `width` keeping the aspect ratio.
pub fn resize_to_width(image: &RgbaImage, width: u32) -> MediaResult<RgbaImage> {
    if width == 0 {
        return Err(MediaError::invalid_parameter("logo width must be positive"));
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(MediaError::unreadable("logo image is empty"));
    }
    let height = ((image.height() as f64 * width as f64 / image.width() as f64).round() as u32).max(1);
    Ok(image::imageops::resize(image, width, height, FilterType::Triangle))
}

#[derive(Debug, Clone)]
pub struct LogoProcessor {
    settings: LogoSettings,
}

impl LogoProcessor {
    pub fn new(settings: LogoSettings) -> Self {
        Self { settings }
    }

    /// Load `source`, strip its background, resize and write a PNG to `output`.
    pub fn process(&self, source: impl AsRef<Path>, output: impl AsRef<Path>) -> MediaResult<LogoLayer> {
        let source = source.as_ref();
        let output = output.as_ref();
        if !source.exists() {
            return Err(MediaError::FileNotFound(source.to_path_buf()));
        }

        let mut image = image::open(source)?.to_rgba8();
        let cleared = strip_dark_background(&mut image, self.settings.darkness, self.settings.whiten);
        let resized = resize_to_width(&image, self.settings.width)?;
        resized.save_with_format(output, image::ImageFormat::Png)?;

        tracing::debug!(
            source = %source.display(),
            cleared,
            width = resized.width(),
            height = resized.height(),
            "Logo processed"
        );

        Ok(LogoLayer {
            path: output.to_path_buf(),
            width: resized.width(),
            height: resized.height(),
            cleared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RgbaImage {
        let mut img = RgbaImage::new(4, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([10, 10, 10, 255])); // sum 30
        img.put_pixel(2, 0, Rgba([20, 20, 20, 200])); // sum 60
        img.put_pixel(3, 0, Rgba([200, 30, 0, 255]));
        img
    }

    #[test]
    fn test_sum_policy() {
        let mut img = sample();
        let cleared = strip_dark_background(&mut img, DarknessPolicy::SumBelow(50), false);
        assert_eq!(cleared, 2);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [10, 10, 10, 0]);
        assert_eq!(img.get_pixel(2, 0).0, [20, 20, 20, 200]);
        assert_eq!(img.get_pixel(3, 0).0, [200, 30, 0, 255]);
    }

    #[test]
    fn test_exact_policy() {
        let mut img = sample();
        assert_eq!(strip_dark_background(&mut img, DarknessPolicy::ExactBlack, false), 1);
        assert_eq!(img.get_pixel(1, 0)[3], 255);
    }

    #[test]
    fn test_channel_policy() {
        let mut img = sample();
        // 200,30,0 has two channels under 40 but not all three
        assert_eq!(strip_dark_background(&mut img, DarknessPolicy::ChannelBelow(40), false), 3);
        assert_eq!(img.get_pixel(3, 0)[3], 255);
    }

    #[test]
    fn test_whiten() {
        let mut img = sample();
        strip_dark_background(&mut img, DarknessPolicy::ExactBlack, true);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 0]);
    }

    #[test]
    fn test_dark_pixels_transparent_others_unchanged() {
        let mut img = RgbaImage::new(16, 16);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgba([(x * 16) as u8, (y * 16) as u8, ((x + y) * 4) as u8, 255]);
        }
        let original = img.clone();
        let policy = DarknessPolicy::SumBelow(50);
        strip_dark_background(&mut img, policy, false);

        for (before, after) in original.pixels().zip(img.pixels()) {
            let [r, g, b, _] = before.0;
            if policy.is_dark(r, g, b) {
                assert_eq!(after[3], 0);
            } else {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn test_resize_keeps_aspect() {
        let img = RgbaImage::new(500, 200);
        let out = resize_to_width(&img, 250).unwrap();
        assert_eq!((out.width(), out.height()), (250, 100));
        assert!(resize_to_width(&img, 0).unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn test_process_writes_png() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("logo.png");
        let dst = dir.path().join("logo_clean.png");

        let mut img = RgbaImage::from_pixel(100, 50, Rgba([0, 0, 0, 255]));
        for x in 40..60 {
            for y in 20..30 {
                img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        img.save(&src).unwrap();

        let layer = LogoProcessor::new(LogoSettings::default()).process(&src, &dst).unwrap();

        assert_eq!((layer.width, layer.height), (250, 125));
        assert_eq!(layer.cleared, 100 * 50 - 20 * 10);
        let out = image::open(&dst).unwrap().to_rgba8();
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(125, 62)[3], 255);
    }

    #[test]
    fn test_process_unreadable_logo() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("logo.png");
        std::fs::write(&src, b"not an image").unwrap();

        let err = LogoProcessor::new(LogoSettings::default())
            .process(&src, dir.path().join("out.png"))
            .unwrap_err();
        assert!(err.is_unreadable());
    }
}
