//! Overlay text rasterization.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use reel_models::{Rgb, TextSettings};

use crate::error::{MediaError, MediaResult};
use crate::font::{FontChain, LoadedFont};

/// Smallest size text is shrunk to when fitting a width limit.
const MIN_FONT_PX: f32 = 8.0;

/// Greedy word wrap at `width` characters.
///
/// Whitespace runs collapse to single spaces. Words are never split; a word
/// longer than `width` sits alone on its own line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Visual style of an overlay text block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub color: Rgb,
    pub wrap_width: usize,
    pub padding_x: u32,
    pub padding_y: u32,
    /// Upper bound on the raster width, padding included
    pub max_width: Option<u32>,
}

impl TextStyle {
    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = Some(max_width);
        self
    }
}

impl From<&TextSettings> for TextStyle {
    fn from(settings: &TextSettings) -> Self {
        Self {
            font_size: settings.font_size as f32,
            color: settings.color,
            wrap_width: settings.wrap_width,
            padding_x: settings.padding_x,
            padding_y: settings.padding_y,
            max_width: None,
        }
    }
}

/// A rendered text raster on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub lines: usize,
}

/// Rasterizes wrapped text onto a transparent RGBA image.
#[derive(Debug)]
pub struct TextRenderer {
    font: LoadedFont,
}

impl TextRenderer {
    pub fn new(font: LoadedFont) -> Self {
        Self { font }
    }

    /// Resolve the standard font chain with an optional preferred font file.
    pub fn with_font_path(font_path: Option<&str>) -> Self {
        Self::new(FontChain::standard(font_path).resolve())
    }

    pub fn font(&self) -> &LoadedFont {
        &self.font
    }

    pub fn render(&self, text: &str, style: &TextStyle) -> MediaResult<RgbaImage> {
        if !(style.font_size.is_finite() && style.font_size > 0.0) {
            return Err(MediaError::invalid_parameter(format!(
                "font size must be positive, got {}",
                style.font_size
            )));
        }

        let lines = wrap_text(text, style.wrap_width);
        let px = self.fit_font_size(&lines, style);
        let line_height = self.font.line_height(px);
        let widths: Vec<f32> = lines.iter().map(|l| self.font.measure(l, px)).collect();

        let box_w = widths.iter().copied().fold(0.0f32, f32::max).ceil() as u32;
        let box_h = (line_height * lines.len() as f32).ceil() as u32;
        let mut img_w = (box_w + style.padding_x).max(1);
        if let Some(max_width) = style.max_width {
            // A single word wider than the limit even at the minimum size is clipped
            img_w = img_w.min(max_width.max(1));
        }
        let img_h = (box_h + style.padding_y).max(1);

        let mut image = RgbaImage::new(img_w, img_h);
        let color = style.color.to_array();
        let ascent = self.font.ascent(px);
        let block_top = (img_h as f32 - box_h as f32) / 2.0;

        for (i, (line, width)) in lines.iter().zip(&widths).enumerate() {
            let mut x = (img_w as f32 - width) / 2.0;
            let baseline = block_top + i as f32 * line_height + ascent;
            for c in line.chars() {
                self.font.draw_glyph(&mut image, c, px, x, baseline, color);
                x += self.font.advance(c, px);
            }
        }

        Ok(image)
    }

    /// Largest size up to `style.font_size` whose widest line fits `style.max_width`.
    fn fit_font_size(&self, lines: &[String], style: &TextStyle) -> f32 {
        let mut px = style.font_size;
        let Some(max_width) = style.max_width else {
            return px;
        };
        let available = max_width.saturating_sub(style.padding_x) as f32;

        for _ in 0..16 {
            let widest = self.widest_line(lines, px);
            if widest <= available || px <= MIN_FONT_PX {
                break;
            }
            px = (px * available / widest).min(px * 0.97).max(MIN_FONT_PX);
        }
        px
    }

    fn widest_line(&self, lines: &[String], px: f32) -> f32 {
        lines
            .iter()
            .map(|l| self.font.measure(l, px))
            .fold(0.0f32, f32::max)
            .ceil()
    }

    /// Render and save as PNG.
    pub fn render_to_file(
        &self,
        text: &str,
        style: &TextStyle,
        output: impl AsRef<Path>,
    ) -> MediaResult<TextLayer> {
        let output = output.as_ref();
        let image = self.render(text, style)?;
        image.save_with_format(output, image::ImageFormat::Png)?;

        Ok(TextLayer {
            path: output.to_path_buf(),
            width: image.width(),
            height: image.height(),
            lines: wrap_text(text, style.wrap_width).len(),
        })
    }
}
