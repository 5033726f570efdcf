//! Font resolution for the text renderer.
//!
//! Fonts are resolved through an ordered chain of [`FontSource`]s. The last
//! link is the built-in 8x8 bitmap font, which always loads, so text is
//! rendered even on hosts without any TrueType fonts installed.

use std::fmt;
use std::path::{Path, PathBuf};

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};

use crate::error::{MediaError, MediaResult};

/// Bold sans-serif fonts commonly shipped by Linux distros, macOS and Windows.
pub const PLATFORM_BOLD_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

const BUILTIN_CELL: u32 = 8;

/// One strategy for obtaining a font.
pub trait FontSource: Send + Sync {
    /// Human-readable name for logs.
    fn describe(&self) -> String;

    fn load(&self) -> MediaResult<LoadedFont>;
}

/// A TrueType/OpenType file on disk.
#[derive(Debug, Clone)]
pub struct FontFile {
    path: PathBuf,
}

impl FontFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FontSource for FontFile {
    fn describe(&self) -> String {
        format!("font file {}", self.path.display())
    }

    fn load(&self) -> MediaResult<LoadedFont> {
        load_font_file(&self.path)
    }
}

/// The first platform bold font that exists and parses.
#[derive(Debug, Clone)]
pub struct PlatformBold {
    candidates: Vec<PathBuf>,
}

impl PlatformBold {
    pub fn with_candidates<I, P>(candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for PlatformBold {
    fn default() -> Self {
        Self::with_candidates(PLATFORM_BOLD_FONTS.iter().copied())
    }
}

impl FontSource for PlatformBold {
    fn describe(&self) -> String {
        "platform bold sans-serif".to_string()
    }

    fn load(&self) -> MediaResult<LoadedFont> {
        for path in self.candidates.iter().filter(|p| p.exists()) {
            match load_font_file(path) {
                Ok(font) => return Ok(font),
                Err(e) => tracing::debug!(path = %path.display(), "Skipping platform font: {}", e),
            }
        }
        Err(MediaError::FontUnavailable(
            "no platform bold font found".to_string(),
        ))
    }
}

/// Built-in 8x8 bitmap font. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFont;

impl FontSource for BuiltinFont {
    fn describe(&self) -> String {
        "built-in 8x8 bitmap font".to_string()
    }

    fn load(&self) -> MediaResult<LoadedFont> {
        Ok(LoadedFont::Builtin)
    }
}

fn load_font_file(path: &Path) -> MediaResult<LoadedFont> {
    let bytes = std::fs::read(path).map_err(|e| {
        MediaError::FontUnavailable(format!("{}: {}", path.display(), e))
    })?;
    let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|e| {
        MediaError::FontUnavailable(format!("{}: {}", path.display(), e))
    })?;
    Ok(LoadedFont::Outline {
        font: Box::new(font),
        name: path.display().to_string(),
    })
}

/// Ordered font strategies; the first that loads wins.
pub struct FontChain {
    sources: Vec<Box<dyn FontSource>>,
}

impl FontChain {
    pub fn new(sources: Vec<Box<dyn FontSource>>) -> Self {
        Self { sources }
    }

    /// Configured file (if any), then platform bold fonts, then the built-in font.
    pub fn standard(preferred: Option<&str>) -> Self {
        let mut sources: Vec<Box<dyn FontSource>> = Vec::with_capacity(3);
        if let Some(path) = preferred.filter(|p| !p.trim().is_empty()) {
            sources.push(Box::new(FontFile::new(path)));
        }
        sources.push(Box::new(PlatformBold::default()));
        sources.push(Box::new(BuiltinFont));
        Self::new(sources)
    }

    pub fn resolve(&self) -> LoadedFont {
        for source in &self.sources {
            match source.load() {
                Ok(font) => {
                    tracing::debug!(font = %font, "Resolved font from {}", source.describe());
                    return font;
                }
                Err(e) => tracing::debug!("Font source {} failed: {}", source.describe(), e),
            }
        }
        tracing::warn!("No font source loaded, using built-in bitmap font");
        LoadedFont::Builtin
    }
}

impl fmt::Debug for FontChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.sources.iter().map(|s| s.describe()))
            .finish()
    }
}

/// A font ready to measure and draw text.
pub enum LoadedFont {
    Outline { font: Box<Font>, name: String },
    Builtin,
}

impl fmt::Display for LoadedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadedFont::Outline { name, .. } => write!(f, "{name}"),
            LoadedFont::Builtin => write!(f, "builtin-8x8"),
        }
    }
}

impl fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LoadedFont({self})")
    }
}

impl LoadedFont {
    pub fn is_builtin(&self) -> bool {
        matches!(self, LoadedFont::Builtin)
    }

    /// Whole-pixel magnification of the 8x8 cell; never larger than `px`.
    fn builtin_scale(px: f32) -> u32 {
        ((px / BUILTIN_CELL as f32).floor() as u32).max(1)
    }

    /// Distance from a line's top to its baseline.
    pub fn ascent(&self, px: f32) -> f32 {
        match self {
            LoadedFont::Outline { font, .. } => font
                .horizontal_line_metrics(px)
                .map(|m| m.ascent)
                .unwrap_or(px * 0.8),
            LoadedFont::Builtin => (BUILTIN_CELL * Self::builtin_scale(px)) as f32,
        }
    }

    /// Baseline-to-baseline distance.
    pub fn line_height(&self, px: f32) -> f32 {
        match self {
            LoadedFont::Outline { font, .. } => font
                .horizontal_line_metrics(px)
                .map(|m| m.new_line_size)
                .unwrap_or(px * 1.2),
            LoadedFont::Builtin => {
                let scale = Self::builtin_scale(px);
                (BUILTIN_CELL * scale + 2 * scale) as f32
            }
        }
    }

    pub fn advance(&self, c: char, px: f32) -> f32 {
        match self {
            LoadedFont::Outline { font, .. } => font.metrics(c, px).advance_width,
            LoadedFont::Builtin => (BUILTIN_CELL * Self::builtin_scale(px)) as f32,
        }
    }

    /// Width of a single line of text.
    pub fn measure(&self, text: &str, px: f32) -> f32 {
        text.chars().map(|c| self.advance(c, px)).sum()
    }

    /// Draw one glyph with its origin at `(x, baseline)`.
    pub fn draw_glyph(
        &self,
        canvas: &mut RgbaImage,
        c: char,
        px: f32,
        x: f32,
        baseline: f32,
        color: [u8; 3],
    ) {
        match self {
            LoadedFont::Outline { font, .. } => {
                let (metrics, coverage) = font.rasterize(c, px);
                if metrics.width == 0 || metrics.height == 0 {
                    return;
                }
                let left = x.round() as i64 + metrics.xmin as i64;
                let top = baseline.round() as i64 - metrics.height as i64 - metrics.ymin as i64;
                for (i, alpha) in coverage.iter().enumerate() {
                    let gx = (i % metrics.width) as i64;
                    let gy = (i / metrics.width) as i64;
                    blend_pixel(canvas, left + gx, top + gy, color, *alpha);
                }
            }
            LoadedFont::Builtin => {
                let glyph = builtin_glyph(c);
                let scale = Self::builtin_scale(px) as i64;
                let left = x.round() as i64;
                let top = baseline.round() as i64 - BUILTIN_CELL as i64 * scale;
                for (row, bits) in glyph.iter().enumerate() {
                    for col in 0..BUILTIN_CELL as i64 {
                        if bits & (1 << col) == 0 {
                            continue;
                        }
                        for dy in 0..scale {
                            for dx in 0..scale {
                                blend_pixel(
                                    canvas,
                                    left + col * scale + dx,
                                    top + row as i64 * scale + dy,
                                    color,
                                    255,
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}

fn builtin_glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Source-over blend of a solid color with `coverage` alpha.
fn blend_pixel(canvas: &mut RgbaImage, x: i64, y: i64, color: [u8; 3], coverage: u8) {
    if coverage == 0 || x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64
    {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    let src_a = coverage as f32 / 255.0;
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    let mut out = [0u8; 4];
    for ch in 0..3 {
        let value = (color[ch] as f32 * src_a + dst[ch] as f32 * dst_a * (1.0 - src_a)) / out_a;
        out[ch] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round() as u8;
    *dst = Rgba(out);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl FontSource for Failing {
        fn describe(&self) -> String {
            "failing".into()
        }
        fn load(&self) -> MediaResult<LoadedFont> {
            Err(MediaError::FontUnavailable("nope".into()))
        }
    }

    #[test]
    fn test_chain_falls_through_to_builtin() {
        let chain = FontChain::standard(Some("/no/such/font.ttf"));
        // Platform fonts may or may not exist; the chain must still resolve
        let font = chain.resolve();
        assert!(font.measure("Hi", 40.0) > 0.0);
    }

    #[test]
    fn test_empty_or_failing_chain_is_builtin() {
        assert!(FontChain::new(vec![]).resolve().is_builtin());
        assert!(FontChain::new(vec![Box::new(Failing)]).resolve().is_builtin());
    }

    #[test]
    fn test_missing_font_file_is_unavailable() {
        let err = FontFile::new("/no/such/font.ttf").load().unwrap_err();
        assert!(matches!(err, MediaError::FontUnavailable(_)));
    }

    #[test]
    fn test_garbage_font_file_is_unavailable() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(FontFile::new(&path).load().is_err());
        assert!(PlatformBold::with_candidates([path]).load().is_err());
    }

    #[test]
    fn test_builtin_metrics_scale_with_size() {
        let font = LoadedFont::Builtin;
        assert_eq!(font.advance('A', 40.0), 40.0);
        assert_eq!(font.measure("abc", 16.0), 48.0);
        assert_eq!(font.ascent(40.0), 40.0);
        assert_eq!(font.line_height(40.0), 50.0);
        // Never collapses below one pixel per cell
        assert_eq!(font.advance('A', 1.0), 8.0);
    }

    #[test]
    fn test_builtin_draws_opaque_pixels() {
        let mut img = RgbaImage::new(16, 16);
        LoadedFont::Builtin.draw_glyph(&mut img, 'H', 16.0, 0.0, 16.0, [0, 0, 0]);
        let opaque = img.pixels().filter(|p| p[3] == 255).count();
        assert!(opaque > 0);
        assert!(img.pixels().all(|p| p[3] == 0 || p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_blend_clips_outside_canvas() {
        let mut img = RgbaImage::new(2, 2);
        blend_pixel(&mut img, -1, 0, [255, 0, 0], 255);
        blend_pixel(&mut img, 2, 2, [255, 0, 0], 255);
        assert!(img.pixels().all(|p| p[3] == 0));
        blend_pixel(&mut img, 1, 1, [255, 0, 0], 128);
        assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0, 128]);
    }
}
