//! Font backend seam — font resolution, shaping, and glyph rasterization.
//!
//! The glyph manager and layouts never talk to a font library directly.
//! [`CosmicBackend`](crate::cosmic::CosmicBackend) is the production
//! implementation; [`FixedAdvanceBackend`](crate::fixed::FixedAdvanceBackend)
//! produces deterministic metrics for headless measurement and tests.

use crate::error::TextError;
use crate::glyph::{Font, GlyphCode, PixelBounds};
use crate::paint::{FontMetricsInt, TextPaint};

/// One positioned glyph of a shaped run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapedGlyph {
    pub font: Font,
    pub code: GlyphCode,
    /// Pen position relative to the run's left edge, in visual order.
    pub x: f32,
    /// Vertical offset from the baseline.
    pub y: f32,
    /// Byte offset of the glyph's cluster within the run text.
    pub cluster: usize,
}

/// Output of [`FontBackend::shape`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapedRun {
    pub glyphs: Vec<ShapedGlyph>,
    /// Advance per byte of the run text. Each cluster's advance is stored at
    /// its first byte; continuation bytes hold zero.
    pub advances: Vec<f32>,
    /// Sum of all advances.
    pub advance: f32,
}

/// Font library used by the glyph manager.
pub trait FontBackend {
    /// Concrete fonts for the paint's family chain, in fallback order.
    /// Never empty for a usable backend.
    fn resolve_fonts(&mut self, paint: &TextPaint) -> Vec<Font>;

    fn font_metrics(&mut self, font: Font) -> Result<FontMetricsInt, TextError>;

    /// Shape a single-direction run.
    fn shape(&mut self, text: &str, paint: &TextPaint, rtl: bool) -> Result<ShapedRun, TextError>;

    /// Pixel bounds of one glyph, from the glyph code alone.
    fn glyph_bounds(&mut self, font: Font, code: GlyphCode) -> Result<PixelBounds, TextError>;

    /// Draw one glyph into `image` with the bounds' top-left corner at (0, 0).
    /// The image is at least `bounds.width` x `bounds.height`.
    fn draw_glyph(
        &mut self,
        font: Font,
        code: GlyphCode,
        bounds: PixelBounds,
        image: &mut ScratchImage,
    ) -> Result<(), TextError>;
}

// ── Scratch raster ──────────────────────────────────────────────────

/// ARGB raster that glyphs are drawn into before packing.
#[derive(Clone, Debug)]
pub struct ScratchImage {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl ScratchImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Set an ARGB pixel; out-of-range writes are ignored.
    pub fn put(&mut self, x: i32, y: i32, argb: u32) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        self.pixels[(y as u32 * self.width + x as u32) as usize] = argb;
    }

    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Clear every pixel to transparent.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Double each side until a `width` x `height` glyph fits.
    /// Returns whether the image was reallocated.
    pub fn ensure_fits(&mut self, width: u32, height: u32) -> bool {
        if width <= self.width && height <= self.height {
            return false;
        }
        let mut w = self.width.max(1);
        let mut h = self.height.max(1);
        while w < width {
            w *= 2;
        }
        while h < height {
            h *= 2;
        }
        *self = Self::new(w, h);
        true
    }

    /// Extract the alpha channel of the top-left `width` x `height` pixels.
    /// With `threshold`, coverage is snapped to 0 or 255 at 50%.
    pub fn extract_alpha(&self, width: u32, height: u32, threshold: bool, out: &mut Vec<u8>) {
        out.clear();
        out.reserve((width * height) as usize);
        for y in 0..height {
            let row = (y * self.width) as usize;
            for x in 0..width as usize {
                let alpha = (self.pixels[row + x] >> 24) as u8;
                out.push(if !threshold {
                    alpha
                } else if alpha >= 128 {
                    255
                } else {
                    0
                });
            }
        }
    }
}

// ===================================================================
// Tests
// ===================================================================
