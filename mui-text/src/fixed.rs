//! Fixed-advance font backend.
//!
//! Every visible character advances by the same fraction of the font size
//! and rasterizes to a solid box. Deterministic on every machine, which makes
//! it the backend of choice for headless measurement, tests, and benches.

use crate::backend::{FontBackend, ScratchImage, ShapedGlyph, ShapedRun};
use crate::error::TextError;
use crate::glyph::{FaceId, Font, GlyphCode, PixelBounds};
use crate::paint::{FontMetricsInt, TextPaint};

/// Backend with monospaced synthetic metrics.
#[derive(Debug, Clone)]
pub struct FixedAdvanceBackend {
    /// Advance as a fraction of the font size.
    advance: f32,
    ascent: f32,
    descent: f32,
    /// Family names, indexed by face id.
    faces: Vec<String>,
}

impl Default for FixedAdvanceBackend {
    fn default() -> Self {
        Self {
            advance: 0.5,
            ascent: 0.8,
            descent: 0.2,
            faces: Vec::new(),
        }
    }
}

impl FixedAdvanceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `em_fraction * size` as the advance of every visible char.
    pub fn with_advance(mut self, em_fraction: f32) -> Self {
        self.advance = em_fraction;
        self
    }

    /// Advance of `c` at `size` pixels.
    pub fn char_advance(&self, c: char, size: u32) -> f32 {
        if is_zero_width(c) {
            0.0
        } else {
            size as f32 * self.advance
        }
    }

    fn face_for(&mut self, family: &str) -> FaceId {
        let index = match self.faces.iter().position(|f| f == family) {
            Some(index) => index,
            None => {
                self.faces.push(family.to_string());
                self.faces.len() - 1
            }
        };
        FaceId(index as u32)
    }

    fn primary_font(&mut self, paint: &TextPaint) -> Font {
        let family = paint
            .families
            .families()
            .first()
            .map(String::as_str)
            .unwrap_or("sans-serif");
        Font::new(self.face_for(family), paint.size)
    }
}

fn is_zero_width(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{FEFF}' | '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}'
    )
}

fn is_blank(code: GlyphCode) -> bool {
    match char::from_u32(code.0 as u32) {
        Some(c) => c.is_whitespace() || is_zero_width(c),
        None => false,
    }
}

impl FontBackend for FixedAdvanceBackend {
    fn resolve_fonts(&mut self, paint: &TextPaint) -> Vec<Font> {
        let families = paint.families.families().to_vec();
        families
            .iter()
            .map(|family| Font::new(self.face_for(family), paint.size))
            .collect()
    }

    fn font_metrics(&mut self, font: Font) -> Result<FontMetricsInt, TextError> {
        let ascent = (font.size as f32 * self.ascent).ceil() as i32;
        let descent = (font.size as f32 * self.descent).ceil() as i32;
        Ok(FontMetricsInt { ascent, descent, height: ascent + descent })
    }

    fn shape(&mut self, text: &str, paint: &TextPaint, rtl: bool) -> Result<ShapedRun, TextError> {
        let font = self.primary_font(paint);
        let mut advances = vec![0.0; text.len()];
        let mut glyphs = Vec::with_capacity(text.len());
        let mut pen = 0.0;

        for (i, c) in text.char_indices() {
            let advance = self.char_advance(c, paint.size);
            advances[i] = advance;
            glyphs.push(ShapedGlyph {
                font,
                code: GlyphCode((c as u32).min(0xFFFF) as u16),
                x: pen,
                y: 0.0,
                cluster: i,
            });
            pen += advance;
        }

        if rtl {
            // Visual order runs right to left.
            for (glyph, c) in glyphs.iter_mut().zip(text.chars()) {
                glyph.x = pen - glyph.x - self.char_advance(c, paint.size);
            }
            glyphs.reverse();
        }

        Ok(ShapedRun { glyphs, advances, advance: pen })
    }

    fn glyph_bounds(&mut self, font: Font, code: GlyphCode) -> Result<PixelBounds, TextError> {
        if is_blank(code) {
            return Ok(PixelBounds::EMPTY);
        }
        let width = ((font.size as f32 * self.advance).ceil() as u32).saturating_sub(1).max(1);
        let height = (font.size as f32 * self.ascent).ceil() as u32;
        Ok(PixelBounds::new(0, -(height as i32), width, height))
    }

    fn draw_glyph(
        &mut self,
        _font: Font,
        _code: GlyphCode,
        bounds: PixelBounds,
        image: &mut ScratchImage,
    ) -> Result<(), TextError> {
        for y in 0..bounds.height as i32 {
            for x in 0..bounds.width as i32 {
                image.put(x, y, 0xFFFF_FFFF);
            }
        }
        Ok(())
    }
}

// ===================================================================
// Tests
// ===================================================================
