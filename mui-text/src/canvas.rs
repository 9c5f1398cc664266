//! Drawing sink for layouts, and a recording implementation.
//!
//! Layouts emit draw calls into a [`Canvas`]. [`DrawList`] records them as
//! [`DrawOp`]s in screen space for the renderer to batch later.

use crate::error::TextError;
use crate::glyph::{Font, GlyphCode, TexturedGlyph};
use crate::manager::GlyphManager;
use crate::paint::TextPaint;

/// Target of layout drawing.
pub trait Canvas {
    /// True when the rectangle is entirely outside the clip and can be skipped.
    fn quick_reject(&self, left: f32, top: f32, right: f32, bottom: f32) -> bool;

    /// Draw an atlas glyph with its pen position at `(x, baseline)`.
    fn draw_glyph(
        &mut self,
        glyph: &TexturedGlyph,
        font: Font,
        code: GlyphCode,
        x: f32,
        baseline: f32,
        paint: &TextPaint,
    );

    /// Draw a plain left-to-right string starting at `(x, baseline)`.
    fn draw_text(&mut self, text: &str, x: f32, baseline: f32, paint: &TextPaint);

    /// Fill a rectangle with an ARGB color.
    fn draw_rect(&mut self, left: f32, top: f32, right: f32, bottom: f32, color: u32);
}

/// A glyph quad in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphQuad {
    pub font: Font,
    pub code: GlyphCode,
    pub glyph: TexturedGlyph,
    /// Top-left of the bitmap.
    pub x: f32,
    pub y: f32,
    /// ARGB color.
    pub color: u32,
}

/// One recorded draw call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Rect {
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
        color: u32,
    },
    Glyph(GlyphQuad),
    /// Direct string draw, resolved to glyphs by [`DrawList::resolve_text`].
    Text {
        text: String,
        x: f32,
        baseline: f32,
        paint: TextPaint,
    },
}

/// Recording canvas with an optional clip and a translation.
#[derive(Clone, Debug, Default)]
pub struct DrawList {
    ops: Vec<DrawOp>,
    clip: Option<[f32; 4]>,
    dx: f32,
    dy: f32,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clip drawing to `left, top, right, bottom` in screen space.
    pub fn with_clip(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            clip: Some([left, top, right, bottom]),
            ..Self::default()
        }
    }

    /// Offset subsequent draws; layouts draw at their own origin.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.dx += dx;
        self.dy += dy;
    }

    pub fn set_translation(&mut self, dx: f32, dy: f32) {
        self.dx = dx;
        self.dy = dy;
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Iterate over recorded glyph quads.
    pub fn glyph_quads(&self) -> impl Iterator<Item = &GlyphQuad> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Glyph(quad) => Some(quad),
            _ => None,
        })
    }

    /// Replace every [`DrawOp::Text`] with the glyph quads of its string,
    /// shaped left to right.
    pub fn resolve_text(&mut self, glyphs: &mut GlyphManager) -> Result<(), TextError> {
        if !self.ops.iter().any(|op| matches!(op, DrawOp::Text { .. })) {
            return Ok(());
        }
        let ops = std::mem::take(&mut self.ops);
        let mut resolved = Vec::with_capacity(ops.len());
        for op in ops {
            let DrawOp::Text { text, x, baseline, paint } = op else {
                resolved.push(op);
                continue;
            };
            let piece = glyphs.layout_piece(&text, &paint, false)?;
            for shaped in piece.glyphs() {
                if let Some(glyph) = glyphs.lookup_glyph(shaped.font, shaped.code)? {
                    resolved.push(DrawOp::Glyph(GlyphQuad {
                        font: shaped.font,
                        code: shaped.code,
                        glyph,
                        x: x + shaped.x + glyph.offset_x as f32,
                        y: baseline + shaped.y + glyph.offset_y as f32,
                        color: paint.color,
                    }));
                }
            }
        }
        self.ops = resolved;
        Ok(())
    }

    /// Re-read every recorded glyph from the manager so UVs reflect atlas
    /// growth. Glyphs dropped by a reload are removed.
    pub fn refresh(&mut self, glyphs: &GlyphManager) {
        self.ops.retain_mut(|op| match op {
            DrawOp::Glyph(quad) => match glyphs.peek_glyph(quad.font, quad.code) {
                Some(glyph) => {
                    quad.glyph = glyph;
                    true
                }
                None => false,
            },
            _ => true,
        });
    }
}

impl Canvas for DrawList {
    fn quick_reject(&self, left: f32, top: f32, right: f32, bottom: f32) -> bool {
        let Some([cl, ct, cr, cb]) = self.clip else {
            return false;
        };
        let (l, t) = (left + self.dx, top + self.dy);
        let (r, b) = (right + self.dx, bottom + self.dy);
        l >= cr || r <= cl || t >= cb || b <= ct
    }

    fn draw_glyph(
        &mut self,
        glyph: &TexturedGlyph,
        font: Font,
        code: GlyphCode,
        x: f32,
        baseline: f32,
        paint: &TextPaint,
    ) {
        self.ops.push(DrawOp::Glyph(GlyphQuad {
            font,
            code,
            glyph: *glyph,
            x: x + self.dx + glyph.offset_x as f32,
            y: baseline + self.dy + glyph.offset_y as f32,
            color: paint.color,
        }));
    }

    fn draw_text(&mut self, text: &str, x: f32, baseline: f32, paint: &TextPaint) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x: x + self.dx,
            baseline: baseline + self.dy,
            paint: paint.clone(),
        });
    }

    fn draw_rect(&mut self, left: f32, top: f32, right: f32, bottom: f32, color: u32) {
        self.ops.push(DrawOp::Rect {
            left: left + self.dx,
            top: top + self.dy,
            right: right + self.dx,
            bottom: bottom + self.dy,
            color,
        });
    }
}

// ===================================================================
// Tests
// ===================================================================
