//! Glyph identity and cached atlas entries.

use std::sync::atomic::{AtomicU64, Ordering};

/// Backend-assigned identifier of a font face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub u32);

/// Opaque glyph index within a face. Not a code point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphCode(pub u16);

/// A face rendered at a pixel size. Each `Font` owns one atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Font {
    pub face: FaceId,
    /// Size in pixels.
    pub size: u32,
}

impl Font {
    pub fn new(face: FaceId, size: u32) -> Self {
        Self { face, size }
    }
}

/// Identity of one texture allocation. A texture gets a fresh id every time
/// its storage is (re)allocated, so stale bindings are easy to detect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

impl TextureId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        Self(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Pixel bounds of a rasterized glyph relative to the pen position on the
/// baseline. `y` is negative above the baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelBounds {
    pub const EMPTY: PixelBounds = PixelBounds { x: 0, y: 0, width: 0, height: 0 };

    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A glyph that lives in a font atlas.
///
/// Copies handed out by the glyph manager are snapshots: UVs are rescaled in
/// the atlas when it grows, and everything is dropped on reload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexturedGlyph {
    /// Texture holding the bitmap.
    pub texture: TextureId,
    /// Offset of the bitmap's top-left corner from the pen position.
    pub offset_x: i32,
    pub offset_y: i32,
    /// Bitmap size in pixels.
    pub width: u32,
    pub height: u32,
    /// Normalized texture coordinates, top-left then bottom-right.
    pub u1: f32,
    pub v1: f32,
    pub u2: f32,
    pub v2: f32,
}

impl TexturedGlyph {
    /// Pixel rectangle `(x, y, width, height)` this glyph occupies in a
    /// texture of the given size.
    pub fn pixel_rect(&self, atlas_width: u32, atlas_height: u32) -> (u32, u32, u32, u32) {
        let x = (self.u1 * atlas_width as f32).round() as u32;
        let y = (self.v1 * atlas_height as f32).round() as u32;
        let right = (self.u2 * atlas_width as f32).round() as u32;
        let bottom = (self.v2 * atlas_height as f32).round() as u32;
        (x, y, right - x, bottom - y)
    }
}

/// State of a glyph code within an atlas.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GlyphSlot {
    /// Looked up but not rasterized yet.
    #[default]
    Pending,
    /// Rasterized to nothing (whitespace) or failed; draws as a no-op.
    Empty,
    Cached(TexturedGlyph),
}

impl GlyphSlot {
    pub fn glyph(&self) -> Option<&TexturedGlyph> {
        match self {
            GlyphSlot::Cached(glyph) => Some(glyph),
            _ => None,
        }
    }
}

// ===================================================================
// Tests
// ===================================================================
