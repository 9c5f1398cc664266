//! Glyph manager — per-font atlases, rasterization, and shaped-piece cache.
//!
//! ## Miss path
//!
//! ```text
//!  lookup_glyph(font, code)
//!     │ Pending
//!     ▼
//!  backend.glyph_bounds ──zero area──▶ Empty (Ok(None))
//!     │
//!     ▼
//!  scratch.ensure_fits ─▶ backend.draw_glyph ─▶ ARGB >> 24 ─▶ atlas.pack_glyph
//! ```
//!
//! All state belongs to the render thread; every mutating call takes
//! `&mut self`.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::atlas::FontAtlas;
use crate::backend::{FontBackend, ScratchImage};
use crate::config::GlyphConfig;
use crate::error::TextError;
use crate::glyph::{Font, GlyphCode, GlyphSlot, TexturedGlyph};
use crate::paint::{FontMetricsInt, TextPaint};
use crate::piece::{LayoutCache, LayoutPiece, PieceKey};
use crate::texture::TextureFactory;

/// Owns every font atlas and the font backend.
pub struct GlyphManager {
    backend: Box<dyn FontBackend>,
    textures: Box<dyn TextureFactory>,
    config: GlyphConfig,
    atlases: FxHashMap<Font, FontAtlas>,
    metrics: FxHashMap<Font, FontMetricsInt>,
    layouts: LayoutCache,
    image: ScratchImage,
    alpha: Vec<u8>,
    rasterized: u64,
}

impl GlyphManager {
    pub fn new(
        backend: Box<dyn FontBackend>,
        textures: Box<dyn TextureFactory>,
        config: GlyphConfig,
    ) -> Self {
        let image = ScratchImage::new(config.scratch_size, config.scratch_size);
        let layouts = LayoutCache::new(config.layout_cache_size);
        log::info!(
            "Glyph manager ready (atlas {}px, max {}px, bitmap-like: {})",
            config.atlas.initial_size,
            config.atlas.max_size,
            config.bitmap_like
        );
        Self {
            backend,
            textures,
            config,
            atlases: FxHashMap::default(),
            metrics: FxHashMap::default(),
            layouts,
            image,
            alpha: Vec::new(),
            rasterized: 0,
        }
    }

    pub fn config(&self) -> &GlyphConfig {
        &self.config
    }

    /// Find or rasterize a glyph. `Ok(None)` means there is nothing to draw.
    pub fn lookup_glyph(
        &mut self,
        font: Font,
        code: GlyphCode,
    ) -> Result<Option<TexturedGlyph>, TextError> {
        let textures = &self.textures;
        let atlas_config = &self.config.atlas;
        let atlas = self
            .atlases
            .entry(font)
            .or_insert_with(|| FontAtlas::new(textures.create_texture(), atlas_config.clone()));

        match atlas.glyph_slot(code) {
            GlyphSlot::Cached(glyph) => return Ok(Some(*glyph)),
            GlyphSlot::Empty => return Ok(None),
            GlyphSlot::Pending => {}
        }

        let bounds = match self.backend.glyph_bounds(font, code) {
            Ok(bounds) => bounds,
            Err(e) => {
                log::warn!("Failed to measure glyph {:?} of {:?}: {}", code, font, e);
                atlas.set_empty(code);
                return Ok(None);
            }
        };
        if bounds.is_empty() {
            atlas.set_empty(code);
            return Ok(None);
        }

        if self.image.ensure_fits(bounds.width, bounds.height) {
            log::debug!(
                "Glyph scratch image grown to {}x{}",
                self.image.width(),
                self.image.height()
            );
        }
        if let Err(e) = self.backend.draw_glyph(font, code, bounds, &mut self.image) {
            log::warn!("Failed to rasterize glyph {:?} of {:?}: {}", code, font, e);
            self.image.clear();
            atlas.set_empty(code);
            return Ok(None);
        }
        self.rasterized += 1;

        self.image
            .extract_alpha(bounds.width, bounds.height, self.config.bitmap_like, &mut self.alpha);
        let packed = atlas.pack_glyph(code, bounds, &self.alpha);
        self.image.clear();
        packed
    }

    /// Current entry for a glyph without rasterizing.
    pub fn peek_glyph(&self, font: Font, code: GlyphCode) -> Option<TexturedGlyph> {
        self.atlases
            .get(&font)
            .and_then(|atlas| atlas.get(code))
            .and_then(|slot| slot.glyph().copied())
    }

    /// Metrics of a single font, cached until reload.
    pub fn font_metrics(&mut self, font: Font) -> Result<FontMetricsInt, TextError> {
        if let Some(fm) = self.metrics.get(&font) {
            return Ok(*fm);
        }
        let fm = self.backend.font_metrics(font)?;
        self.metrics.insert(font, fm);
        Ok(fm)
    }

    /// Largest ascent, descent and height over the paint's fallback chain.
    pub fn measure_font_extents(&mut self, paint: &TextPaint) -> Result<FontMetricsInt, TextError> {
        let mut extent = FontMetricsInt::default();
        for font in self.backend.resolve_fonts(paint) {
            extent.extend_by(&self.font_metrics(font)?);
        }
        Ok(extent)
    }

    /// Shape and measure a single-direction run, memoized.
    pub fn layout_piece(
        &mut self,
        text: &str,
        paint: &TextPaint,
        rtl: bool,
    ) -> Result<Arc<LayoutPiece>, TextError> {
        let key = PieceKey::new(text, paint, rtl);
        if let Some(piece) = self.layouts.get(&key) {
            return Ok(piece);
        }

        let run = self.backend.shape(text, paint, rtl)?;
        let mut used: Vec<Font> = Vec::new();
        let mut extent = FontMetricsInt::default();
        for glyph in &run.glyphs {
            if !used.contains(&glyph.font) {
                used.push(glyph.font);
                extent.extend_by(&self.font_metrics(glyph.font)?);
            }
        }
        if used.is_empty() {
            extent = self.measure_font_extents(paint)?;
        }

        let piece = Arc::new(LayoutPiece::new(run, extent));
        self.layouts.put(key, Arc::clone(&piece));
        Ok(piece)
    }

    /// Drop every atlas, glyph, metric and shaped piece. Glyph copies handed
    /// out before this call must not be drawn afterwards.
    pub fn reload(&mut self) {
        let atlases = self.atlases.len();
        self.atlases.clear();
        self.metrics.clear();
        self.layouts.clear();
        self.image = ScratchImage::new(self.config.scratch_size, self.config.scratch_size);
        self.alpha = Vec::new();
        log::info!("Glyph manager reloaded ({} atlases released)", atlases);
    }

    /// Release everything. The manager is unusable afterwards.
    pub fn shutdown(mut self) {
        self.reload();
        log::info!("Glyph manager shut down after {} rasterizations", self.rasterized);
    }

    pub fn atlas(&self, font: Font) -> Option<&FontAtlas> {
        self.atlases.get(&font)
    }

    pub fn atlases(&self) -> impl Iterator<Item = (Font, &FontAtlas)> {
        self.atlases.iter().map(|(font, atlas)| (*font, atlas))
    }

    pub fn atlas_count(&self) -> usize {
        self.atlases.len()
    }

    /// Number of glyphs drawn by the backend since construction.
    pub fn rasterize_count(&self) -> u64 {
        self.rasterized
    }

    pub fn layout_cache(&self) -> &LayoutCache {
        &self.layouts
    }

    /// Log each atlas' font, size, and glyph count.
    pub fn debug_dump(&self) {
        for (font, atlas) in &self.atlases {
            let (w, h) = atlas.size();
            log::info!(
                "Atlas {:?} @ {}px: {}x{}, {} glyphs, {} growths",
                font.face,
                font.size,
                w,
                h,
                atlas.glyph_count(),
                atlas.growth_count()
            );
        }
        let (hits, misses) = self.layouts.stats();
        log::info!(
            "Layout cache: {} pieces, {} hits, {} misses",
            self.layouts.len(),
            hits,
            misses
        );
    }
}

// ===================================================================
// Tests
// ===================================================================
