//! Font atlas — one growable texture of glyph bitmaps for a single font.
//!
//! Glyphs are packed with a row-based "shelf" algorithm: the cursor moves
//! left to right, and each row is as tall as the tallest glyph placed on it.
//! Every glyph keeps `border` pixels of transparent padding on all sides so
//! that bilinear and mipmapped sampling never bleed into a neighbour.
//!
//! ## Growth
//!
//! ```text
//!   256x256 ──grow──> 256x512 ──grow──> 512x512 ──grow──> 512x1024 ...
//!   (square: double height, halve v)   (wide: double width, halve u)
//! ```
//!
//! Growth keeps every existing texel in place, so stored glyphs only need
//! their UVs rescaled. After a width doubling the cursor continues at the top
//! of the new right half; rows wrap within that half until the next growth.

use rustc_hash::FxHashMap;

use crate::config::AtlasConfig;
use crate::error::TextError;
use crate::glyph::{GlyphCode, GlyphSlot, PixelBounds, TexturedGlyph, TextureId};
use crate::texture::AtlasTexture;

/// Glyph bitmaps of one font, packed into one texture.
pub struct FontAtlas {
    texture: Box<dyn AtlasTexture>,
    glyphs: FxHashMap<GlyphCode, GlyphSlot>,
    config: AtlasConfig,
    /// Texture size; zero until the first glyph is packed.
    width: u32,
    height: u32,
    /// Packing cursor (top-left of the next glyph).
    pos_x: u32,
    pos_y: u32,
    /// Tallest glyph on the current row.
    line_height: u32,
    growths: u32,
    cached: usize,
}

impl FontAtlas {
    /// Create an atlas around an unallocated texture. Storage is allocated
    /// lazily by the first [`pack_glyph`](Self::pack_glyph).
    pub fn new(texture: Box<dyn AtlasTexture>, config: AtlasConfig) -> Self {
        let border = config.border;
        Self {
            texture,
            glyphs: FxHashMap::default(),
            config,
            width: 0,
            height: 0,
            pos_x: border,
            pos_y: border,
            line_height: 0,
            growths: 0,
            cached: 0,
        }
    }

    /// Slot for `code`, inserting a [`GlyphSlot::Pending`] placeholder if the
    /// code was never seen.
    pub fn glyph_slot(&mut self, code: GlyphCode) -> &mut GlyphSlot {
        self.glyphs.entry(code).or_default()
    }

    /// Current slot for `code`, without inserting anything.
    pub fn get(&self, code: GlyphCode) -> Option<&GlyphSlot> {
        self.glyphs.get(&code)
    }

    /// Record that `code` renders to nothing.
    pub fn set_empty(&mut self, code: GlyphCode) {
        if let Some(GlyphSlot::Cached(_)) = self.glyphs.insert(code, GlyphSlot::Empty) {
            self.cached -= 1;
        }
    }

    /// Pack a rasterized coverage bitmap (`bounds.width * bounds.height`
    /// bytes, row-major) and cache the resulting glyph under `code`.
    ///
    /// Zero-area bounds mark the glyph empty and return `Ok(None)`.
    pub fn pack_glyph(
        &mut self,
        code: GlyphCode,
        bounds: PixelBounds,
        alpha: &[u8],
    ) -> Result<Option<TexturedGlyph>, TextError> {
        if bounds.is_empty() {
            self.set_empty(code);
            return Ok(None);
        }

        let (w, h) = (bounds.width, bounds.height);
        let border = self.config.border;
        let max = self.config.max_size;
        if w + border * 2 >= max || h + border * 2 >= max {
            return Err(TextError::GlyphTooLarge { width: w, height: h, max });
        }

        let (x, y) = self.allocate(w, h)?;
        self.texture.upload(x, y, w, h, alpha);
        self.texture.generate_mipmap();

        let glyph = TexturedGlyph {
            texture: self.texture.id(),
            offset_x: bounds.x,
            offset_y: bounds.y,
            width: w,
            height: h,
            u1: x as f32 / self.width as f32,
            v1: y as f32 / self.height as f32,
            u2: (x + w) as f32 / self.width as f32,
            v2: (y + h) as f32 / self.height as f32,
        };

        self.pos_x += w + border * 2;
        self.line_height = self.line_height.max(h);

        if !matches!(self.glyphs.insert(code, GlyphSlot::Cached(glyph)), Some(GlyphSlot::Cached(_))) {
            self.cached += 1;
        }
        log::trace!("Packed glyph {:?} ({}x{}) at ({}, {})", code, w, h, x, y);

        Ok(Some(glyph))
    }

    /// Texture size in pixels, `(0, 0)` before the first glyph.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of times the texture has doubled (initial allocation excluded).
    pub fn growth_count(&self) -> u32 {
        self.growths
    }

    /// Number of glyphs with a bitmap in the atlas.
    pub fn glyph_count(&self) -> usize {
        self.cached
    }

    pub fn texture_id(&self) -> TextureId {
        self.texture.id()
    }

    pub fn texture(&self) -> &dyn AtlasTexture {
        self.texture.as_ref()
    }

    /// Iterate over every cached glyph.
    pub fn glyphs(&self) -> impl Iterator<Item = (GlyphCode, &TexturedGlyph)> {
        self.glyphs
            .iter()
            .filter_map(|(code, slot)| slot.glyph().map(|glyph| (*code, glyph)))
    }

    // ---------------------------------------------------------------
    // Internal helpers
    // ---------------------------------------------------------------

    /// Find the top-left corner for a `w` x `h` glyph, growing as needed.
    fn allocate(&mut self, w: u32, h: u32) -> Result<(u32, u32), TextError> {
        let border = self.config.border;
        if self.width == 0 {
            self.grow()?;
        }

        loop {
            if self.pos_x + w + border >= self.width {
                self.pos_x = self.row_start();
                self.pos_y += self.line_height + border * 2;
                self.line_height = 0;
            }
            if self.pos_x + w + border >= self.width {
                // Wider than a row at this size.
                self.grow_into_fresh_region()?;
                continue;
            }
            if self.pos_y + h + border >= self.height {
                if self.width != self.height {
                    // Continue at the top of the right half added by this growth.
                    self.pos_x = border + self.width;
                    self.pos_y = border;
                    self.line_height = 0;
                }
                self.grow()?;
                continue;
            }
            return Ok((self.pos_x, self.pos_y));
        }
    }

    /// Left edge of a new row: the right half once a square atlas has grown.
    fn row_start(&self) -> u32 {
        let border = self.config.border;
        if self.width == self.height && self.width != self.config.initial_size {
            border + self.width / 2
        } else {
            border
        }
    }

    /// Grow once and move the cursor to the start of the region just added.
    fn grow_into_fresh_region(&mut self) -> Result<(), TextError> {
        let (old_w, old_h) = (self.width, self.height);
        let widen = old_w != old_h;
        self.grow()?;

        let border = self.config.border;
        if widen {
            self.pos_x = border + old_w;
            self.pos_y = border;
        } else {
            self.pos_x = border;
            self.pos_y = border + old_h;
        }
        self.line_height = 0;
        Ok(())
    }

    /// Allocate the initial texture, or double it: height when square,
    /// width otherwise. Rescales all cached UVs in one pass.
    fn grow(&mut self) -> Result<(), TextError> {
        if self.width == 0 {
            let size = self.config.initial_size;
            self.texture.allocate(size, size, self.config.mip_levels);
            self.width = size;
            self.height = size;
            log::debug!("Allocated font atlas {}x{}", size, size);
            return Ok(());
        }

        let widen = self.width != self.height;
        let (new_w, new_h) = if widen {
            (self.width * 2, self.height)
        } else {
            (self.width, self.height * 2)
        };
        let max = self.config.max_size;
        if new_w > max || new_h > max {
            return Err(TextError::AtlasExhausted {
                width: self.width,
                height: self.height,
                max,
            });
        }

        self.texture.resize(new_w, new_h);
        self.width = new_w;
        self.height = new_h;
        self.growths += 1;

        let texture = self.texture.id();
        for slot in self.glyphs.values_mut() {
            if let GlyphSlot::Cached(glyph) = slot {
                if widen {
                    glyph.u1 *= 0.5;
                    glyph.u2 *= 0.5;
                } else {
                    glyph.v1 *= 0.5;
                    glyph.v2 *= 0.5;
                }
                glyph.texture = texture;
            }
        }

        log::debug!("Font atlas grown to {}x{} ({} glyphs)", new_w, new_h, self.cached);
        Ok(())
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::CpuTexture;

    fn atlas() -> FontAtlas {
        FontAtlas::new(Box::new(CpuTexture::new()), AtlasConfig::default())
    }

    fn small_atlas(initial: u32, max: u32) -> FontAtlas {
        let config = AtlasConfig {
            initial_size: initial,
            max_size: max,
            ..AtlasConfig::default()
        };
        FontAtlas::new(Box::new(CpuTexture::new()), config)
    }

    fn bounds(w: u32, h: u32) -> PixelBounds {
        PixelBounds::new(0, -(h as i32), w, h)
    }

    fn pack(atlas: &mut FontAtlas, code: u16, w: u32, h: u32) -> TexturedGlyph {
        let bitmap = vec![255u8; (w * h) as usize];
        atlas
            .pack_glyph(GlyphCode(code), bounds(w, h), &bitmap)
            .unwrap()
            .unwrap()
    }

    fn cpu(atlas: &FontAtlas) -> &CpuTexture {
        atlas.texture().as_any().downcast_ref::<CpuTexture>().unwrap()
    }

    #[test]
    fn test_atlas_lazy_allocation() {
        let mut atlas = atlas();
        assert_eq!(atlas.size(), (0, 0));
        assert_eq!(*atlas.glyph_slot(GlyphCode(1)), GlyphSlot::Pending);
        assert_eq!(atlas.size(), (0, 0));

        pack(&mut atlas, 1, 8, 8);
        assert_eq!(atlas.size(), (256, 256));
        assert_eq!(atlas.growth_count(), 0);
    }

    #[test]
    fn test_first_glyph_at_border() {
        let mut atlas = atlas();
        let glyph = pack(&mut atlas, 1, 8, 10);
        assert_eq!(glyph.pixel_rect(256, 256), (1, 1, 8, 10));
        assert_eq!(glyph.offset_y, -10);
        assert_eq!(atlas.glyph_count(), 1);
    }

    #[test]
    fn test_glyphs_advance_with_border() {
        let mut atlas = atlas();
        pack(&mut atlas, 1, 8, 8);
        let second = pack(&mut atlas, 2, 8, 8);
        // 1 + 8 + 2 * 1
        assert_eq!(second.pixel_rect(256, 256).0, 11);
    }

    #[test]
    fn test_bitmap_uploaded_to_texture() {
        let mut atlas = atlas();
        let bitmap: Vec<u8> = (0..16).map(|i| i as u8 * 10).collect();
        let glyph = atlas
            .pack_glyph(GlyphCode(3), bounds(4, 4), &bitmap)
            .unwrap()
            .unwrap();
        let (x, y, _, _) = glyph.pixel_rect(256, 256);
        let tex = cpu(&atlas);
        assert_eq!(tex.pixel(x, y), 0);
        assert_eq!(tex.pixel(x + 3, y + 3), 150);
        // Border stays transparent.
        assert_eq!(tex.pixel(x - 1, y), 0);
        assert_eq!(tex.pixel(x + 4, y + 3), 0);
    }

    #[test]
    fn test_zero_area_glyph_is_empty() {
        let mut atlas = atlas();
        let result = atlas.pack_glyph(GlyphCode(32), PixelBounds::EMPTY, &[]);
        assert_eq!(result, Ok(None));
        assert_eq!(atlas.get(GlyphCode(32)), Some(&GlyphSlot::Empty));
        assert_eq!(atlas.glyph_count(), 0);
        assert_eq!(atlas.size(), (0, 0));
    }

    #[test]
    fn test_row_wraps_at_right_edge() {
        let mut atlas = small_atlas(64, 1024);
        // 20 + 2 border per glyph: x = 1, 23, then 45 + 20 + 1 >= 64 wraps.
        let a = pack(&mut atlas, 1, 20, 10);
        let b = pack(&mut atlas, 2, 20, 12);
        let c = pack(&mut atlas, 3, 20, 10);
        assert_eq!(a.pixel_rect(64, 64).1, 1);
        assert_eq!(b.pixel_rect(64, 64).0, 23);
        let (cx, cy, _, _) = c.pixel_rect(64, 64);
        assert_eq!(cx, 1);
        // Row height is the taller glyph (12) plus two borders.
        assert_eq!(cy, 1 + 12 + 2);
    }

    #[test]
    fn test_growth_alternates_height_then_width() {
        let mut atlas = small_atlas(32, 1024);
        let mut sizes = vec![];
        for code in 0..200u16 {
            pack(&mut atlas, code, 6, 6);
            if sizes.last() != Some(&atlas.size()) {
                sizes.push(atlas.size());
            }
        }
        assert_eq!(sizes[0], (32, 32));
        assert_eq!(sizes[1], (32, 64));
        assert_eq!(sizes[2], (64, 64));
        assert_eq!(sizes[3], (64, 128));
    }

    #[test]
    fn test_square_iff_even_growths() {
        let mut atlas = small_atlas(32, 4096);
        for code in 0..2000u16 {
            pack(&mut atlas, code, 5 + (code % 7) as u32, 4 + (code % 11) as u32);
            let (w, h) = atlas.size();
            assert_eq!(w == h, atlas.growth_count() % 2 == 0);
        }
        assert!(atlas.growth_count() >= 4);
    }

    #[test]
    fn test_uvs_stay_normalized_after_growth() {
        let mut atlas = small_atlas(32, 4096);
        for code in 0..1500u16 {
            pack(&mut atlas, code, 3 + (code % 13) as u32, 3 + (code % 5) as u32);
        }
        for (_, glyph) in atlas.glyphs() {
            assert!(glyph.u1 >= 0.0 && glyph.u1 < glyph.u2 && glyph.u2 <= 1.0);
            assert!(glyph.v1 >= 0.0 && glyph.v1 < glyph.v2 && glyph.v2 <= 1.0);
        }
    }

    #[test]
    fn test_pixel_rect_preserved_across_growth() {
        let mut atlas = small_atlas(32, 4096);
        let first = pack(&mut atlas, 0, 7, 9);
        let before = first.pixel_rect(32, 32);
        for code in 1..600u16 {
            pack(&mut atlas, code, 7, 9);
        }
        assert!(atlas.growth_count() > 0);
        let (w, h) = atlas.size();
        let after = atlas.get(GlyphCode(0)).unwrap().glyph().unwrap();
        assert_eq!(after.pixel_rect(w, h), before);
        assert_eq!(after.texture, atlas.texture_id());
    }

    #[test]
    fn test_texels_survive_growth() {
        let mut atlas = small_atlas(16, 1024);
        let glyph = pack(&mut atlas, 0, 4, 4);
        let (x, y, _, _) = glyph.pixel_rect(16, 16);
        for code in 1..40u16 {
            pack(&mut atlas, code, 4, 4);
        }
        assert!(atlas.growth_count() >= 2);
        assert_eq!(cpu(&atlas).pixel(x, y), 255);
    }

    #[test]
    fn test_packed_glyphs_never_overlap() {
        let mut atlas = small_atlas(32, 4096);
        let mut seed = 0x2545_f491u32;
        let mut codes = vec![];
        for code in 0..800u16 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let w = 1 + (seed >> 16) % 24;
            let h = 1 + (seed >> 8) % 24;
            pack(&mut atlas, code, w, h);
            codes.push(code);
        }

        let (aw, ah) = atlas.size();
        let rects: Vec<_> = codes
            .iter()
            .map(|c| atlas.get(GlyphCode(*c)).unwrap().glyph().unwrap().pixel_rect(aw, ah))
            .collect();
        for (i, a) in rects.iter().enumerate() {
            assert!(a.0 >= 1 && a.1 >= 1);
            assert!(a.0 + a.2 < aw && a.1 + a.3 < ah);
            for b in &rects[i + 1..] {
                // Border on both sides keeps at least 2px between glyphs.
                let apart_x = a.0 + a.2 + 2 <= b.0 || b.0 + b.2 + 2 <= a.0;
                let apart_y = a.1 + a.3 + 2 <= b.1 || b.1 + b.3 + 2 <= a.1;
                assert!(apart_x || apart_y, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_oversized_glyph_grows_until_it_fits() {
        let mut atlas = atlas();
        pack(&mut atlas, 1, 10, 10);
        let big = pack(&mut atlas, 2, 300, 300);
        let (w, h) = atlas.size();
        assert!(w >= 302 && h >= 302);
        let (x, y, bw, bh) = big.pixel_rect(w, h);
        assert_eq!((bw, bh), (300, 300));
        assert!(x + bw < w && y + bh < h);
        // The first glyph is still where it was.
        let first = atlas.get(GlyphCode(1)).unwrap().glyph().unwrap();
        assert_eq!(first.pixel_rect(w, h), (1, 1, 10, 10));
    }

    #[test]
    fn test_glyph_too_large_for_max() {
        let mut atlas = small_atlas(256, 256);
        let bitmap = vec![0u8; 300 * 300];
        let err = atlas
            .pack_glyph(GlyphCode(1), bounds(300, 300), &bitmap)
            .unwrap_err();
        assert_eq!(err, TextError::GlyphTooLarge { width: 300, height: 300, max: 256 });
    }

    #[test]
    fn test_atlas_exhausted_at_max() {
        let mut atlas = small_atlas(16, 32);
        let bitmap = vec![255u8; 6 * 6];
        let mut result = Ok(None);
        for code in 0..100u16 {
            result = atlas.pack_glyph(GlyphCode(code), bounds(6, 6), &bitmap);
            if result.is_err() {
                break;
            }
        }
        assert_eq!(
            result,
            Err(TextError::AtlasExhausted { width: 32, height: 32, max: 32 })
        );
    }

    #[test]
    fn test_set_empty_replaces_cached() {
        let mut atlas = atlas();
        pack(&mut atlas, 5, 4, 4);
        assert_eq!(atlas.glyph_count(), 1);
        atlas.set_empty(GlyphCode(5));
        assert_eq!(atlas.glyph_count(), 0);
        assert_eq!(atlas.glyphs().count(), 0);
    }
}
