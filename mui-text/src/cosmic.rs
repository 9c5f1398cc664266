//! Cosmic-text font backend — shapes with `cosmic-text` and rasterizes with
//! its `SwashCache`.
//!
//! The backend manages a `FontSystem` (font discovery + shaping) and a
//! `SwashCache` (glyph rasterization). Face metrics are read straight from
//! the font tables with `ttf-parser`.
//!
//! fontdb face ids are mapped to dense [`FaceId`]s on first sight so that
//! atlases and caches can key on a plain integer.

use cosmic_text::{
    fontdb, Attrs, Buffer, CacheKey, CacheKeyFlags, Family, FontSystem, Metrics, Shaping,
    Style as CStyle, SwashCache, SwashContent, Weight,
};
use rustc_hash::FxHashMap;

use crate::backend::{FontBackend, ScratchImage, ShapedGlyph, ShapedRun};
use crate::error::TextError;
use crate::glyph::{FaceId, Font, GlyphCode, PixelBounds};
use crate::paint::{FontMetricsInt, FontStyle, TextPaint};

const LEFT_TO_RIGHT_MARK: char = '\u{200E}';
const RIGHT_TO_LEFT_MARK: char = '\u{200F}';

/// Map a CSS family name to a cosmic-text family.
fn family_of(name: &str) -> Family<'_> {
    match name {
        "sans-serif" => Family::SansSerif,
        "serif" => Family::Serif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        concrete => Family::Name(concrete),
    }
}

/// Production font backend.
pub struct CosmicBackend {
    font_system: FontSystem,
    swash_cache: SwashCache,
    /// Dense face index → fontdb id.
    faces: Vec<fontdb::ID>,
    face_ids: FxHashMap<fontdb::ID, FaceId>,
}

impl CosmicBackend {
    /// Create a backend with system font discovery.
    pub fn new() -> Self {
        Self::with_font_system(FontSystem::new())
    }

    /// Create a backend around an existing font system.
    pub fn with_font_system(font_system: FontSystem) -> Self {
        log::info!(
            "Cosmic font backend ready ({} faces)",
            font_system.db().faces().count()
        );
        Self {
            font_system,
            swash_cache: SwashCache::new(),
            faces: Vec::new(),
            face_ids: FxHashMap::default(),
        }
    }

    /// Register font data (TTF/OTF bytes), e.g. a bundled font.
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.font_system.db_mut().load_font_data(data);
    }

    pub fn font_system(&self) -> &FontSystem {
        &self.font_system
    }

    /// Number of faces discovered by the font database.
    pub fn face_count(&self) -> usize {
        self.font_system.db().faces().count()
    }

    fn face_id(&mut self, id: fontdb::ID) -> FaceId {
        if let Some(face) = self.face_ids.get(&id) {
            return *face;
        }
        let face = FaceId(self.faces.len() as u32);
        self.faces.push(id);
        self.face_ids.insert(id, face);
        face
    }

    fn fontdb_id(&self, font: Font) -> Result<fontdb::ID, TextError> {
        self.faces
            .get(font.face.0 as usize)
            .copied()
            .ok_or_else(|| TextError::Backend(format!("unknown face {:?}", font.face)))
    }

    fn query(&self, family: Family<'_>, style: FontStyle) -> Option<fontdb::ID> {
        let families = [family];
        let query = fontdb::Query {
            families: &families,
            weight: if style.bold { fontdb::Weight::BOLD } else { fontdb::Weight::NORMAL },
            stretch: fontdb::Stretch::Normal,
            style: if style.italic { fontdb::Style::Italic } else { fontdb::Style::Normal },
        };
        self.font_system.db().query(&query)
    }

    fn cache_key(&self, font: Font, code: GlyphCode) -> Result<CacheKey, TextError> {
        let id = self.fontdb_id(font)?;
        let (key, _, _) = CacheKey::new(
            id,
            code.0,
            font.size as f32,
            (0.0, 0.0),
            CacheKeyFlags::empty(),
        );
        Ok(key)
    }
}

impl Default for CosmicBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FontBackend for CosmicBackend {
    fn resolve_fonts(&mut self, paint: &TextPaint) -> Vec<Font> {
        let mut fonts = Vec::new();
        for name in paint.families.families() {
            if let Some(id) = self.query(family_of(name), paint.style) {
                let font = Font::new(self.face_id(id), paint.size);
                if !fonts.contains(&font) {
                    fonts.push(font);
                }
            }
        }
        if fonts.is_empty() {
            if let Some(id) = self.query(Family::SansSerif, paint.style) {
                fonts.push(Font::new(self.face_id(id), paint.size));
            }
        }
        fonts
    }

    fn font_metrics(&mut self, font: Font) -> Result<FontMetricsInt, TextError> {
        let id = self.fontdb_id(font)?;
        let tables = self
            .font_system
            .db()
            .with_face_data(id, |data, index| {
                ttf_parser::Face::parse(data, index).ok().map(|face| {
                    (
                        face.ascender(),
                        face.descender(),
                        face.line_gap(),
                        face.units_per_em(),
                    )
                })
            })
            .flatten();

        let (ascender, descender, line_gap, units_per_em) =
            tables.ok_or_else(|| TextError::Backend(format!("unreadable face {:?}", font.face)))?;
        let scale = font.size as f32 / units_per_em.max(1) as f32;
        let ascent = (ascender as f32 * scale).ceil() as i32;
        let descent = (-(descender as f32) * scale).ceil() as i32;
        let leading = (line_gap as f32 * scale).round() as i32;
        Ok(FontMetricsInt {
            ascent,
            descent,
            height: ascent + descent + leading,
        })
    }

    fn shape(&mut self, text: &str, paint: &TextPaint, rtl: bool) -> Result<ShapedRun, TextError> {
        let size = paint.size as f32;
        let family = paint
            .families
            .families()
            .first()
            .map(|name| family_of(name))
            .unwrap_or(Family::SansSerif);
        let attrs = Attrs::new()
            .family(family)
            .weight(if paint.style.bold { Weight::BOLD } else { Weight::NORMAL })
            .style(if paint.style.italic { CStyle::Italic } else { CStyle::Normal });

        // cosmic-text picks the paragraph level from the first strong
        // character, so a leading mark pins it to the requested direction.
        let mark = if rtl { RIGHT_TO_LEFT_MARK } else { LEFT_TO_RIGHT_MARK };
        let marked = format!("{mark}{text}");
        let mark_len = mark.len_utf8();

        // Single line, no wrapping: the layout engine breaks lines itself.
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, size));
        buffer.set_size(&mut self.font_system, None, None);
        buffer.set_text(&mut self.font_system, &marked, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let mut run_out = ShapedRun {
            glyphs: Vec::new(),
            advances: vec![0.0; text.len()],
            advance: 0.0,
        };
        let mut line_offset = 0usize;
        let mut pen = 0.0f32;
        let mut shaped = Vec::new();
        for run in buffer.layout_runs() {
            // Width of the mark's glyphs left of the first line's text.
            let mut lead = 0.0f32;
            for glyph in run.glyphs.iter() {
                let cluster = line_offset + glyph.start;
                if cluster < mark_len {
                    if !rtl {
                        lead += glyph.w;
                    }
                    continue;
                }
                shaped.push((
                    glyph.font_id,
                    glyph.glyph_id,
                    pen + glyph.x - lead,
                    glyph.y,
                    cluster - mark_len,
                    glyph.w,
                ));
            }
            pen += run.line_w - lead;
            // cosmic-text splits on hard breaks; keep offsets text-relative.
            line_offset += run.text.len() + 1;
        }

        for (font_id, glyph_id, x, y, cluster, w) in shaped {
            let face = self.face_id(font_id);
            run_out.glyphs.push(ShapedGlyph {
                font: Font::new(face, paint.size),
                code: GlyphCode(glyph_id),
                x,
                y,
                cluster,
            });
            if let Some(advance) = run_out.advances.get_mut(cluster) {
                *advance += w;
            }
            run_out.advance += w;
        }

        Ok(run_out)
    }

    fn glyph_bounds(&mut self, font: Font, code: GlyphCode) -> Result<PixelBounds, TextError> {
        let key = self.cache_key(font, code)?;
        let image = self.swash_cache.get_image(&mut self.font_system, key);
        Ok(match image {
            Some(image) => PixelBounds::new(
                image.placement.left,
                -image.placement.top,
                image.placement.width,
                image.placement.height,
            ),
            None => PixelBounds::EMPTY,
        })
    }

    fn draw_glyph(
        &mut self,
        font: Font,
        code: GlyphCode,
        bounds: PixelBounds,
        image: &mut ScratchImage,
    ) -> Result<(), TextError> {
        let key = self.cache_key(font, code)?;
        let Some(glyph) = self.swash_cache.get_image(&mut self.font_system, key) else {
            return Err(TextError::Backend(format!("no image for glyph {:?}", code)));
        };

        let (w, h) = (bounds.width as usize, bounds.height as usize);
        for y in 0..h {
            for x in 0..w {
                let i = y * w + x;
                let argb = match glyph.content {
                    SwashContent::Mask => {
                        let a = glyph.data.get(i).copied().unwrap_or(0) as u32;
                        (a << 24) | 0x00FF_FFFF
                    }
                    SwashContent::SubpixelMask => {
                        let px = glyph.data.get(i * 4..i * 4 + 3).unwrap_or(&[0, 0, 0]);
                        let a = (px[0] as u32 + px[1] as u32 + px[2] as u32) / 3;
                        (a << 24) | 0x00FF_FFFF
                    }
                    SwashContent::Color => {
                        let px = glyph.data.get(i * 4..i * 4 + 4).unwrap_or(&[0, 0, 0, 0]);
                        ((px[3] as u32) << 24)
                            | ((px[0] as u32) << 16)
                            | ((px[1] as u32) << 8)
                            | px[2] as u32
                    }
                };
                image.put(x as i32, y as i32, argb);
            }
        }
        Ok(())
    }
}

// ===================================================================
// Tests
// ===================================================================
