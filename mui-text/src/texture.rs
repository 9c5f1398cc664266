//! Atlas texture abstraction.
//!
//! A [`FontAtlas`](crate::atlas::FontAtlas) owns exactly one texture behind
//! the [`AtlasTexture`] trait. The renderer supplies GPU textures through a
//! [`TextureFactory`]; [`CpuTexture`] keeps everything in memory for headless
//! use and tests.
//!
//! Textures are single-channel (coverage) with a mip chain built by a 2x2
//! box filter, see [`mip_chain`].

use std::any::Any;

use crate::glyph::TextureId;

/// Storage for one font atlas.
pub trait AtlasTexture {
    /// Current identity. Changes on every (re)allocation.
    fn id(&self) -> TextureId;

    /// Allocate `width` x `height` texels with `mip_levels` levels, cleared to zero.
    fn allocate(&mut self, width: u32, height: u32, mip_levels: u32);

    /// Grow to `width` x `height`, keeping existing texels at the same pixel
    /// position and clearing the newly exposed area.
    fn resize(&mut self, width: u32, height: u32);

    /// Write a tightly packed coverage bitmap into level 0 at `(x, y)`.
    fn upload(&mut self, x: u32, y: u32, width: u32, height: u32, alpha: &[u8]);

    /// Regenerate every mip level from level 0.
    fn generate_mipmap(&mut self);

    /// Used by renderers to reach their concrete texture type.
    fn as_any(&self) -> &dyn Any;
}

/// Creates atlas textures on demand.
pub trait TextureFactory {
    fn create_texture(&self) -> Box<dyn AtlasTexture>;
}

// ── Mip generation ──────────────────────────────────────────────────

/// Halve a single-channel image with a 2x2 box filter.
///
/// Odd edges are clamped. Returns the new image and its size.
pub fn downsample(src: &[u8], width: u32, height: u32) -> (Vec<u8>, u32, u32) {
    let dst_w = (width / 2).max(1);
    let dst_h = (height / 2).max(1);
    let mut dst = vec![0u8; (dst_w * dst_h) as usize];

    for y in 0..dst_h {
        let y0 = (y * 2).min(height - 1);
        let y1 = (y * 2 + 1).min(height - 1);
        for x in 0..dst_w {
            let x0 = (x * 2).min(width - 1);
            let x1 = (x * 2 + 1).min(width - 1);
            let sum = src[(y0 * width + x0) as usize] as u32
                + src[(y0 * width + x1) as usize] as u32
                + src[(y1 * width + x0) as usize] as u32
                + src[(y1 * width + x1) as usize] as u32;
            dst[(y * dst_w + x) as usize] = ((sum + 2) / 4) as u8;
        }
    }

    (dst, dst_w, dst_h)
}

/// Build levels `1..levels` from a level-0 image.
pub fn mip_chain(base: &[u8], width: u32, height: u32, levels: u32) -> Vec<Vec<u8>> {
    let mut chain = Vec::with_capacity(levels.saturating_sub(1) as usize);
    let (mut w, mut h) = (width, height);
    for _ in 1..levels {
        let src = chain.last().map(Vec::as_slice).unwrap_or(base);
        let (next, nw, nh) = downsample(src, w, h);
        chain.push(next);
        w = nw;
        h = nh;
    }
    chain
}

/// Number of mip levels a `width` x `height` texture can actually hold.
pub fn clamp_mip_levels(width: u32, height: u32, requested: u32) -> u32 {
    let max = 32 - width.min(height).max(1).leading_zeros();
    requested.clamp(1, max)
}

/// Copy `src` (src_w x src_h) into the top-left corner of a zeroed
/// dst_w x dst_h image.
pub fn copy_into_larger(src: &[u8], src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Vec<u8> {
    let mut dst = vec![0u8; (dst_w * dst_h) as usize];
    for row in 0..src_h.min(dst_h) {
        let s = (row * src_w) as usize;
        let d = (row * dst_w) as usize;
        let n = src_w.min(dst_w) as usize;
        dst[d..d + n].copy_from_slice(&src[s..s + n]);
    }
    dst
}

// ── CPU texture ─────────────────────────────────────────────────────

/// In-memory atlas texture.
#[derive(Debug, Default)]
pub struct CpuTexture {
    id: Option<TextureId>,
    width: u32,
    height: u32,
    mip_levels: u32,
    /// Level 0 followed by the mip chain.
    levels: Vec<Vec<u8>>,
    uploads: u32,
}

impl CpuTexture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Coverage at a level-0 texel.
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.levels
            .first()
            .and_then(|base| base.get((y * self.width + x) as usize))
            .copied()
            .unwrap_or(0)
    }

    pub fn level(&self, index: usize) -> Option<&[u8]> {
        self.levels.get(index).map(Vec::as_slice)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Number of sub-region uploads since creation.
    pub fn upload_count(&self) -> u32 {
        self.uploads
    }
}

impl AtlasTexture for CpuTexture {
    fn id(&self) -> TextureId {
        self.id.unwrap_or(TextureId(0))
    }

    fn allocate(&mut self, width: u32, height: u32, mip_levels: u32) {
        self.id = Some(TextureId::next());
        self.width = width;
        self.height = height;
        self.mip_levels = clamp_mip_levels(width, height, mip_levels);
        let base = vec![0u8; (width * height) as usize];
        self.levels = std::iter::once(base.clone())
            .chain(mip_chain(&base, width, height, self.mip_levels))
            .collect();
    }

    fn resize(&mut self, width: u32, height: u32) {
        let base = self.levels.first().map(Vec::as_slice).unwrap_or(&[]);
        let grown = copy_into_larger(base, self.width, self.height, width, height);
        self.id = Some(TextureId::next());
        self.width = width;
        self.height = height;
        self.mip_levels = clamp_mip_levels(width, height, self.mip_levels);
        self.levels = vec![grown];
        self.generate_mipmap();
    }

    fn upload(&mut self, x: u32, y: u32, width: u32, height: u32, alpha: &[u8]) {
        let Some(base) = self.levels.first_mut() else {
            return;
        };
        for row in 0..height {
            let s = (row * width) as usize;
            let d = ((y + row) * self.width + x) as usize;
            base[d..d + width as usize].copy_from_slice(&alpha[s..s + width as usize]);
        }
        self.uploads += 1;
    }

    fn generate_mipmap(&mut self) {
        if self.levels.is_empty() {
            return;
        }
        self.levels.truncate(1);
        let chain = mip_chain(&self.levels[0], self.width, self.height, self.mip_levels);
        self.levels.extend(chain);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Factory for [`CpuTexture`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuTextureFactory;

impl TextureFactory for CpuTextureFactory {
    fn create_texture(&self) -> Box<dyn AtlasTexture> {
        Box::new(CpuTexture::new())
    }
}

// ===================================================================
// Tests
// ===================================================================
