//! Tunables for atlases and the glyph manager.

/// Font atlas sizing and padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasConfig {
    /// Side of the square texture allocated on first use. Must be a power of two.
    pub initial_size: u32,
    /// Largest width or height an atlas may grow to.
    pub max_size: u32,
    /// Transparent padding kept around every glyph, in pixels.
    pub border: u32,
    /// Mip levels allocated for each atlas texture.
    pub mip_levels: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            initial_size: 256,
            max_size: 16384,
            border: 1,
            mip_levels: 4,
        }
    }
}

/// Glyph manager configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphConfig {
    /// Settings shared by every per-font atlas.
    pub atlas: AtlasConfig,
    /// Side of the scratch raster image after construction or reload.
    pub scratch_size: u32,
    /// Threshold coverage at 50% instead of keeping anti-aliased alpha.
    /// Pixel fonts look crisper this way.
    pub bitmap_like: bool,
    /// Number of shaped pieces kept in the layout cache.
    pub layout_cache_size: usize,
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self {
            atlas: AtlasConfig::default(),
            scratch_size: 64,
            bitmap_like: false,
            layout_cache_size: 2048,
        }
    }
}
