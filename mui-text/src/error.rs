//! Error types for the text pipeline.

use thiserror::Error;

/// Errors raised while shaping, rasterizing, packing, or laying out text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    /// The atlas would have to grow past its configured maximum.
    #[error("Font atlas exhausted: cannot grow {width}x{height} beyond {max}px")]
    AtlasExhausted { width: u32, height: u32, max: u32 },

    /// The glyph (plus border) is larger than the largest allowed atlas.
    #[error("Glyph {width}x{height} can never fit in an atlas of at most {max}px")]
    GlyphTooLarge { width: u32, height: u32, max: u32 },

    /// Layout widths must be non-negative.
    #[error("Layout width must be non-negative, got {0}")]
    NegativeWidth(i32),

    /// The font backend failed to shape, measure, or rasterize.
    #[error("Font backend error: {0}")]
    Backend(String),
}
