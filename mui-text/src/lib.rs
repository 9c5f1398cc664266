//! # mui-text
//!
//! Text pipeline for ModernUI: shaping, line layout, and per-font glyph
//! atlases that a renderer samples from.
//!
//! ## Architecture
//!
//! ```text
//! LayoutText + TextPaint
//!     │
//!     ▼
//! StaticLayout / BoringLayout ──► TextLine ──► Canvas (DrawList)
//!                                    │              │
//!                                    ▼              ▼
//!                     GlyphManager::layout_piece   DrawOp::Glyph { UV rect }
//!                     GlyphManager::lookup_glyph
//!                                    │
//!                                    ▼
//!            FontBackend (cosmic-text) ──► FontAtlas ──► AtlasTexture
//! ```
//!
//! - **`atlas`** — per-font shelf packer that doubles its texture on demand.
//! - **`manager`** — glyph cache, font metrics, shaped-run LRU.
//! - **`backend`** / **`cosmic`** / **`fixed`** — font loading, shaping and
//!   rasterization.
//! - **`layout`** — lines, alignment, bidi runs, tabs, ellipsis, picking.
//! - **`canvas`** — draw sink and the recording `DrawList`.
//! - **`texture`** — texture abstraction with a CPU implementation and mip
//!   helpers shared by GPU backends.

pub mod atlas;
pub mod backend;
pub mod canvas;
pub mod config;
pub mod cosmic;
pub mod error;
pub mod fixed;
pub mod glyph;
pub mod layout;
pub mod manager;
pub mod paint;
pub mod piece;
pub mod texture;

// Re-exports for ergonomic use.
pub use atlas::FontAtlas;
pub use backend::{FontBackend, ScratchImage, ShapedGlyph, ShapedRun};
pub use canvas::{Canvas, DrawList, DrawOp, GlyphQuad};
pub use config::{AtlasConfig, GlyphConfig};
pub use cosmic::CosmicBackend;
pub use error::TextError;
pub use fixed::FixedAdvanceBackend;
pub use glyph::{FaceId, Font, GlyphCode, GlyphSlot, PixelBounds, TextureId, TexturedGlyph};
pub use layout::{
    is_boring, Alignment, BoringLayout, BoringMetrics, Directions, Layout, LayoutText,
    ParagraphSpan, ParagraphStyle, StaticLayout, TextDirectionHeuristic, TextLine, TruncateAt,
};
pub use manager::GlyphManager;
pub use paint::{FontCollection, FontMetricsInt, FontStyle, TextPaint};
pub use piece::{LayoutCache, LayoutPiece};
pub use texture::{AtlasTexture, CpuTexture, CpuTextureFactory, TextureFactory};
