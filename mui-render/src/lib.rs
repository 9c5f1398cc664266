//! # mui-render
//!
//! GPU backend for `mui-text`, built on `wgpu`.
//!
//! ## Architecture
//!
//! ```text
//!  Layout::draw(&mut DrawList)          ◀─── mui-text records ops
//!       │
//!       ▼
//!  TextRenderer.prepare()               ◀─── resolve text, refresh UVs,
//!       │                                    bind atlases, upload
//!       ▼
//!  TextRenderer.render_to_texture()     ◀─── one draw per texture batch
//! ```
//!
//! Atlas textures are created through [`GpuTextureFactory`], which plugs
//! into `mui_text::GlyphManager` as its texture factory.
//!
//! ## Crate modules
//!
//! - [`context`] — headless GPU device/queue initialisation and readback
//! - [`texture`] — `R8Unorm` atlas textures with mip chains
//! - [`vertex`] — vertex, instance, and camera data types
//! - [`pipelines`] — the instanced glyph pipeline
//! - [`renderer`] — per-frame batching and draw orchestration

pub mod context;
pub mod pipelines;
pub mod renderer;
pub mod texture;
pub mod vertex;

// Re-exports for convenience
pub use context::{GpuContext, GpuError};
pub use renderer::{Batch, FrameStats, RenderError, TextRenderer};
pub use texture::{GpuAtlasTexture, GpuTextureFactory};
pub use vertex::{CameraUniform, GlyphInstance, QuadVertex};
