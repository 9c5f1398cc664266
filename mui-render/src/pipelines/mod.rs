//! wgpu render pipelines.

pub mod text;

pub use text::{TextPipeline, MAX_GLYPH_INSTANCES};
