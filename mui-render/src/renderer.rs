//! High-level renderer that turns a recorded [`DrawList`] into GPU draws.
//!
//! `prepare()` resolves pending text, refreshes glyph UVs after atlas
//! growth, keeps one bind group per live atlas texture and uploads the
//! instance buffer. `render_to_texture()` then issues one instanced draw per
//! run of consecutive ops that share a texture.

use std::ops::Range;

use mui_text::{DrawList, DrawOp, GlyphManager, TextError, TextureId};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use wgpu::{
    BindGroup, Color, CommandEncoderDescriptor, LoadOp, Operations, RenderPassColorAttachment,
    RenderPassDescriptor, StoreOp, TextureView,
};

use crate::context::{GpuContext, GpuError};
use crate::pipelines::TextPipeline;
use crate::texture::GpuAtlasTexture;
use crate::vertex::{CameraUniform, GlyphInstance};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Text error: {0}")]
    Text(#[from] TextError),
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
}

/// Frame statistics returned after each prepare and render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Number of glyph quads drawn.
    pub glyph_count: u32,
    /// Number of solid rectangles drawn.
    pub rect_count: u32,
    /// Number of draw calls.
    pub draw_calls: u32,
}

/// A run of instances sharing one texture. `None` samples the white texel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    pub texture: Option<TextureId>,
    pub instances: Range<u32>,
}

/// Renderer for glyph atlases and layout draw lists.
///
/// # Usage
///
/// ```ignore
/// let mut renderer = TextRenderer::new(&gpu);
/// let stats = renderer.prepare(&gpu, &mut list, &mut glyphs, &camera)?;
/// renderer.render_to_texture(&gpu, &view);
/// ```
pub struct TextRenderer {
    pipeline: TextPipeline,
    bind_groups: FxHashMap<TextureId, BindGroup>,
    batches: Vec<Batch>,
    instances: Vec<GlyphInstance>,
    stats: FrameStats,
    clear_color: Color,
}

impl TextRenderer {
    /// Create a new renderer for the given GPU context.
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            pipeline: TextPipeline::new(&gpu.device, &gpu.queue, gpu.target_format),
            bind_groups: FxHashMap::default(),
            batches: Vec::new(),
            instances: Vec::new(),
            stats: FrameStats::default(),
            clear_color: Color::TRANSPARENT,
        }
    }

    /// Set the background clear color.
    pub fn set_clear_color(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.clear_color = Color { r, g, b, a };
    }

    /// Upload a frame's draw list.
    ///
    /// Text ops are shaped and rasterized first, so atlases may grow during
    /// this call; quads are refreshed afterwards and always sample the
    /// current textures. Glyphs whose atlas is not GPU-backed are skipped.
    pub fn prepare(
        &mut self,
        gpu: &GpuContext,
        list: &mut DrawList,
        glyphs: &mut GlyphManager,
        camera: &CameraUniform,
    ) -> Result<FrameStats, RenderError> {
        list.resolve_text(glyphs)?;
        list.refresh(glyphs);

        // ── Bind groups for live atlas textures ─────────────────
        let mut live = FxHashSet::default();
        let pipeline = &self.pipeline;
        for (_, atlas) in glyphs.atlases() {
            let Some(texture) = atlas.texture().as_any().downcast_ref::<GpuAtlasTexture>() else {
                continue;
            };
            let Some(view) = texture.view() else {
                continue;
            };
            let id = atlas.texture_id();
            live.insert(id);
            self.bind_groups
                .entry(id)
                .or_insert_with(|| pipeline.atlas_bind_group(&gpu.device, view));
        }
        let before = self.bind_groups.len();
        self.bind_groups.retain(|id, _| live.contains(id));
        if self.bind_groups.len() != before {
            log::debug!("Dropped {} stale atlas bind groups", before - self.bind_groups.len());
        }

        // ── Instances ───────────────────────────────────────────
        let (stats, batches) = build_batches(list.ops(), &mut self.instances, |id| {
            self.bind_groups.contains_key(&id)
        });
        self.batches = batches;

        let uploaded = self.pipeline.upload_instances(&gpu.queue, &self.instances);
        self.pipeline.upload_camera(&gpu.queue, camera);

        self.stats = FrameStats {
            draw_calls: self
                .batches
                .iter()
                .filter(|b| b.instances.start < uploaded)
                .count() as u32,
            ..stats
        };
        Ok(self.stats)
    }

    /// Render the prepared frame into an off-screen texture view.
    pub fn render_to_texture(&self, gpu: &GpuContext, target_view: &TextureView) -> FrameStats {
        let mut encoder = gpu.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("mui_text_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("mui_text_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: target_view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(self.clear_color),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if !self.batches.is_empty() {
                self.pipeline.begin(&mut pass);
            }
            for batch in &self.batches {
                let bind_group = match batch.texture {
                    Some(id) => match self.bind_groups.get(&id) {
                        Some(group) => group,
                        None => continue,
                    },
                    None => self.pipeline.white_bind_group(),
                };
                self.pipeline.draw_batch(&mut pass, bind_group, batch.instances.clone());
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        self.stats
    }

    /// Batches of the last prepared frame.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Number of atlas textures with a live bind group.
    pub fn bound_texture_count(&self) -> usize {
        self.bind_groups.len()
    }
}

/// Convert draw ops to instances, merging consecutive ops that sample the
/// same texture. Glyphs for which `has_texture` is false are skipped.
pub fn build_batches(
    ops: &[DrawOp],
    instances: &mut Vec<GlyphInstance>,
    mut has_texture: impl FnMut(TextureId) -> bool,
) -> (FrameStats, Vec<Batch>) {
    instances.clear();
    let mut batches: Vec<Batch> = Vec::new();
    let mut stats = FrameStats::default();

    for op in ops {
        let (texture, instance) = match op {
            DrawOp::Rect { left, top, right, bottom, color } => {
                stats.rect_count += 1;
                (None, GlyphInstance::rect(*left, *top, *right, *bottom, *color))
            }
            DrawOp::Glyph(quad) => {
                if !has_texture(quad.glyph.texture) {
                    continue;
                }
                stats.glyph_count += 1;
                (Some(quad.glyph.texture), GlyphInstance::glyph(quad))
            }
            DrawOp::Text { .. } => continue,
        };

        let index = instances.len() as u32;
        instances.push(instance);
        match batches.last_mut() {
            Some(last) if last.texture == texture => last.instances.end = index + 1,
            _ => batches.push(Batch {
                texture,
                instances: index..index + 1,
            }),
        }
    }

    stats.draw_calls = batches.len() as u32;
    (stats, batches)
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mui_text::{
        Canvas, FaceId, FixedAdvanceBackend, Font, GlyphCode, GlyphConfig, GlyphQuad, TextPaint,
        TexturedGlyph,
    };

    use crate::texture::GpuTextureFactory;

    fn quad(texture: u64, x: f32) -> DrawOp {
        DrawOp::Glyph(GlyphQuad {
            font: Font::new(FaceId(0), 16),
            code: GlyphCode(65),
            glyph: TexturedGlyph {
                texture: TextureId(texture),
                offset_x: 0,
                offset_y: -13,
                width: 7,
                height: 13,
                u1: 0.0,
                v1: 0.0,
                u2: 0.1,
                v2: 0.1,
            },
            x,
            y: 0.0,
            color: 0xFFFF_FFFF,
        })
    }

    fn rect() -> DrawOp {
        DrawOp::Rect {
            left: 0.0,
            top: 0.0,
            right: 10.0,
            bottom: 10.0,
            color: 0xFF00_0000,
        }
    }

    #[test]
    fn test_consecutive_ops_share_a_batch() {
        let ops = vec![rect(), quad(1, 0.0), quad(1, 8.0), quad(2, 16.0), quad(1, 24.0), rect()];
        let mut instances = Vec::new();
        let (stats, batches) = build_batches(&ops, &mut instances, |_| true);

        assert_eq!(instances.len(), 6);
        assert_eq!(stats.glyph_count, 4);
        assert_eq!(stats.rect_count, 2);
        assert_eq!(stats.draw_calls, 5);
        assert_eq!(
            batches,
            vec![
                Batch { texture: None, instances: 0..1 },
                Batch { texture: Some(TextureId(1)), instances: 1..3 },
                Batch { texture: Some(TextureId(2)), instances: 3..4 },
                Batch { texture: Some(TextureId(1)), instances: 4..5 },
                Batch { texture: None, instances: 5..6 },
            ]
        );
    }

    #[test]
    fn test_glyphs_without_texture_are_skipped() {
        let ops = vec![quad(1, 0.0), quad(3, 8.0), quad(1, 16.0)];
        let mut instances = Vec::new();
        let (stats, batches) = build_batches(&ops, &mut instances, |id| id == TextureId(1));

        assert_eq!(stats.glyph_count, 2);
        assert_eq!(instances[1].position, [16.0, 0.0]);
        assert_eq!(batches, vec![Batch { texture: Some(TextureId(1)), instances: 0..2 }]);
    }

    #[test]
    fn test_empty_list_has_no_batches() {
        let mut instances = vec![GlyphInstance::rect(0.0, 0.0, 1.0, 1.0, 0)];
        let (stats, batches) = build_batches(&[], &mut instances, |_| true);
        assert!(instances.is_empty());
        assert!(batches.is_empty());
        assert_eq!(stats, FrameStats::default());
    }

    #[test]
    fn test_render_text_headless() {
        let Ok(gpu) = pollster::block_on(GpuContext::new_headless()) else {
            return;
        };
        let mut glyphs = GlyphManager::new(
            Box::new(FixedAdvanceBackend::new()),
            Box::new(GpuTextureFactory::new(&gpu)),
            GlyphConfig::default(),
        );
        let mut renderer = TextRenderer::new(&gpu);
        let mut list = DrawList::new();
        list.draw_text("Hi", 0.0, 13.0, &TextPaint::default());

        let camera = CameraUniform::identity(64.0, 32.0);
        let stats = renderer.prepare(&gpu, &mut list, &mut glyphs, &camera).unwrap();
        assert_eq!(stats.glyph_count, 2);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(renderer.bound_texture_count(), 1);

        let (target, view) = gpu.create_target(64, 32);
        renderer.render_to_texture(&gpu, &view);
        let pixels = gpu.read_target(&target).unwrap();

        let at = |x: usize, y: usize| pixels[(y * 64 + x) * 4];
        assert!(at(3, 6) > 200, "glyph interior should be lit");
        assert_eq!(at(60, 30), 0, "background should stay clear");
    }

    #[test]
    fn test_reload_drops_stale_bind_groups_headless() {
        let Ok(gpu) = pollster::block_on(GpuContext::new_headless()) else {
            return;
        };
        let mut glyphs = GlyphManager::new(
            Box::new(FixedAdvanceBackend::new()),
            Box::new(GpuTextureFactory::new(&gpu)),
            GlyphConfig::default(),
        );
        let mut renderer = TextRenderer::new(&gpu);
        let camera = CameraUniform::identity(64.0, 32.0);

        let mut list = DrawList::new();
        list.draw_text("a", 0.0, 13.0, &TextPaint::default());
        renderer.prepare(&gpu, &mut list, &mut glyphs, &camera).unwrap();
        assert_eq!(renderer.bound_texture_count(), 1);

        glyphs.reload();
        let stats = renderer.prepare(&gpu, &mut list, &mut glyphs, &camera).unwrap();
        assert_eq!(renderer.bound_texture_count(), 0);
        assert_eq!(stats.glyph_count, 0);
        assert!(renderer.batches().is_empty());
    }
}
