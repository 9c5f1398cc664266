//! GPU vertex and instance data types for the glyph renderer.
//!
//! All types derive `bytemuck::Pod` + `Zeroable` for zero-copy upload
//! to GPU buffers.

use bytemuck::{Pod, Zeroable};
use mui_text::{GlyphQuad, TexturedGlyph};
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

// ───────────────────────────────────────────────────────────────────
// Vertex (unit quad)
// ───────────────────────────────────────────────────────────────────

/// A single vertex of the unit quad (0,0)→(1,1), shared by all instances.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct QuadVertex {
    /// Position in [0, 1] space.
    pub position: [f32; 2],
}

impl QuadVertex {
    pub const VERTICES: [QuadVertex; 4] = [
        QuadVertex { position: [0.0, 0.0] }, // top-left
        QuadVertex { position: [1.0, 0.0] }, // top-right
        QuadVertex { position: [0.0, 1.0] }, // bottom-left
        QuadVertex { position: [1.0, 1.0] }, // bottom-right
    ];

    pub const INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

    pub fn layout() -> VertexBufferLayout<'static> {
        static ATTRS: &[VertexAttribute] = &[
            // location(0) = position
            VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: VertexFormat::Float32x2,
            },
        ];
        VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }
}

// ───────────────────────────────────────────────────────────────────
// Instance data
// ───────────────────────────────────────────────────────────────────

/// One textured quad: a glyph sampled from its atlas, or a solid rectangle
/// sampled from a white texel.
///
/// 48 bytes per instance.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GlyphInstance {
    /// Screen-space top-left in pixels.
    pub position: [f32; 2],
    /// Width and height in pixels.
    pub size: [f32; 2],
    /// Atlas UV top-left.
    pub uv_min: [f32; 2],
    /// Atlas UV bottom-right.
    pub uv_max: [f32; 2],
    /// Straight-alpha RGBA, each channel in [0.0, 1.0].
    pub color: [f32; 4],
}

impl GlyphInstance {
    pub fn glyph(quad: &GlyphQuad) -> Self {
        let TexturedGlyph { width, height, u1, v1, u2, v2, .. } = quad.glyph;
        Self {
            position: [quad.x, quad.y],
            size: [width as f32, height as f32],
            uv_min: [u1, v1],
            uv_max: [u2, v2],
            color: argb_to_rgba(quad.color),
        }
    }

    pub fn rect(left: f32, top: f32, right: f32, bottom: f32, argb: u32) -> Self {
        Self {
            position: [left, top],
            size: [right - left, bottom - top],
            uv_min: [0.0, 0.0],
            uv_max: [1.0, 1.0],
            color: argb_to_rgba(argb),
        }
    }

    pub fn layout() -> VertexBufferLayout<'static> {
        static ATTRS: &[VertexAttribute] = &[
            // location(1) = position
            VertexAttribute {
                offset: 0,
                shader_location: 1,
                format: VertexFormat::Float32x2,
            },
            // location(2) = size
            VertexAttribute {
                offset: 8,
                shader_location: 2,
                format: VertexFormat::Float32x2,
            },
            // location(3) = uv_min
            VertexAttribute {
                offset: 16,
                shader_location: 3,
                format: VertexFormat::Float32x2,
            },
            // location(4) = uv_max
            VertexAttribute {
                offset: 24,
                shader_location: 4,
                format: VertexFormat::Float32x2,
            },
            // location(5) = color
            VertexAttribute {
                offset: 32,
                shader_location: 5,
                format: VertexFormat::Float32x4,
            },
        ];
        VertexBufferLayout {
            array_stride: std::mem::size_of::<GlyphInstance>() as BufferAddress,
            step_mode: VertexStepMode::Instance,
            attributes: ATTRS,
        }
    }
}

/// ARGB to RGBA floats.
pub fn argb_to_rgba(argb: u32) -> [f32; 4] {
    [
        ((argb >> 16) & 0xFF) as f32 / 255.0,
        ((argb >> 8) & 0xFF) as f32 / 255.0,
        (argb & 0xFF) as f32 / 255.0,
        (argb >> 24) as f32 / 255.0,
    ]
}

// ───────────────────────────────────────────────────────────────────
// Camera uniform
// ───────────────────────────────────────────────────────────────────

/// Pixel-to-NDC projection, sent once per frame. 64 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    /// 4×4 orthographic projection matrix (column-major).
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    /// Orthographic projection for a `width × height` viewport with pan and
    /// zoom. (0,0) maps to the top-left corner; y grows downward.
    pub fn orthographic(width: f32, height: f32, pan_x: f32, pan_y: f32, zoom: f32) -> Self {
        let sx = 2.0 * zoom / width;
        let sy = -2.0 * zoom / height;
        let tx = -pan_x * sx - 1.0;
        let ty = -pan_y * sy + 1.0;

        Self {
            view_proj: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [tx, ty, 0.0, 1.0],
            ],
        }
    }

    /// 1px = 1 unit, no pan, no zoom.
    pub fn identity(width: f32, height: f32) -> Self {
        Self::orthographic(width, height, 0.0, 0.0, 1.0)
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mui_text::{FaceId, Font, GlyphCode, TextureId};

    fn project(cam: &CameraUniform, x: f32, y: f32) -> (f32, f32) {
        let vp = cam.view_proj;
        (
            x * vp[0][0] + y * vp[1][0] + vp[3][0],
            x * vp[0][1] + y * vp[1][1] + vp[3][1],
        )
    }

    #[test]
    fn test_pod_sizes() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 8);
        assert_eq!(std::mem::size_of::<GlyphInstance>(), 48);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
    }

    #[test]
    fn test_instance_layout_locations() {
        let layout = GlyphInstance::layout();
        let locations: Vec<u32> = layout.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![1, 2, 3, 4, 5]);
        assert_eq!(layout.step_mode, VertexStepMode::Instance);
        assert_eq!(QuadVertex::layout().step_mode, VertexStepMode::Vertex);
    }

    #[test]
    fn test_glyph_instance_from_quad() {
        let quad = GlyphQuad {
            font: Font::new(FaceId(0), 16),
            code: GlyphCode(65),
            glyph: TexturedGlyph {
                texture: TextureId(7),
                offset_x: 0,
                offset_y: -13,
                width: 7,
                height: 13,
                u1: 0.25,
                v1: 0.5,
                u2: 0.5,
                v2: 0.75,
            },
            x: 10.0,
            y: 20.0,
            color: 0x80FF0000,
        };
        let inst = GlyphInstance::glyph(&quad);
        assert_eq!(inst.position, [10.0, 20.0]);
        assert_eq!(inst.size, [7.0, 13.0]);
        assert_eq!(inst.uv_min, [0.25, 0.5]);
        assert_eq!(inst.uv_max, [0.5, 0.75]);
        assert_eq!(inst.color[0], 1.0);
        assert!((inst.color[3] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_rect_instance_covers_white_texel() {
        let inst = GlyphInstance::rect(5.0, 6.0, 105.0, 23.0, 0xFF00FF00);
        assert_eq!(inst.size, [100.0, 17.0]);
        assert_eq!(inst.uv_min, [0.0, 0.0]);
        assert_eq!(inst.uv_max, [1.0, 1.0]);
        assert_eq!(inst.color, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_camera_identity_corners() {
        let cam = CameraUniform::identity(800.0, 600.0);
        let (x, y) = project(&cam, 0.0, 0.0);
        assert!((x + 1.0).abs() < 1e-5 && (y - 1.0).abs() < 1e-5);
        let (x, y) = project(&cam, 800.0, 600.0);
        assert!((x - 1.0).abs() < 1e-5 && (y + 1.0).abs() < 1e-5);
        let (x, y) = project(&cam, 400.0, 300.0);
        assert!(x.abs() < 1e-5 && y.abs() < 1e-5);
    }

    #[test]
    fn test_camera_pan_and_zoom() {
        let cam = CameraUniform::orthographic(800.0, 600.0, 100.0, 50.0, 2.0);
        let (x, y) = project(&cam, 100.0, 50.0);
        assert!((x + 1.0).abs() < 1e-5 && (y - 1.0).abs() < 1e-5);
        let (x, y) = project(&cam, 500.0, 350.0);
        assert!((x - 1.0).abs() < 1e-5 && (y + 1.0).abs() < 1e-5);
    }
}
