//! GPU atlas textures — single-channel `R8Unorm` textures with a mip chain.
//!
//! A CPU shadow of level 0 is kept so that growth can copy old texels into
//! the new texture and so that mips can be rebuilt with the shared box
//! filter from `mui_text::texture`. Glyph uploads write only the touched
//! sub-region of level 0.

use std::any::Any;
use std::sync::Arc;

use mui_text::texture::{clamp_mip_levels, copy_into_larger, mip_chain};
use mui_text::{AtlasTexture, TextureFactory, TextureId};
use wgpu::{
    Device, Extent3d, Origin3d, Queue, Texture, TextureAspect, TextureDescriptor,
    TextureDimension, TextureFormat, TextureUsages, TextureView,
};

use crate::context::GpuContext;

/// Atlas storage backed by a `wgpu::Texture`.
pub struct GpuAtlasTexture {
    device: Arc<Device>,
    queue: Arc<Queue>,
    id: Option<TextureId>,
    texture: Option<Texture>,
    view: Option<TextureView>,
    width: u32,
    height: u32,
    mip_levels: u32,
    /// Level 0, row-major.
    shadow: Vec<u8>,
}

impl GpuAtlasTexture {
    pub fn new(device: Arc<Device>, queue: Arc<Queue>) -> Self {
        Self {
            device,
            queue,
            id: None,
            texture: None,
            view: None,
            width: 0,
            height: 0,
            mip_levels: 1,
            shadow: Vec::new(),
        }
    }

    /// View over every mip level; `None` before allocation.
    pub fn view(&self) -> Option<&TextureView> {
        self.view.as_ref()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mip_level_count(&self) -> u32 {
        self.mip_levels
    }

    /// Level-0 coverage as last uploaded.
    pub fn shadow(&self) -> &[u8] {
        &self.shadow
    }

    fn create(&mut self, width: u32, height: u32) {
        let texture = self.device.create_texture(&TextureDescriptor {
            label: Some("glyph_atlas"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: self.mip_levels,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::R8Unorm,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.texture = Some(texture);
        self.id = Some(TextureId::next());
        self.width = width;
        self.height = height;
    }

    fn write_level(&self, level: u32, x: u32, y: u32, width: u32, height: u32, data: &[u8]) {
        let Some(texture) = &self.texture else {
            return;
        };
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: level,
                origin: Origin3d { x, y, z: 0 },
                aspect: TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width),
                rows_per_image: Some(height),
            },
            Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }
}

impl AtlasTexture for GpuAtlasTexture {
    fn id(&self) -> TextureId {
        self.id.unwrap_or(TextureId(0))
    }

    fn allocate(&mut self, width: u32, height: u32, mip_levels: u32) {
        self.mip_levels = clamp_mip_levels(width, height, mip_levels);
        self.create(width, height);
        self.shadow = vec![0u8; (width * height) as usize];
        // New textures are not guaranteed to be zeroed on every backend.
        self.write_level(0, 0, 0, width, height, &self.shadow);
        self.generate_mipmap();
        log::debug!(
            "GPU atlas texture {:?} allocated: {}x{}, {} mips",
            self.id(),
            width,
            height,
            self.mip_levels
        );
    }

    fn resize(&mut self, width: u32, height: u32) {
        let grown = copy_into_larger(&self.shadow, self.width, self.height, width, height);
        self.mip_levels = clamp_mip_levels(width, height, self.mip_levels);
        self.create(width, height);
        self.shadow = grown;
        self.write_level(0, 0, 0, width, height, &self.shadow);
        self.generate_mipmap();
        log::debug!("GPU atlas texture resized to {}x{} as {:?}", width, height, self.id());
    }

    fn upload(&mut self, x: u32, y: u32, width: u32, height: u32, alpha: &[u8]) {
        if width == 0 || height == 0 || self.shadow.is_empty() {
            return;
        }
        for row in 0..height {
            let s = (row * width) as usize;
            let d = ((y + row) * self.width + x) as usize;
            self.shadow[d..d + width as usize].copy_from_slice(&alpha[s..s + width as usize]);
        }
        self.write_level(0, x, y, width, height, alpha);
    }

    fn generate_mipmap(&mut self) {
        if self.shadow.is_empty() {
            return;
        }
        let chain = mip_chain(&self.shadow, self.width, self.height, self.mip_levels);
        let (mut w, mut h) = (self.width, self.height);
        for (i, level) in chain.iter().enumerate() {
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            self.write_level(i as u32 + 1, 0, 0, w, h, level);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Creates [`GpuAtlasTexture`]s on a shared device.
#[derive(Clone)]
pub struct GpuTextureFactory {
    device: Arc<Device>,
    queue: Arc<Queue>,
}

impl GpuTextureFactory {
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            device: Arc::clone(&gpu.device),
            queue: Arc::clone(&gpu.queue),
        }
    }
}

impl TextureFactory for GpuTextureFactory {
    fn create_texture(&self) -> Box<dyn AtlasTexture> {
        Box::new(GpuAtlasTexture::new(
            Arc::clone(&self.device),
            Arc::clone(&self.queue),
        ))
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn gpu() -> Option<GpuContext> {
        pollster::block_on(GpuContext::new_headless()).ok()
    }

    #[test]
    fn test_allocate_and_upload_headless() {
        let Some(gpu) = gpu() else {
            return;
        };
        let mut texture = GpuTextureFactory::new(&gpu).create_texture();
        assert_eq!(texture.id(), TextureId(0));

        texture.allocate(64, 32, 4);
        let first = texture.id();
        assert_ne!(first, TextureId(0));
        texture.upload(2, 3, 2, 2, &[10, 20, 30, 40]);

        let gpu_tex = texture.as_any().downcast_ref::<GpuAtlasTexture>().unwrap();
        assert_eq!(gpu_tex.size(), (64, 32));
        assert_eq!(gpu_tex.mip_level_count(), 4);
        assert_eq!(gpu_tex.shadow()[3 * 64 + 2], 10);
        assert_eq!(gpu_tex.shadow()[4 * 64 + 3], 40);
        assert!(gpu_tex.view().is_some());
    }

    #[test]
    fn test_resize_keeps_texels_and_changes_id_headless() {
        let Some(gpu) = gpu() else {
            return;
        };
        let mut texture = GpuAtlasTexture::new(Arc::clone(&gpu.device), Arc::clone(&gpu.queue));
        texture.allocate(16, 16, 2);
        texture.upload(15, 15, 1, 1, &[255]);
        let before = texture.id();

        texture.resize(32, 16);
        assert_ne!(texture.id(), before);
        assert_eq!(texture.size(), (32, 16));
        assert_eq!(texture.shadow()[15 * 32 + 15], 255);
        assert_eq!(texture.shadow()[15 * 32 + 16], 0);
    }

    #[test]
    fn test_mip_levels_clamped_to_size_headless() {
        let Some(gpu) = gpu() else {
            return;
        };
        let mut texture = GpuAtlasTexture::new(Arc::clone(&gpu.device), Arc::clone(&gpu.queue));
        texture.allocate(4, 4, 8);
        assert_eq!(texture.mip_level_count(), 3);
    }
}
