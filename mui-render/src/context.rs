//! GPU context — owns the `wgpu::Device` and `Queue` shared by atlas
//! textures and the text renderer.
//!
//! Rendering is headless: frames go to off-screen targets created with
//! [`GpuContext::create_target`] and can be read back with
//! [`GpuContext::read_target`]. Device and queue are reference counted so
//! that atlas textures can upload on their own.

use std::sync::{mpsc, Arc};

use thiserror::Error;
use wgpu::{
    Adapter, Device, DeviceDescriptor, Extent3d, Instance, InstanceDescriptor, Queue,
    RequestAdapterOptions, Texture, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages, TextureView,
};

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("Failed to read back target: {0}")]
    Readback(String),
}

/// Core GPU state shared by all rendering subsystems.
pub struct GpuContext {
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
    pub adapter: Adapter,
    /// Format of targets made by [`create_target`](Self::create_target).
    pub target_format: TextureFormat,
}

impl GpuContext {
    /// Create a headless context.
    pub async fn new_headless() -> Result<Self, GpuError> {
        let instance = Instance::new(&InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("mui-headless"),
                    ..Default::default()
                },
                None,
            )
            .await?;

        let info = adapter.get_info();
        log::info!("GPU context ready: {} ({:?})", info.name, info.backend);

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter,
            target_format: TextureFormat::Rgba8Unorm,
        })
    }

    /// Create an off-screen render target that can be copied back to the CPU.
    pub fn create_target(&self, width: u32, height: u32) -> (Texture, TextureView) {
        let texture = self.device.create_texture(&TextureDescriptor {
            label: Some("mui_offscreen_target"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: self.target_format,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Copy an RGBA8 target back to tightly packed rows.
    pub fn read_target(&self, texture: &Texture) -> Result<Vec<u8>, GpuError> {
        let (width, height) = (texture.width(), texture.height());
        let unpadded = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mui_readback"),
            size: (padded * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("mui_readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| GpuError::Readback(e.to_string()))?
            .map_err(|e| GpuError::Readback(e.to_string()))?;

        let mapped = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded * height) as usize);
        for row in mapped.chunks(padded as usize) {
            pixels.extend_from_slice(&row[..unpadded as usize]);
        }
        drop(mapped);
        buffer.unmap();
        Ok(pixels)
    }
}

// ===================================================================
// Tests
// ===================================================================
