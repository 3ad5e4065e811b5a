// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::backend::wgpu::{GpuDevice, GpuTexture, WgpuPixelFormat};
use crate::buffers::{BufferId, BufferRegistry, BufferTable, RegistryError};
use crate::pixel_formats::RGBA8UNorm;

/**
Buffer registry for the GPU backend.

Allocation failures are caught with wgpu error scopes: running out of memory becomes
[RegistryError::ResourceExhausted], anything else the device rejects becomes
[RegistryError::Device].
*/
#[derive(Debug)]
pub struct GpuBuffers {
    device: GpuDevice,
    table: BufferTable<GpuTexture>,
    format: wgpu::TextureFormat,
    bytes_per_pixel: u8,
    width: u16,
    height: u16,
}

impl GpuBuffers {
    /// A registry of [RGBA8UNorm] buffers.
    pub fn new(device: &GpuDevice, width: u16, height: u16) -> Self {
        Self::with_format(RGBA8UNorm, device, width, height)
    }

    pub fn with_format<Format: WgpuPixelFormat>(
        _format: Format,
        device: &GpuDevice,
        width: u16,
        height: u16,
    ) -> Self {
        Self {
            device: device.clone(),
            table: BufferTable::new(),
            format: Format::WGPU_FORMAT,
            bytes_per_pixel: Format::BYTES_PER_PIXEL,
            width,
            height,
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

fn allocate(
    device: &GpuDevice,
    id: &BufferId,
    format: wgpu::TextureFormat,
    bytes_per_pixel: u8,
    width: u16,
    height: u16,
) -> Result<GpuTexture, RegistryError> {
    let descriptor = GpuTexture::descriptor(id.as_str(), width, height, format);
    let ((texture, validation), out_of_memory) =
        device.scoped(wgpu::ErrorFilter::OutOfMemory, |_| {
            device.scoped(wgpu::ErrorFilter::Validation, |device| {
                device.create_texture(&descriptor)
            })
        });
    if let Some(e) = out_of_memory {
        logwise::error_sync!(
            "out of memory allocating {id}: {err}",
            id = logwise::privacy::LogIt(id),
            err = logwise::privacy::LogIt(&e)
        );
        return Err(RegistryError::ResourceExhausted {
            id: id.clone(),
            bytes: width as usize * height as usize * bytes_per_pixel as usize,
        });
    }
    if let Some(e) = validation {
        return Err(RegistryError::Device {
            id: id.clone(),
            message: e.to_string(),
        });
    }
    Ok(GpuTexture::from_wgpu(texture, id.as_str()))
}

impl BufferRegistry for GpuBuffers {
    type Texture = GpuTexture;

    fn create(&mut self, id: &BufferId) -> Result<(), RegistryError> {
        let Self {
            device,
            table,
            format,
            bytes_per_pixel,
            width,
            height,
        } = self;
        table.acquire(id, || {
            allocate(device, id, *format, *bytes_per_pixel, *width, *height)
        })?;
        Ok(())
    }

    fn remove(&mut self, id: &BufferId) {
        //outstanding handles keep the texture alive until they drop
        self.table.release(id);
    }

    fn get(&self, id: &BufferId) -> Option<Self::Texture> {
        self.table.get(id).cloned()
    }

    fn owners(&self, id: &BufferId) -> usize {
        self.table.owners(id)
    }

    fn set_render_target(&mut self, id: &BufferId) -> Result<Self::Texture, RegistryError> {
        self.table.push_target(id)
    }

    fn restore_render_target(&mut self) {
        self.table.pop_target();
    }

    fn active_render_target(&self) -> Option<&BufferId> {
        self.table.active_target()
    }

    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u16, height: u16) -> Result<(), RegistryError> {
        let Self {
            device,
            table,
            format,
            bytes_per_pixel,
            ..
        } = self;
        table.reallocate_all(|id| allocate(device, id, *format, *bytes_per_pixel, width, height))?;
        self.width = width;
        self.height = height;
        logwise::info_sync!(
            "gpu buffers resized to {width}x{height}",
            width = width,
            height = height
        );
        Ok(())
    }
}
