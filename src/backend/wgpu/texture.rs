// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::backend::software::texture::{SoftwareTexture, Texture};
use crate::backend::wgpu::{Error, GpuDevice, WgpuPixelFormat};
use crate::pixel_formats::pixel_as_bytes;
use std::fmt::Debug;
use std::sync::{Arc, mpsc};
use wgpu::{Extent3d, TexelCopyBufferInfo, TexelCopyBufferLayout, TexelCopyTextureInfo};

/// Everything a texture may be used for in this backend.
const USAGE: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT
    .union(wgpu::TextureUsages::TEXTURE_BINDING)
    .union(wgpu::TextureUsages::COPY_SRC)
    .union(wgpu::TextureUsages::COPY_DST);

#[derive(Debug)]
struct Inner {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    debug_name: String,
}

/**
A shared handle to a GPU texture.

Clones name the same texture; see [GpuTexture::same_texture].
*/
#[derive(Debug, Clone)]
pub struct GpuTexture {
    inner: Arc<Inner>,
}

impl GpuTexture {
    /// Wraps an existing texture, such as a host's frame.
    ///
    /// The texture needs `RENDER_ATTACHMENT` to be drawn into and `TEXTURE_BINDING` to be drawn from.
    pub fn from_wgpu(texture: wgpu::Texture, debug_name: &str) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            inner: Arc::new(Inner {
                texture,
                view,
                debug_name: debug_name.to_string(),
            }),
        }
    }

    pub(crate) fn descriptor(
        debug_name: &str,
        width: u16,
        height: u16,
        format: wgpu::TextureFormat,
    ) -> wgpu::TextureDescriptor<'_> {
        wgpu::TextureDescriptor {
            label: Some(debug_name),
            size: Extent3d {
                width: width.into(),
                height: height.into(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: USAGE,
            view_formats: &[],
        }
    }

    /// Uploads a CPU texture.
    pub fn from_software<Format: WgpuPixelFormat>(
        device: &GpuDevice,
        software: &SoftwareTexture<Format>,
    ) -> Self {
        let source = software.lock();
        let descriptor = Self::descriptor(
            software.debug_name(),
            source.width(),
            source.height(),
            Format::WGPU_FORMAT,
        );
        let texture = device.device().create_texture(&descriptor);
        device.queue().write_texture(
            TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixel_as_bytes(source.texture_data()),
            TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(source.width() as u32 * Format::BYTES_PER_PIXEL as u32),
                rows_per_image: Some(source.height() as u32),
            },
            descriptor.size,
        );
        Self::from_wgpu(texture, software.debug_name())
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.inner.texture
    }

    pub(crate) fn view(&self) -> &wgpu::TextureView {
        &self.inner.view
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.inner.texture.format()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.inner.texture.width(), self.inner.texture.height())
    }

    pub fn debug_name(&self) -> &str {
        &self.inner.debug_name
    }

    pub fn same_texture(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /**
    Copies the texture back to the CPU.

    Blocks until the GPU has finished every submitted command.
    */
    pub fn read_back<Format: WgpuPixelFormat>(
        &self,
        device: &GpuDevice,
    ) -> Result<Texture<Format>, Error> {
        if self.format() != Format::WGPU_FORMAT {
            return Err(Error::FormatMismatch {
                expected: Format::WGPU_FORMAT,
                actual: self.format(),
            });
        }
        let (width, height) = self.size();
        if width == 0 || height == 0 {
            return Ok(Texture::new(width as u16, height as u16, Default::default()));
        }
        let bytes_per_pixel = Format::BYTES_PER_PIXEL as u32;
        let bytes_per_row = (width * bytes_per_pixel).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let buffer = device.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("save_and_restore readback"),
            size: bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = device
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("save_and_restore readback"),
            });
        encoder.copy_texture_to_buffer(
            TexelCopyTextureInfo {
                texture: &self.inner.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            TexelCopyBufferInfo {
                buffer: &buffer,
                layout: TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            self.inner.texture.size(),
        );
        device.queue().submit(std::iter::once(encoder.finish()));

        let (sender, receiver) = mpsc::channel();
        buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            //the receiver outlives the poll below
            let _ = sender.send(result);
        });
        device
            .device()
            .poll(wgpu::PollType::Wait)
            .map_err(|e| Error::Readback(e.to_string()))?;
        receiver
            .recv()
            .map_err(|e| Error::Readback(e.to_string()))?
            .map_err(|e| Error::Readback(e.to_string()))?;

        let texture = {
            let mapped = buffer.slice(..).get_mapped_range();
            let row_bytes = (width * bytes_per_pixel) as usize;
            let mut pixels = Vec::with_capacity(width as usize * height as usize);
            for row in mapped.chunks_exact(bytes_per_row as usize) {
                for pixel in row[..row_bytes].chunks_exact(bytes_per_pixel as usize) {
                    //safe because CPixel is ReprC and the chunk is exactly one pixel long
                    pixels.push(unsafe {
                        std::ptr::read_unaligned(pixel.as_ptr() as *const Format::CPixel)
                    });
                }
            }
            Texture::new_with(width as u16, height as u16, |texel| {
                pixels[texel.y as usize * width as usize + texel.x as usize]
            })
        };
        buffer.unmap();
        Ok(texture)
    }
}
