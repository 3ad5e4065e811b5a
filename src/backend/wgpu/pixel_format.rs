// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::pixel_formats::RGBA8UNorm;
use crate::pixel_formats::sealed::PixelFormat;

/**
Pixel formats the GPU backend can render into and blend with.

Float formats are left out; blending them needs an optional device feature.
*/
pub trait WgpuPixelFormat: PixelFormat {
    const WGPU_FORMAT: wgpu::TextureFormat;
}

impl WgpuPixelFormat for RGBA8UNorm {
    const WGPU_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
}
