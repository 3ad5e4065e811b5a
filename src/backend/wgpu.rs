// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A GPU backend built on wgpu.

Buffers are render-attachment textures; copies are full-screen draws with the blend
state for the requested [crate::blend::BlendMode].
*/

mod buffers;
mod copier;
mod device;
mod pixel_format;
mod texture;

pub use buffers::GpuBuffers;
pub use copier::GpuCopier;
pub use device::GpuDevice;
pub use pixel_format::WgpuPixelFormat;
pub use texture::GpuTexture;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("No such adapter")]
    NoSuchAdapter,
    #[error("Can't create device: {0}")]
    RequestDevice(#[from] ::wgpu::RequestDeviceError),
    #[error("Texture format {actual:?} doesn't match {expected:?}")]
    FormatMismatch {
        expected: ::wgpu::TextureFormat,
        actual: ::wgpu::TextureFormat,
    },
    #[error("Readback failed: {0}")]
    Readback(String),
}
