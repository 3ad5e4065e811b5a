// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Concrete buffer registries and frame copiers.

Each backend provides a texture handle type, a [crate::buffers::BufferRegistry] that
allocates those textures, and a [crate::copier::FrameCopier] that draws between them.
*/

pub mod software;
#[cfg(feature = "backend_wgpu")]
pub mod wgpu;
