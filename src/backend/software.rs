// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A CPU backend.

Always compiled.  It needs no device, which makes it the natural backend for tests and for
hosts that composite on the CPU.
*/

pub mod buffers;
pub mod copier;
pub mod texture;

pub use buffers::SoftwareBuffers;
pub use copier::SoftwareCopier;
pub use texture::SoftwareTexture;
