// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The frame-copy primitive.

use crate::blend::BlendMode;

/**
Copies or composites one texture onto another.

The destination is fully covered; when sizes differ the source is stretched to fit.
A `blend` of `None` replaces the destination outright.
*/
pub trait FrameCopier<T> {
    fn copy(&mut self, destination: &T, blend: Option<BlendMode>, source: &T)
    -> Result<(), CopyError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum CopyError {
    #[error("Source and destination are the same texture")]
    SameTexture,
    #[error("Copy failed: {0}")]
    Backend(String),
}
