// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Pipeline stages and the per-frame context they run in.

A pipeline drives each of its stages once per frame, in order, on one thread.  A stage
sees the frame through a [FrameContext], which lends it the pipeline's buffer registry,
its frame copier, and the current frame texture for the duration of the call.
*/

pub mod buffer_save;
pub mod config;
pub mod mode;
pub mod transfer;

pub use buffer_save::BufferSave;

use crate::buffers::{BufferId, BufferRegistry, RegistryError};
use crate::copier::{CopyError, FrameCopier};

/**
Everything a stage may touch while drawing one frame.

`input` is the frame produced by the upstream stages.  `output` is where this stage
composites; for stages that draw in place, like [BufferSave], it is the same texture.
*/
#[derive(Debug)]
pub struct FrameContext<'a, R: BufferRegistry, C> {
    pub(crate) registry: &'a mut R,
    pub(crate) copier: &'a mut C,
    pub(crate) input: &'a R::Texture,
    pub(crate) output: &'a R::Texture,
}

impl<'a, R: BufferRegistry, C: FrameCopier<R::Texture>> FrameContext<'a, R, C> {
    /// A context whose stages read and draw into the same `frame`.
    pub fn new(registry: &'a mut R, copier: &'a mut C, frame: &'a R::Texture) -> Self {
        Self {
            registry,
            copier,
            input: frame,
            output: frame,
        }
    }

    /// A context where stages read `input` and draw into `output`.
    pub fn with_output(
        registry: &'a mut R,
        copier: &'a mut C,
        input: &'a R::Texture,
        output: &'a R::Texture,
    ) -> Self {
        Self {
            registry,
            copier,
            input,
            output,
        }
    }

    pub fn input(&self) -> &R::Texture {
        self.input
    }

    pub fn output(&self) -> &R::Texture {
        self.output
    }

    pub fn registry(&self) -> &R {
        self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        self.registry
    }
}

/**
A unit of per-frame work in a pipeline.

The lifecycle is: [Stage::configure] at least once, [Stage::render_frame] any number of
times (interleaved with further `configure` calls), then [Stage::release].
*/
pub trait Stage<R: BufferRegistry, C: FrameCopier<R::Texture>> {
    /// The host-facing options this stage is configured with.
    type Options;

    /**
    Applies new options.

    Takes effect on the next frame.  If the options are invalid the stage is unchanged.
    */
    fn configure(&mut self, options: &Self::Options, registry: &mut R)
    -> Result<(), ConfigureError>;

    /// Draws one frame.
    fn render_frame(&mut self, frame: &mut FrameContext<'_, R, C>) -> Result<(), FrameError>;

    /// Gives back anything the stage holds in `registry`.  Releasing twice is harmless.
    fn release(&mut self, registry: &mut R);
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigureError {
    #[error("Invalid options: {0}")]
    Invalid(#[from] config::ConfigError),
    #[error("Can't set up buffer: {0}")]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum FrameError {
    #[error("Stage has no buffer; configure it successfully before drawing")]
    Inert,
    #[error("Buffer {id} is not registered")]
    MissingBuffer { id: BufferId },
    #[error("Frame copy failed: {0}")]
    Copy(#[from] CopyError),
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}
