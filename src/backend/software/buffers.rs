// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! A [BufferRegistry] backed by CPU textures.

use crate::backend::software::texture::SoftwareTexture;
use crate::buffers::{BufferId, BufferRegistry, BufferTable, RegistryError};
use crate::pixel_formats::RGBA8UNorm;
use crate::pixel_formats::sealed::PixelFormat;

/**
Buffer registry for the software backend.

Textures are allocated at the registry's frame size.  An optional memory limit caps the
total bytes of buffer textures alive at once, so hosts (and tests) can see what happens
when allocation fails.
*/
#[derive(Debug)]
pub struct SoftwareBuffers<Format: PixelFormat = RGBA8UNorm> {
    table: BufferTable<SoftwareTexture<Format>>,
    width: u16,
    height: u16,
    memory_limit: Option<usize>,
}

impl SoftwareBuffers {
    /// A registry of [RGBA8UNorm] buffers.
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_format(RGBA8UNorm, width, height)
    }
}

impl<Format: PixelFormat> SoftwareBuffers<Format> {
    /// A registry of buffers in `format`.
    pub fn with_format(_format: Format, width: u16, height: u16) -> Self {
        Self {
            table: BufferTable::new(),
            width,
            height,
            memory_limit: None,
        }
    }

    /// Refuses to hold more than `bytes` of buffer textures.
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    /// Number of distinct buffers currently allocated.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    fn bytes_per_buffer(width: u16, height: u16) -> usize {
        width as usize * height as usize * Format::BYTES_PER_PIXEL as usize
    }

    fn check_budget(
        &self,
        id: &BufferId,
        buffers: usize,
        width: u16,
        height: u16,
    ) -> Result<(), RegistryError> {
        let bytes = Self::bytes_per_buffer(width, height);
        match self.memory_limit {
            Some(limit) if buffers * bytes > limit => {
                logwise::warn_sync!(
                    "software buffer budget exceeded allocating {id}",
                    id = logwise::privacy::LogIt(id)
                );
                Err(RegistryError::ResourceExhausted {
                    id: id.clone(),
                    bytes,
                })
            }
            _ => Ok(()),
        }
    }
}

impl<Format: PixelFormat> BufferRegistry for SoftwareBuffers<Format> {
    type Texture = SoftwareTexture<Format>;

    fn create(&mut self, id: &BufferId) -> Result<(), RegistryError> {
        if self.table.owners(id) == 0 {
            self.check_budget(id, self.table.len() + 1, self.width, self.height)?;
        }
        let (width, height) = (self.width, self.height);
        self.table
            .acquire(id, || Ok(SoftwareTexture::blank(id.as_str(), width, height)))?;
        Ok(())
    }

    fn remove(&mut self, id: &BufferId) {
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
        //refuse the whole batch up front rather than allocating and throwing it away
        if let Some(id) = self.table.ids().next() {
            self.check_budget(id, self.table.len(), width, height)?;
        }
        self.table
            .reallocate_all(|id| Ok(SoftwareTexture::blank(id.as_str(), width, height)))?;
        self.width = width;
        self.height = height;
        logwise::info_sync!(
            "software buffers resized to {width}x{height}",
            width = width,
            height = height
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> BufferId {
        BufferId::new(s).unwrap()
    }

    #[test]
    fn buffers_are_frame_sized() {
        let mut registry = SoftwareBuffers::<RGBA8UNorm>::new(8, 4);
        registry.create(&id("a")).unwrap();
        assert_eq!(registry.get(&id("a")).unwrap().size(), (8, 4));
        registry.resize(2, 2).unwrap();
        assert_eq!(registry.size(), (2, 2));
        assert_eq!(registry.get(&id("a")).unwrap().size(), (2, 2));
        assert_eq!(registry.owners(&id("a")), 1);
    }

    #[test]
    fn memory_limit_exhausts() {
        //room for exactly one 2x2 RGBA8 buffer
        let mut registry = SoftwareBuffers::<RGBA8UNorm>::new(2, 2).with_memory_limit(16);
        registry.create(&id("a")).unwrap();
        //another owner of an existing buffer costs nothing
        registry.create(&id("a")).unwrap();
        assert_eq!(
            registry.create(&id("b")),
            Err(RegistryError::ResourceExhausted { id: id("b"), bytes: 16 })
        );
        assert!(!registry.contains(&id("b")));
        registry.remove(&id("a"));
        registry.remove(&id("a"));
        registry.create(&id("b")).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn get_returns_the_same_texture() {
        let mut registry = SoftwareBuffers::<RGBA8UNorm>::new(2, 2);
        registry.create(&id("a")).unwrap();
        let first = registry.get(&id("a")).unwrap();
        let second = registry.get(&id("a")).unwrap();
        assert!(first.same_texture(&second));
        assert!(registry.get(&id("b")).is_none());
    }
}
