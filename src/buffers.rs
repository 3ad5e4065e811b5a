// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The shared buffer registry.

A pipeline owns one registry.  Every stage in the pipeline that names the same
[BufferId] sees the same texture, which is how otherwise unrelated stages pass frames
to each other.

Entries are reference counted.  [BufferRegistry::create] on an id that already exists
adds an owner rather than allocating, and [BufferRegistry::remove] only frees the
texture once the last owner is gone.  A stage that releases a buffer can therefore
never pull it out from under a sibling that still names it.

The registry also tracks the active render target as a stack of buffer ids; see
[BufferRegistry::set_render_target].
*/

use crate::stage::config::ConfigError;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::{Debug, Display};

/**
Names a slot in the shared buffer registry.

Ids are opaque, non-empty strings.
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(String);

impl BufferId {
    /// The id used when none is configured.
    pub const DEFAULT: &'static str = "buffer1";

    /**
    Creates a buffer id.

    Leading and trailing whitespace is not significant.  Empty ids are rejected.
    */
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyBufferId);
        }
        if trimmed.len() == id.len() {
            Ok(BufferId(id))
        } else {
            Ok(BufferId(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BufferId {
    fn default() -> Self {
        BufferId(Self::DEFAULT.to_string())
    }
}

impl Display for BufferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for BufferId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for BufferId {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BufferId::new(s)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("Not enough texture memory for buffer {id} ({bytes} bytes)")]
    ResourceExhausted { id: BufferId, bytes: usize },
    #[error("No buffer named {id} is registered")]
    Missing { id: BufferId },
    #[error("Can't allocate buffer {id}: {message}")]
    Device { id: BufferId, message: String },
}

/**
A pipeline-scoped mapping from [BufferId] to a texture.

Implementations allocate textures sized to the pipeline's current frame.
*/
pub trait BufferRegistry {
    /// A cheap, cloneable handle to one of the registry's textures.
    type Texture: Clone + Debug;

    /**
    Registers an owner for `id`, allocating its texture if this is the first owner.

    On failure no entry is created and the owner count is unchanged.
    */
    fn create(&mut self, id: &BufferId) -> Result<(), RegistryError>;

    /**
    Drops one owner of `id`, freeing the texture when no owners remain.

    Removing an id that isn't registered is logged and otherwise ignored.
    */
    fn remove(&mut self, id: &BufferId);

    /// Returns a handle to the texture registered under `id`.
    fn get(&self, id: &BufferId) -> Option<Self::Texture>;

    fn contains(&self, id: &BufferId) -> bool {
        self.get(id).is_some()
    }

    /// The number of owners currently registered for `id`; 0 if there is no entry.
    fn owners(&self, id: &BufferId) -> usize;

    /**
    Redirects rendering to the texture registered under `id` and returns it.

    Every successful call must be paired with [Self::restore_render_target].
    Prefer [crate::stage::transfer::RenderTargetScope], which pairs them for you.
    */
    fn set_render_target(&mut self, id: &BufferId) -> Result<Self::Texture, RegistryError>;

    /// Returns rendering to whatever target was active before the last [Self::set_render_target].
    fn restore_render_target(&mut self);

    /// The buffer currently receiving rendering, or `None` when the pipeline's own frame is.
    fn active_render_target(&self) -> Option<&BufferId>;

    /// The size, in pixels, of the textures this registry allocates.
    fn size(&self) -> (u16, u16);

    /**
    Changes the frame size, reallocating every registered texture.

    Texture contents are not preserved.
    */
    fn resize(&mut self, width: u16, height: u16) -> Result<(), RegistryError>;
}

#[derive(Debug)]
struct Entry<T> {
    texture: T,
    owners: usize,
}

/**
Bookkeeping shared by the registry backends: owner counts and the render target stack.

The backend supplies allocation; the table decides when to allocate and free.
*/
#[derive(Debug)]
pub(crate) struct BufferTable<T> {
    entries: HashMap<BufferId, Entry<T>>,
    targets: Vec<BufferId>,
}

impl<T: Clone> BufferTable<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            targets: Vec::new(),
        }
    }

    /// Adds an owner for `id`.  Returns true if `allocate` was called.
    pub(crate) fn acquire(
        &mut self,
        id: &BufferId,
        allocate: impl FnOnce() -> Result<T, RegistryError>,
    ) -> Result<bool, RegistryError> {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.owners += 1;
            logwise::trace_sync!(
                "buffer {id} now has {owners} owners",
                id = logwise::privacy::LogIt(id),
                owners = entry.owners
            );
            return Ok(false);
        }
        let texture = allocate()?;
        self.entries.insert(id.clone(), Entry { texture, owners: 1 });
        logwise::info_sync!("allocated buffer {id}", id = logwise::privacy::LogIt(id));
        Ok(true)
    }

    /// Drops an owner for `id`.  Returns the texture if it was the last owner.
    pub(crate) fn release(&mut self, id: &BufferId) -> Option<T> {
        let Some(entry) = self.entries.get_mut(id) else {
            logwise::warn_sync!(
                "release of unregistered buffer {id}",
                id = logwise::privacy::LogIt(id)
            );
            return None;
        };
        entry.owners -= 1;
        if entry.owners > 0 {
            logwise::trace_sync!(
                "buffer {id} now has {owners} owners",
                id = logwise::privacy::LogIt(id),
                owners = entry.owners
            );
            return None;
        }
        if self.targets.contains(id) {
            logwise::warn_sync!(
                "freeing buffer {id} while it is a render target",
                id = logwise::privacy::LogIt(id)
            );
        }
        logwise::info_sync!("freed buffer {id}", id = logwise::privacy::LogIt(id));
        self.entries.remove(id).map(|e| e.texture)
    }

    pub(crate) fn get(&self, id: &BufferId) -> Option<&T> {
        self.entries.get(id).map(|e| &e.texture)
    }

    pub(crate) fn owners(&self, id: &BufferId) -> usize {
        self.entries.get(id).map_or(0, |e| e.owners)
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = &BufferId> {
        self.entries.keys()
    }

    /// Number of allocated textures.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn push_target(&mut self, id: &BufferId) -> Result<T, RegistryError> {
        let texture = self
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::Missing { id: id.clone() })?;
        self.targets.push(id.clone());
        Ok(texture)
    }

    pub(crate) fn pop_target(&mut self) {
        if self.targets.pop().is_none() {
            logwise::warn_sync!("restore_render_target called with no render target set");
        }
    }

    pub(crate) fn active_target(&self) -> Option<&BufferId> {
        self.targets.last()
    }

    /**
    Replaces every texture with a freshly allocated one, keeping owner counts.

    Either every texture is replaced or none is: if any allocation fails, the table is
    left exactly as it was.
    */
    pub(crate) fn reallocate_all(
        &mut self,
        mut allocate: impl FnMut(&BufferId) -> Result<T, RegistryError>,
    ) -> Result<(), RegistryError> {
        let mut replacements = Vec::with_capacity(self.entries.len());
        for id in self.entries.keys() {
            replacements.push((id.clone(), allocate(id)?));
        }
        for (id, texture) in replacements {
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.texture = texture;
            }
        }
        Ok(())
    }
}
