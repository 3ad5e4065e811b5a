// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The BufferSave stage: saves the current frame into a shared buffer, restores a saved
frame onto the current one, or alternates between the two.
*/

use crate::buffers::{BufferId, BufferRegistry, RegistryError};
use crate::copier::FrameCopier;
use crate::stage::config::{BufferSaveConfig, BufferSaveOptions};
use crate::stage::mode::{Action, ActionResolver, resolve};
use crate::stage::transfer::execute;
use crate::stage::{ConfigureError, FrameContext, FrameError, Stage};

/**
Saves and restores frames through the shared buffer registry.

Each stage holds one registration on the buffer it names.  Stages that name the same
buffer share its texture, so one stage can save a frame that another restores later in
the chain, or on a later frame.

If the stage can't get its buffer (say the registry ran out of texture memory) it becomes
inert: it draws nothing and [Stage::render_frame] reports [FrameError::Inert] until a
later configuration succeeds.

Call [BufferSave::release] before dropping a stage, so its registration is given back.
*/
#[derive(Debug)]
pub struct BufferSave {
    config: BufferSaveConfig,
    resolver: ActionResolver,
    registered: Option<BufferId>,
}

impl BufferSave {
    /// The name the stage registers under.
    pub const NAME: &'static str = "BufferSave";
    /// The menu the stage is listed in.
    pub const MENU: &'static str = "Misc";

    /// Parses `options` and creates a stage registered in `registry`.
    pub fn new<R: BufferRegistry>(
        options: &BufferSaveOptions,
        registry: &mut R,
    ) -> Result<Self, ConfigureError> {
        let config = options.parse()?;
        Ok(Self::with_config(config, registry)?)
    }

    pub fn with_config<R: BufferRegistry>(
        config: BufferSaveConfig,
        registry: &mut R,
    ) -> Result<Self, RegistryError> {
        let mut stage = BufferSave {
            resolver: ActionResolver::new(config.mode),
            config,
            registered: None,
        };
        stage.attach_buffer(registry)?;
        Ok(stage)
    }

    /**
    Applies an already-validated configuration.

    A changed mode restarts alternation; an unchanged one keeps its place.  A changed
    buffer id gives up the old buffer before registering the new one.  If registering
    fails the stage is left inert, holding no buffer at all.
    */
    pub fn apply<R: BufferRegistry>(
        &mut self,
        config: BufferSaveConfig,
        registry: &mut R,
    ) -> Result<(), RegistryError> {
        self.resolver.set_mode(config.mode);
        let needs_buffer = self.registered.as_ref() != Some(&config.buffer_id);
        self.config = config;
        if needs_buffer {
            self.attach_buffer(registry)?;
        }
        Ok(())
    }

    fn attach_buffer<R: BufferRegistry>(&mut self, registry: &mut R) -> Result<(), RegistryError> {
        if let Some(old) = self.registered.take() {
            logwise::info_sync!(
                "BufferSave switching from {old} to {new}",
                old = logwise::privacy::LogIt(&old),
                new = logwise::privacy::LogIt(&self.config.buffer_id)
            );
            registry.remove(&old);
        }
        if let Err(e) = registry.create(&self.config.buffer_id) {
            logwise::error_sync!(
                "BufferSave can't register {id}, stage is inert: {err}",
                id = logwise::privacy::LogIt(&self.config.buffer_id),
                err = logwise::privacy::LogIt(&e)
            );
            return Err(e);
        }
        self.registered = Some(self.config.buffer_id.clone());
        Ok(())
    }

    /// Parses `options` and applies them.  See [BufferSave::apply].
    pub fn configure<R: BufferRegistry>(
        &mut self,
        options: &BufferSaveOptions,
        registry: &mut R,
    ) -> Result<(), ConfigureError> {
        let config = options.parse()?;
        self.apply(config, registry)?;
        Ok(())
    }

    /// Gives back this stage's registration.  The stage is inert afterwards.
    pub fn release<R: BufferRegistry>(&mut self, registry: &mut R) {
        if let Some(id) = self.registered.take() {
            registry.remove(&id);
        }
    }

    pub fn config(&self) -> &BufferSaveConfig {
        &self.config
    }

    /// The buffer this stage currently holds a registration on.
    pub fn buffer_id(&self) -> Option<&BufferId> {
        self.registered.as_ref()
    }

    pub fn is_inert(&self) -> bool {
        self.registered.is_none()
    }

    /// What the next drawn frame will do.
    pub fn next_action(&self) -> Action {
        resolve(self.resolver.mode(), self.resolver.alternation()).0
    }
}

impl<R, C> Stage<R, C> for BufferSave
where
    R: BufferRegistry,
    C: FrameCopier<R::Texture>,
{
    type Options = BufferSaveOptions;

    fn configure(
        &mut self,
        options: &BufferSaveOptions,
        registry: &mut R,
    ) -> Result<(), ConfigureError> {
        BufferSave::configure(self, options, registry)
    }

    fn render_frame(&mut self, frame: &mut FrameContext<'_, R, C>) -> Result<(), FrameError> {
        let Some(buffer_id) = &self.registered else {
            logwise::warn_sync!("BufferSave is inert, skipping frame");
            return Err(FrameError::Inert);
        };
        //alternation advances whether or not the transfer works
        let action = self.resolver.next_action();
        execute(Some(action), buffer_id, self.config.blend_mode, frame)
    }

    fn release(&mut self, registry: &mut R) {
        BufferSave::release(self, registry)
    }
}

impl Drop for BufferSave {
    fn drop(&mut self) {
        if let Some(id) = &self.registered {
            logwise::warn_sync!(
                "BufferSave dropped while still holding {id}; call release first",
                id = logwise::privacy::LogIt(id)
            );
        }
    }
}
