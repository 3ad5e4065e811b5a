// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Moves frames between the pipeline and the buffer registry.
*/

use crate::blend::BlendMode;
use crate::buffers::{BufferId, BufferRegistry, RegistryError};
use crate::copier::FrameCopier;
use crate::stage::mode::Action;
use crate::stage::{FrameContext, FrameError};
use std::ops::{Deref, DerefMut};

/**
Guard for a render-target switch.

Entering the scope redirects rendering into a buffer.  Dropping it returns rendering to
the previous target, on every exit path, including early returns and unwinding.
*/
#[derive(Debug)]
#[must_use = "dropping the scope restores the previous render target immediately"]
pub struct RenderTargetScope<'a, R: BufferRegistry> {
    registry: &'a mut R,
    target: R::Texture,
}

impl<'a, R: BufferRegistry> RenderTargetScope<'a, R> {
    /**
    Redirects rendering to `id`.

    If `id` isn't registered, nothing changes and the error is returned.
    */
    pub fn enter(registry: &'a mut R, id: &BufferId) -> Result<Self, RegistryError> {
        let target = registry.set_render_target(id)?;
        Ok(Self { registry, target })
    }

    /// The texture rendering is redirected into.
    pub fn target(&self) -> &R::Texture {
        &self.target
    }
}

impl<R: BufferRegistry> Deref for RenderTargetScope<'_, R> {
    type Target = R;
    fn deref(&self) -> &Self::Target {
        self.registry
    }
}

impl<R: BufferRegistry> DerefMut for RenderTargetScope<'_, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.registry
    }
}

impl<R: BufferRegistry> Drop for RenderTargetScope<'_, R> {
    fn drop(&mut self) {
        self.registry.restore_render_target();
    }
}

/**
Performs one frame's transfer.

* [Action::Save] copies the frame's input into `buffer_id`, replacing its contents.
* [Action::Restore] composites `buffer_id` onto the frame's output with `blend_mode`.
* `None` does nothing.

The registry entry itself is never replaced; only texture contents change.
*/
pub fn execute<R, C>(
    action: Option<Action>,
    buffer_id: &BufferId,
    blend_mode: BlendMode,
    frame: &mut FrameContext<'_, R, C>,
) -> Result<(), FrameError>
where
    R: BufferRegistry,
    C: FrameCopier<R::Texture>,
{
    match action {
        None => Ok(()),
        Some(Action::Save) => save(buffer_id, frame),
        Some(Action::Restore) => restore(buffer_id, blend_mode, frame),
    }
}

fn save<R, C>(buffer_id: &BufferId, frame: &mut FrameContext<'_, R, C>) -> Result<(), FrameError>
where
    R: BufferRegistry,
    C: FrameCopier<R::Texture>,
{
    let scope = RenderTargetScope::enter(&mut *frame.registry, buffer_id)
        .map_err(|e| missing_buffer(buffer_id, e))?;
    logwise::trace_sync!("saving frame into {id}", id = logwise::privacy::LogIt(buffer_id));
    frame.copier.copy(scope.target(), None, frame.input)?;
    Ok(())
}

fn restore<R, C>(
    buffer_id: &BufferId,
    blend_mode: BlendMode,
    frame: &mut FrameContext<'_, R, C>,
) -> Result<(), FrameError>
where
    R: BufferRegistry,
    C: FrameCopier<R::Texture>,
{
    let Some(stored) = frame.registry.get(buffer_id) else {
        return Err(missing_buffer(
            buffer_id,
            RegistryError::Missing {
                id: buffer_id.clone(),
            },
        ));
    };
    logwise::trace_sync!(
        "restoring {id} with {blend}",
        id = logwise::privacy::LogIt(buffer_id),
        blend = logwise::privacy::LogIt(&blend_mode)
    );
    frame.copier.copy(frame.output, Some(blend_mode), &stored)?;
    Ok(())
}

/**
A buffer that should exist doesn't.  The stage's lifecycle has gone wrong somewhere.

Debug builds panic.  Release builds log and report [FrameError::MissingBuffer].
*/
fn missing_buffer(buffer_id: &BufferId, error: RegistryError) -> FrameError {
    match error {
        RegistryError::Missing { id } => {
            logwise::error_sync!(
                "buffer {id} was used before it was created or after it was released",
                id = logwise::privacy::LogIt(&id)
            );
            debug_assert!(
                false,
                "buffer {id} was used before it was created or after it was released"
            );
            FrameError::MissingBuffer { id }
        }
        other => {
            logwise::error_sync!(
                "can't switch to buffer {id}: {err}",
                id = logwise::privacy::LogIt(buffer_id),
                err = logwise::privacy::LogIt(&other)
            );
            FrameError::Registry(other)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::software::{SoftwareBuffers, SoftwareCopier, SoftwareTexture};
    use crate::pixel_formats::Unorm4;

    const RED: Unorm4 = Unorm4 { r: 255, g: 0, b: 0, a: 255 };
    const BLUE: Unorm4 = Unorm4 { r: 0, g: 0, b: 255, a: 255 };

    fn id(s: &str) -> BufferId {
        BufferId::new(s).unwrap()
    }

    #[test]
    fn scope_restores_on_drop() {
        let mut registry = SoftwareBuffers::new(2, 2);
        registry.create(&id("a")).unwrap();
        {
            let scope = RenderTargetScope::enter(&mut registry, &id("a")).unwrap();
            assert_eq!(scope.active_render_target(), Some(&id("a")));
        }
        assert_eq!(registry.active_render_target(), None);
    }

    #[test]
    fn scope_on_missing_buffer_changes_nothing() {
        let mut registry = SoftwareBuffers::new(2, 2);
        let err = RenderTargetScope::enter(&mut registry, &id("nope")).unwrap_err();
        assert_eq!(err, RegistryError::Missing { id: id("nope") });
        assert_eq!(registry.active_render_target(), None);
    }

    #[test]
    fn save_copies_input_and_restore_composites() {
        let mut registry = SoftwareBuffers::new(2, 2);
        let mut copier = SoftwareCopier::new();
        registry.create(&id("a")).unwrap();
        let frame = SoftwareTexture::new_filled("frame", 2, 2, RED);
        {
            let mut context = FrameContext::new(&mut registry, &mut copier, &frame);
            execute(Some(Action::Save), &id("a"), BlendMode::Replace, &mut context).unwrap();
        }
        assert!(registry.get(&id("a")).unwrap().snapshot().iter().all(|p| *p == RED));

        frame.fill(BLUE);
        {
            let mut context = FrameContext::new(&mut registry, &mut copier, &frame);
            execute(Some(Action::Restore), &id("a"), BlendMode::Replace, &mut context).unwrap();
        }
        assert!(frame.snapshot().iter().all(|p| *p == RED));
        assert_eq!(copier.copies(), 2);
    }

    #[test]
    fn no_action_is_a_no_op() {
        let mut registry = SoftwareBuffers::new(2, 2);
        let mut copier = SoftwareCopier::new();
        let frame = SoftwareTexture::new_filled("frame", 2, 2, RED);
        let mut context = FrameContext::new(&mut registry, &mut copier, &frame);
        //the buffer doesn't even exist; nothing should look for it
        execute(None, &id("a"), BlendMode::Replace, &mut context).unwrap();
        assert_eq!(copier.copies(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "buffer gone was used before it was created")]
    fn saving_into_missing_buffer_panics_in_debug() {
        let mut registry = SoftwareBuffers::new(2, 2);
        let mut copier = SoftwareCopier::new();
        let frame = SoftwareTexture::new_filled("frame", 2, 2, RED);
        let mut context = FrameContext::new(&mut registry, &mut copier, &frame);
        let _ = execute(Some(Action::Save), &id("gone"), BlendMode::Replace, &mut context);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "buffer gone was used before it was created")]
    fn restoring_missing_buffer_panics_in_debug() {
        let mut registry = SoftwareBuffers::new(2, 2);
        let mut copier = SoftwareCopier::new();
        let frame = SoftwareTexture::new_filled("frame", 2, 2, RED);
        let mut context = FrameContext::new(&mut registry, &mut copier, &frame);
        let _ = execute(Some(Action::Restore), &id("gone"), BlendMode::Replace, &mut context);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn missing_buffer_is_reported() {
        let mut registry = SoftwareBuffers::new(2, 2);
        let mut copier = SoftwareCopier::new();
        let frame = SoftwareTexture::new_filled("frame", 2, 2, RED);
        let mut context = FrameContext::new(&mut registry, &mut copier, &frame);
        for action in [Action::Save, Action::Restore] {
            assert_eq!(
                execute(Some(action), &id("gone"), BlendMode::Replace, &mut context),
                Err(FrameError::MissingBuffer { id: id("gone") })
            );
        }
        assert_eq!(registry.active_render_target(), None);
    }
}
