// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Buffer lifecycle across stages that share a registry.

use save_and_restore::backend::software::texture::Texel;
use save_and_restore::backend::software::{SoftwareBuffers, SoftwareCopier, SoftwareTexture};
use save_and_restore::pixel_formats::Unorm4;
use save_and_restore::stage::config::BufferSaveOptions;
use save_and_restore::stage::{BufferSave, ConfigureError, FrameContext, FrameError, Stage};
use save_and_restore::{BlendMode, BufferId, BufferRegistry, CopyError, FrameCopier, RegistryError};

const RED: Unorm4 = Unorm4 { r: 255, g: 0, b: 0, a: 255 };
const GREEN: Unorm4 = Unorm4 { r: 0, g: 255, b: 0, a: 255 };

fn options(action: &str, buffer_id: &str) -> BufferSaveOptions {
    BufferSaveOptions {
        action: action.to_string(),
        buffer_id: buffer_id.to_string(),
        ..Default::default()
    }
}

fn buf(s: &str) -> BufferId {
    BufferId::new(s).unwrap()
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Create(String),
    Remove(String),
}

/// Forwards to a software registry and remembers every create and remove.
#[derive(Debug)]
struct RecordingRegistry {
    inner: SoftwareBuffers,
    calls: Vec<Call>,
}

impl RecordingRegistry {
    fn new() -> Self {
        Self {
            inner: SoftwareBuffers::new(2, 2),
            calls: Vec::new(),
        }
    }
}

impl BufferRegistry for RecordingRegistry {
    type Texture = SoftwareTexture;

    fn create(&mut self, id: &BufferId) -> Result<(), RegistryError> {
        self.calls.push(Call::Create(id.to_string()));
        self.inner.create(id)
    }
    fn remove(&mut self, id: &BufferId) {
        self.calls.push(Call::Remove(id.to_string()));
        self.inner.remove(id)
    }
    fn get(&self, id: &BufferId) -> Option<Self::Texture> {
        self.inner.get(id)
    }
    fn owners(&self, id: &BufferId) -> usize {
        self.inner.owners(id)
    }
    fn set_render_target(&mut self, id: &BufferId) -> Result<Self::Texture, RegistryError> {
        self.inner.set_render_target(id)
    }
    fn restore_render_target(&mut self) {
        self.inner.restore_render_target()
    }
    fn active_render_target(&self) -> Option<&BufferId> {
        self.inner.active_render_target()
    }
    fn size(&self) -> (u16, u16) {
        self.inner.size()
    }
    fn resize(&mut self, width: u16, height: u16) -> Result<(), RegistryError> {
        self.inner.resize(width, height)
    }
}

/// A copier whose copies always fail, after checking which target is active.
#[derive(Debug, Default)]
struct FailingCopier {
    saw_target: bool,
}

impl FrameCopier<SoftwareTexture> for FailingCopier {
    fn copy(
        &mut self,
        _destination: &SoftwareTexture,
        _blend: Option<BlendMode>,
        _source: &SoftwareTexture,
    ) -> Result<(), CopyError> {
        self.saw_target = true;
        Err(CopyError::Backend("device lost".to_string()))
    }
}

#[test]
fn stages_share_a_buffer() {
    let mut registry = SoftwareBuffers::new(2, 2);
    let mut copier = SoftwareCopier::new();
    let mut saver = BufferSave::new(&options("Save", "shared"), &mut registry).unwrap();
    let mut restorer = BufferSave::new(&options("Restore", "shared"), &mut registry).unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.owners(&buf("shared")), 2);

    let upstream = SoftwareTexture::new_filled("upstream", 2, 2, RED);
    let downstream = SoftwareTexture::new_filled("downstream", 2, 2, GREEN);
    {
        let mut context = FrameContext::new(&mut registry, &mut copier, &upstream);
        saver.render_frame(&mut context).unwrap();
    }
    {
        let mut context = FrameContext::new(&mut registry, &mut copier, &downstream);
        restorer.render_frame(&mut context).unwrap();
    }
    assert_eq!(downstream.read(Texel { x: 1, y: 1 }), RED);

    //the saver leaving must not pull the buffer out from under the restorer
    saver.release(&mut registry);
    assert_eq!(registry.owners(&buf("shared")), 1);
    {
        let mut context = FrameContext::new(&mut registry, &mut copier, &downstream);
        restorer.render_frame(&mut context).unwrap();
    }
    restorer.release(&mut registry);
    assert!(registry.is_empty());
}

#[test]
fn changing_buffer_id_releases_old_and_creates_new_once() {
    let mut registry = RecordingRegistry::new();
    let mut stage = BufferSave::new(&options("Save", "A"), &mut registry).unwrap();
    stage.configure(&options("Save", "B"), &mut registry).unwrap();
    //same id again: nothing to do
    stage.configure(&options("Save", "B"), &mut registry).unwrap();
    stage.release(&mut registry);
    assert_eq!(
        registry.calls,
        vec![
            Call::Create("A".to_string()),
            Call::Remove("A".to_string()),
            Call::Create("B".to_string()),
            Call::Remove("B".to_string()),
        ]
    );
    assert!(registry.inner.is_empty());
}

#[test]
fn exhausted_registry_leaves_stage_inert() {
    //room for one 2x2 RGBA8 buffer
    let mut registry = SoftwareBuffers::new(2, 2).with_memory_limit(16);
    let mut copier = SoftwareCopier::new();
    let mut other = BufferSave::new(&options("Save", "taken"), &mut registry).unwrap();
    let mut stage = BufferSave::new(&options("SaveThenRestore", "mine"), &mut registry);
    assert!(matches!(
        stage,
        Err(ConfigureError::Registry(RegistryError::ResourceExhausted { .. }))
    ));

    //an existing stage that tries to move onto a new buffer loses its old one and goes inert
    let mut moving = BufferSave::new(&options("SaveThenRestore", "taken"), &mut registry).unwrap();
    let result = moving.configure(&options("SaveThenRestore", "mine"), &mut registry);
    assert!(matches!(result, Err(ConfigureError::Registry(_))));
    assert!(moving.is_inert());
    assert_eq!(registry.owners(&buf("taken")), 1);

    let frame = SoftwareTexture::new_filled("frame", 2, 2, RED);
    {
        let mut context = FrameContext::new(&mut registry, &mut copier, &frame);
        assert_eq!(moving.render_frame(&mut context), Err(FrameError::Inert));
    }
    assert_eq!(copier.copies(), 0);
    //inert frames don't advance the alternation
    assert_eq!(
        moving.next_action(),
        save_and_restore::stage::mode::Action::Save
    );

    //once there is room again, configuring revives it
    other.release(&mut registry);
    moving
        .configure(&options("SaveThenRestore", "mine"), &mut registry)
        .unwrap();
    assert!(!moving.is_inert());
    {
        let mut context = FrameContext::new(&mut registry, &mut copier, &frame);
        moving.render_frame(&mut context).unwrap();
    }
    assert_eq!(copier.copies(), 1);
    moving.release(&mut registry);
    if let Ok(stage) = stage.as_mut() {
        stage.release(&mut registry);
    }
    assert!(registry.is_empty());
}

#[test]
fn failed_copy_still_restores_render_target() {
    let mut registry = SoftwareBuffers::new(2, 2);
    let mut copier = FailingCopier::default();
    let mut stage = BufferSave::new(&options("SaveThenRestore", "buf1"), &mut registry).unwrap();
    let frame = SoftwareTexture::new_filled("frame", 2, 2, RED);
    {
        let mut context = FrameContext::new(&mut registry, &mut copier, &frame);
        assert_eq!(
            stage.render_frame(&mut context),
            Err(FrameError::Copy(CopyError::Backend("device lost".to_string())))
        );
    }
    assert!(copier.saw_target);
    assert_eq!(registry.active_render_target(), None);
    //the failed frame still counts for alternation
    assert_eq!(
        stage.next_action(),
        save_and_restore::stage::mode::Action::Restore
    );
    stage.release(&mut registry);
}
