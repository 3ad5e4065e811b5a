// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! save_and_restore is a frame-buffer save/restore stage for real-time render pipelines.

A pipeline runs its stages once per frame.  [stage::BufferSave] either copies the current
frame into a named buffer, composites a previously saved buffer back onto the current frame,
or alternates between the two on successive frames:

| action            | frame 1 | frame 2 | frame 3 | frame 4 |
|-------------------|---------|---------|---------|---------|
| `Save`            | save    | save    | save    | save    |
| `Restore`         | restore | restore | restore | restore |
| `SaveThenRestore` | save    | restore | save    | restore |
| `RestoreThenSave` | restore | save    | restore | save    |

Buffers live in a registry shared by the whole pipeline ([buffers::BufferRegistry]).
Stages that name the same buffer share its texture, which is how a frame saved at one
point in a chain is restored at another.  Restores composite with a [blend::BlendMode].

# Backends

The stage is written against two traits, [buffers::BufferRegistry] and
[copier::FrameCopier], so it runs on anything that can provide them.  Two
implementations ship with the crate:

* [backend::software] draws on the CPU.  It is always available.
* `backend::wgpu` draws with [wgpu](https://wgpu.rs), behind the default `backend_wgpu` feature.

# Example

```
use save_and_restore::backend::software::{SoftwareBuffers, SoftwareCopier, SoftwareTexture};
use save_and_restore::pixel_formats::Unorm4;
use save_and_restore::stage::config::BufferSaveOptions;
use save_and_restore::stage::{BufferSave, FrameContext, Stage};

let mut registry = SoftwareBuffers::new(64, 64);
let mut copier = SoftwareCopier::new();
let options = BufferSaveOptions {
    action: "SaveThenRestore".to_string(),
    ..Default::default()
};
let mut stage = BufferSave::new(&options, &mut registry).unwrap();

let frame = SoftwareTexture::new_filled("frame", 64, 64, Unorm4 { r: 255, g: 0, b: 0, a: 255 });
for _ in 0..2 {
    let mut context = FrameContext::new(&mut registry, &mut copier, &frame);
    stage.render_frame(&mut context).unwrap();
}
stage.release(&mut registry);
```
*/

pub mod backend;
pub mod blend;
pub mod buffers;
pub mod copier;
pub mod pixel_formats;
pub mod stage;

pub use blend::BlendMode;
pub use buffers::{BufferId, BufferRegistry, RegistryError};
pub use copier::{CopyError, FrameCopier};
pub use stage::{BufferSave, FrameContext, Stage};
