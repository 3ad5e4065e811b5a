// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::backend::wgpu::Error;
use wgpu::{Limits, Trace};

/**
A wgpu device and its queue.

Cheap to clone; clones share the device.
*/
#[derive(Debug, Clone)]
pub struct GpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GpuDevice {
    /// Picks a default adapter and opens a device on it.
    pub async fn new() -> Result<Self, Error> {
        let descriptor = wgpu::InstanceDescriptor::from_env_or_default();
        let instance = wgpu::Instance::new(&descriptor);
        let options = wgpu::RequestAdapterOptions {
            power_preference: Default::default(),
            force_fallback_adapter: false,
            compatible_surface: None,
        };
        let adapter = instance
            .request_adapter(&options)
            .await
            .map_err(|_| Error::NoSuchAdapter)?;
        logwise::info_sync!(
            "using adapter {info}",
            info = logwise::privacy::LogIt(&adapter.get_info())
        );
        let descriptor = wgpu::DeviceDescriptor {
            label: Some("save_and_restore"),
            required_features: Default::default(),
            required_limits: Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
            memory_hints: Default::default(),
            trace: Trace::Off,
        };
        let (device, queue) = adapter.request_device(&descriptor).await?;
        Ok(Self::from_parts(device, queue))
    }

    /// Wraps a device the host already has.
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /**
    Runs `f` inside an error scope for `filter` and returns what the scope caught.

    Error scopes resolve asynchronously; on native they are ready as soon as the
    submission they cover has been validated, so blocking on them here is brief.
    */
    pub(crate) fn scoped<R>(
        &self,
        filter: wgpu::ErrorFilter,
        f: impl FnOnce(&wgpu::Device) -> R,
    ) -> (R, Option<wgpu::Error>) {
        self.device.push_error_scope(filter);
        let r = f(&self.device);
        let error = test_executors::spin_on(self.device.pop_error_scope());
        (r, error)
    }
}
