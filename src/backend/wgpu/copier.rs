// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::backend::wgpu::{GpuDevice, GpuTexture};
use crate::blend::BlendMode;
use crate::copier::{CopyError, FrameCopier};
use std::borrow::Cow;
use std::collections::HashMap;
use wgpu::{BlendComponent, BlendFactor, BlendOperation, BlendState};

const SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    //one triangle that covers the whole target
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * vec2<f32>(2.0, -2.0) + vec2<f32>(-1.0, 1.0), 0.0, 1.0);
    out.uv = uv;
    return out;
}

@group(0) @binding(0) var source: texture_2d<f32>;
@group(0) @binding(1) var source_sampler: sampler;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(source, source_sampler, in.uv);
}
"#;

/// The fixed-function blend that implements `mode`, or `None` for a plain overwrite.
fn blend_state(mode: BlendMode) -> Option<BlendState> {
    let both = |component: BlendComponent| BlendState {
        color: component,
        alpha: component,
    };
    let component = |src_factor, dst_factor, operation| BlendComponent {
        src_factor,
        dst_factor,
        operation,
    };
    use BlendFactor::*;
    match mode {
        BlendMode::Replace => None,
        BlendMode::Maximum => Some(both(component(One, One, BlendOperation::Max))),
        BlendMode::Average => Some(both(component(Constant, Constant, BlendOperation::Add))),
        BlendMode::Additive => Some(both(component(One, One, BlendOperation::Add))),
        BlendMode::Subtractive1 => Some(both(component(
            One,
            One,
            BlendOperation::ReverseSubtract,
        ))),
        BlendMode::Subtractive2 => Some(both(component(One, One, BlendOperation::Subtract))),
        BlendMode::Multiply => Some(both(component(Dst, Zero, BlendOperation::Add))),
        BlendMode::Multiply2 => Some(both(component(Dst, Src, BlendOperation::Add))),
        BlendMode::Alpha => Some(BlendState {
            color: component(SrcAlpha, OneMinusSrcAlpha, BlendOperation::Add),
            alpha: component(One, OneMinusSrcAlpha, BlendOperation::Add),
        }),
    }
}

/**
Copies GPU textures by drawing a full-screen triangle.

Pipelines are built lazily, one per destination format and blend mode.
*/
#[derive(Debug)]
pub struct GpuCopier {
    device: GpuDevice,
    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    pipelines: HashMap<(wgpu::TextureFormat, BlendMode), wgpu::RenderPipeline>,
    copies: usize,
}

impl GpuCopier {
    pub fn new(device: &GpuDevice) -> Self {
        let gpu = device.device();
        let shader = gpu.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("save_and_restore copy"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(SHADER)),
        });
        let bind_group_layout = gpu.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("save_and_restore copy"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = gpu.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("save_and_restore copy"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        //nearest, to match the software copier when sizes differ
        let sampler = gpu.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("save_and_restore copy"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            lod_min_clamp: 0.0,
            lod_max_clamp: 0.0,
            compare: None,
            anisotropy_clamp: 1,
            border_color: None,
        });
        Self {
            device: device.clone(),
            shader,
            bind_group_layout,
            pipeline_layout,
            sampler,
            pipelines: HashMap::new(),
            copies: 0,
        }
    }

    pub fn copies(&self) -> usize {
        self.copies
    }

    fn pipeline(&mut self, format: wgpu::TextureFormat, blend: BlendMode) -> wgpu::RenderPipeline {
        let Self {
            device,
            shader,
            pipeline_layout,
            pipelines,
            ..
        } = self;
        pipelines
            .entry((format, blend))
            .or_insert_with(|| {
                logwise::trace_sync!(
                    "building copy pipeline for {blend}",
                    blend = logwise::privacy::LogIt(&blend)
                );
                device
                    .device()
                    .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some("save_and_restore copy"),
                        layout: Some(&*pipeline_layout),
                        vertex: wgpu::VertexState {
                            module: &*shader,
                            entry_point: Some("vs_main"),
                            compilation_options: Default::default(),
                            buffers: &[],
                        },
                        primitive: wgpu::PrimitiveState::default(),
                        depth_stencil: None,
                        multisample: wgpu::MultisampleState::default(),
                        fragment: Some(wgpu::FragmentState {
                            module: &*shader,
                            entry_point: Some("fs_main"),
                            compilation_options: Default::default(),
                            targets: &[Some(wgpu::ColorTargetState {
                                format,
                                blend: blend_state(blend),
                                write_mask: wgpu::ColorWrites::ALL,
                            })],
                        }),
                        multiview: None,
                        cache: None,
                    })
            })
            .clone()
    }

    fn draw(
        &mut self,
        destination: &GpuTexture,
        blend: BlendMode,
        source: &GpuTexture,
    ) {
        let pipeline = self.pipeline(destination.format(), blend);
        let gpu = self.device.device();
        let bind_group = gpu.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(source.debug_name()),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        let mut encoder = gpu.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(destination.debug_name()),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(destination.debug_name()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: destination.view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            if blend == BlendMode::Average {
                pass.set_blend_constant(wgpu::Color {
                    r: 0.5,
                    g: 0.5,
                    b: 0.5,
                    a: 0.5,
                });
            }
            pass.draw(0..3, 0..1);
        }
        self.device.queue().submit(std::iter::once(encoder.finish()));
    }
}

impl FrameCopier<GpuTexture> for GpuCopier {
    fn copy(
        &mut self,
        destination: &GpuTexture,
        blend: Option<BlendMode>,
        source: &GpuTexture,
    ) -> Result<(), CopyError> {
        if destination.same_texture(source) {
            return Err(CopyError::SameTexture);
        }
        let device = self.device.clone();
        let ((), error) = device.scoped(wgpu::ErrorFilter::Validation, |_| {
            self.draw(destination, blend.unwrap_or_default(), source)
        });
        if let Some(e) = error {
            logwise::error_sync!(
                "copy from {source} to {destination} failed: {err}",
                source = logwise::privacy::LogIt(&source.debug_name()),
                destination = logwise::privacy::LogIt(&destination.debug_name()),
                err = logwise::privacy::LogIt(&e)
            );
            return Err(CopyError::Backend(e.to_string()));
        }
        self.copies += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_formats::Float4;

    #[test]
    fn replace_needs_no_blend() {
        assert_eq!(blend_state(BlendMode::Replace), None);
        for mode in BlendMode::ALL.into_iter().skip(1) {
            assert!(blend_state(mode).is_some(), "{mode}");
        }
    }

    #[test]
    fn min_max_use_unit_factors() {
        let state = blend_state(BlendMode::Maximum).unwrap();
        assert_eq!(state.color.src_factor, BlendFactor::One);
        assert_eq!(state.color.dst_factor, BlendFactor::One);
    }

    fn channel(p: Float4, index: usize) -> f32 {
        [p.r, p.g, p.b, p.a][index]
    }

    fn factor(factor: BlendFactor, s: Float4, d: Float4, index: usize) -> f32 {
        match factor {
            BlendFactor::Zero => 0.0,
            BlendFactor::One => 1.0,
            BlendFactor::Src => channel(s, index),
            BlendFactor::Dst => channel(d, index),
            BlendFactor::SrcAlpha => s.a,
            BlendFactor::OneMinusSrcAlpha => 1.0 - s.a,
            //the blend constant set for Average
            BlendFactor::Constant => 0.5,
            other => panic!("unexpected factor {other:?}"),
        }
    }

    /// The fixed-function blend equation, as an 8-bit normalized target computes it.
    fn evaluate(state: Option<BlendState>, s: Float4, d: Float4) -> Float4 {
        let Some(state) = state else { return s };
        let blend = |index: usize| {
            let component = if index == 3 { state.alpha } else { state.color };
            let (sc, dc) = (channel(s, index), channel(d, index));
            let sf = factor(component.src_factor, s, d, index);
            let df = factor(component.dst_factor, s, d, index);
            let value = match component.operation {
                BlendOperation::Add => sc * sf + dc * df,
                BlendOperation::Subtract => sc * sf - dc * df,
                BlendOperation::ReverseSubtract => dc * df - sc * sf,
                BlendOperation::Min => sc.min(dc),
                BlendOperation::Max => sc.max(dc),
            };
            value.clamp(0.0, 1.0)
        };
        Float4 {
            r: blend(0),
            g: blend(1),
            b: blend(2),
            a: blend(3),
        }
    }

    #[test]
    fn blend_states_match_software_formulas() {
        let samples = [
            Float4 { r: 0.6, g: 0.2, b: 1.0, a: 0.5 },
            Float4 { r: 0.5, g: 0.4, b: 0.0, a: 1.0 },
            Float4 { r: 0.1, g: 0.9, b: 0.25, a: 0.0 },
            Float4 { r: 0.3, g: 0.3, b: 0.75, a: 0.8 },
        ];
        for mode in BlendMode::ALL {
            for s in samples {
                for d in samples {
                    let gpu = evaluate(blend_state(mode), s, d);
                    let cpu = mode.apply(s, d);
                    let close = [(gpu.r, cpu.r), (gpu.g, cpu.g), (gpu.b, cpu.b), (gpu.a, cpu.a)]
                        .iter()
                        .all(|(a, b)| (a - b).abs() < 1e-5);
                    assert!(close, "{mode}: s={s:?} d={d:?} gpu={gpu:?} cpu={cpu:?}");
                }
            }
        }
    }
}
