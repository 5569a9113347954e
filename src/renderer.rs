//! Skybox and Phong model rendering with depth testing.
//!
//! The [`Renderer`] owns two pipelines and one drawable per scene object.
//! Each drawable has its own pair of uniform buffers, since every
//! `write_buffer` call lands before the frame's commands execute and a shared
//! buffer would leave all draws seeing the last write.
//!
//! # Bind Groups
//!
//! | Group | Skybox pipeline         | Phong pipeline          |
//! |-------|-------------------------|-------------------------|
//! | 0     | [`Uniforms`]            | [`Uniforms`]            |
//! | 1     | [`SkyboxUniforms`]      | [`PhongUniforms`]       |
//! | 2     | -                       | texture + sampler       |
//!
//! The skybox is drawn first on the far plane with depth writes off, so the
//! model always lands in front of it. [`FramePlan`] decides up front which
//! drawables take part in a frame.
//!
//! [`Uniforms`]: crate::Uniforms
//! [`SkyboxUniforms`]: crate::SkyboxUniforms
//! [`PhongUniforms`]: crate::PhongUniforms

use log::{debug, info};

use crate::frame::FrameUniforms;
use crate::gpu::GpuContext;
use crate::mesh::{Mesh, MeshLayout, NORMAL_LAYOUT, POSITION_LAYOUT, UV_LAYOUT};
use crate::texture::Texture;
use crate::uniforms::{PhongUniforms, SkyboxUniforms, Uniforms};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Per-sub-mesh index counts each drawable will draw this frame.
///
/// An empty list means the drawable sits the frame out: its uniforms are not
/// uploaded and nothing is drawn. That covers a missing mesh as well as one
/// with no vertices or no triangles.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FramePlan<'a> {
    pub skybox: &'a [u32],
    pub model: &'a [u32],
}

impl<'a> FramePlan<'a> {
    pub fn new(skybox: Option<&'a MeshLayout>, model: Option<&'a MeshLayout>) -> Self {
        Self {
            skybox: draw_list(skybox),
            model: draw_list(model),
        }
    }
}

fn draw_list(layout: Option<&MeshLayout>) -> &[u32] {
    match layout {
        Some(layout) if layout.is_drawable() => &layout.index_counts,
        _ => &[],
    }
}

/// A mesh slot plus the uniform buffers its draws read.
struct Drawable {
    mesh: Option<Mesh>,
    transform_buffer: wgpu::Buffer,
    transform_bind_group: wgpu::BindGroup,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
}

impl Drawable {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        params_size: usize,
        mesh: Option<Mesh>,
    ) -> Self {
        let (transform_buffer, transform_bind_group) = uniform_binding(
            device,
            layout,
            &format!("{label} Transform"),
            std::mem::size_of::<Uniforms>(),
        );
        let (params_buffer, params_bind_group) =
            uniform_binding(device, layout, &format!("{label} Params"), params_size);

        Self {
            mesh,
            transform_buffer,
            transform_bind_group,
            params_buffer,
            params_bind_group,
        }
    }

    fn layout(&self) -> Option<&MeshLayout> {
        self.mesh.as_ref().map(Mesh::layout)
    }

    fn upload<P: bytemuck::Pod>(&self, queue: &wgpu::Queue, transform: &Uniforms, params: &P) {
        queue.write_buffer(&self.transform_buffer, 0, bytemuck::bytes_of(transform));
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));
    }

    /// Binds groups 0 and 1 and the vertex streams, then issues one indexed
    /// draw per entry of `index_counts`. Callers pass the list from
    /// [`FramePlan`], which is empty unless the mesh has buffers to slice.
    fn draw(&self, render_pass: &mut wgpu::RenderPass, index_counts: &[u32], with_uv: bool) {
        let Some(mesh) = &self.mesh else {
            return;
        };
        if index_counts.is_empty() {
            return;
        }

        render_pass.set_bind_group(0, &self.transform_bind_group, &[]);
        render_pass.set_bind_group(1, &self.params_bind_group, &[]);
        render_pass.set_vertex_buffer(0, mesh.position_buffer.slice(..));
        render_pass.set_vertex_buffer(1, mesh.normal_buffer.slice(..));
        if with_uv {
            render_pass.set_vertex_buffer(2, mesh.uv_buffer.slice(..));
        }

        for (index_buffer, &count) in mesh.index_buffers.iter().zip(index_counts) {
            render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..count, 0, 0..1);
        }
    }
}

fn uniform_binding(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    size: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(&format!("{label} Uniforms")),
        size: size as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{label} Bind Group")),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });

    (buffer, bind_group)
}

/// Draws the skybox and the model into the window surface.
pub struct Renderer {
    skybox_pipeline: wgpu::RenderPipeline,
    phong_pipeline: wgpu::RenderPipeline,
    texture_bind_group: wgpu::BindGroup,
    skybox: Drawable,
    model: Drawable,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl Renderer {
    /// Builds both pipelines and the per-drawable uniform buffers.
    ///
    /// `model` may be `None`, in which case only the sky is drawn.
    pub fn new(
        gpu: &GpuContext,
        skybox_mesh: Mesh,
        model: Option<Mesh>,
        texture: &Texture,
    ) -> Self {
        let device = &gpu.device;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Bind Group Layout"),
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
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let skybox_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Skybox Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/skybox.wgsl").into()),
        });
        let phong_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Phong Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/phong.wgsl").into()),
        });

        let skybox_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Skybox Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &uniform_layout],
            push_constant_ranges: &[],
        });
        let phong_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Phong Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        // Sky sits on the far plane (z = w), so it must pass at depth 1.0 and
        // never occlude anything.
        let skybox_pipeline = create_pipeline(
            gpu,
            "Skybox Pipeline",
            &skybox_layout,
            &skybox_shader,
            &[POSITION_LAYOUT, NORMAL_LAYOUT],
            None,
            wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            },
        );

        // Left-handed view: outward faces wound counter-clockwise in object
        // space appear clockwise on screen.
        let phong_pipeline = create_pipeline(
            gpu,
            "Phong Pipeline",
            &phong_layout,
            &phong_shader,
            &[POSITION_LAYOUT, NORMAL_LAYOUT, UV_LAYOUT],
            Some(wgpu::Face::Back),
            wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            },
        );

        let skybox = Drawable::new(
            device,
            &uniform_layout,
            "Skybox",
            std::mem::size_of::<SkyboxUniforms>(),
            Some(skybox_mesh),
        );
        let model = Drawable::new(
            device,
            &uniform_layout,
            "Model",
            std::mem::size_of::<PhongUniforms>(),
            model,
        );

        let texture_bind_group = create_texture_bind_group(gpu, &texture_layout, texture);
        let depth_view = create_depth_view(gpu);

        info!("renderer ready ({:?})", gpu.config.format);

        Self {
            skybox_pipeline,
            phong_pipeline,
            texture_bind_group,
            skybox,
            model,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
        }
    }

    /// Recreates the depth buffer if the surface changed size.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = create_depth_view(gpu);
            self.depth_size = (gpu.width(), gpu.height());
            debug!("depth buffer resized to {}x{}", gpu.width(), gpu.height());
        }
    }

    /// Uploads `frame` and draws one frame to the surface.
    ///
    /// Drawables left out of the [`FramePlan`] are skipped. Surface errors are returned to
    /// the caller, which decides whether to reconfigure or give up.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        frame: &FrameUniforms,
    ) -> Result<(), wgpu::SurfaceError> {
        self.ensure_depth_size(gpu);

        let plan = FramePlan::new(self.skybox.layout(), self.model.layout());
        if !plan.skybox.is_empty() {
            self.skybox.upload(&gpu.queue, &frame.skybox, &frame.sky);
        }
        if !plan.model.is_empty() {
            self.model.upload(&gpu.queue, &frame.model, &frame.phong);
        }

        let output = gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if !plan.skybox.is_empty() {
                render_pass.set_pipeline(&self.skybox_pipeline);
                self.skybox.draw(&mut render_pass, plan.skybox, false);
            }

            if !plan.model.is_empty() {
                render_pass.set_pipeline(&self.phong_pipeline);
                render_pass.set_bind_group(2, &self.texture_bind_group, &[]);
                self.model.draw(&mut render_pass, plan.model, true);
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn create_pipeline(
    gpu: &GpuContext,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    buffers: &[wgpu::VertexBufferLayout],
    cull_mode: Option<wgpu::Face>,
    depth_stencil: wgpu::DepthStencilState,
) -> wgpu::RenderPipeline {
    gpu.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs"),
                buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode,
                front_face: wgpu::FrontFace::Cw,
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
}

fn create_texture_bind_group(
    gpu: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
) -> wgpu::BindGroup {
    gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Model Texture Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
    })
}

fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MeshData;

    #[test]
    fn missing_model_is_skipped_while_sky_draws() {
        let sky = MeshLayout::of(&MeshData::uv_sphere(16, 8, 1.0));
        let plan = FramePlan::new(Some(&sky), None);

        assert_eq!(plan.skybox, &[768]);
        assert!(plan.model.is_empty());
    }

    #[test]
    fn empty_model_is_skipped() {
        let sky = MeshLayout::of(&MeshData::uv_sphere(16, 8, 1.0));
        let empty = MeshLayout::of(&MeshData::default());
        let plan = FramePlan::new(Some(&sky), Some(&empty));

        assert_eq!(plan.skybox, &[768]);
        assert!(plan.model.is_empty());
    }

    #[test]
    fn model_draws_once_per_sub_mesh() {
        let sky = MeshLayout::of(&MeshData::uv_sphere(16, 8, 1.0));
        let mut data = MeshData::uv_sphere(4, 2, 1.0);
        data.sub_meshes.push(vec![0, 1, 2]);
        let model = MeshLayout::of(&data);

        let plan = FramePlan::new(Some(&sky), Some(&model));
        assert_eq!(plan.model, &[48, 3]);
    }

    #[test]
    fn nothing_to_draw_without_meshes() {
        assert_eq!(FramePlan::new(None, None), FramePlan::default());
    }
}
