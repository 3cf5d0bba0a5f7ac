//! Scene render passes: occluder depth, translucent fill, grid overlay and
//! classification markers.
//!
//! The depth-only pass is encoded separately from the color passes so a
//! pending visibility test can consume a depth buffer that contains the
//! occluder and nothing else. Write masks are baked into the pipelines, so
//! no pass can leak mask state into a later one.

use glam::Mat4;
use wgpu::util::DeviceExt;

use occl_core::gpu::{marker_instances, MarkerInstance, SceneUniforms};
use occl_core::{constants, scene, SceneData, Viewport};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const POS3_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 12,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    }],
};

const MARKER_CORNER_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 8,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 0,
        shader_location: 0,
    }],
};

const MARKER_INSTANCE_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<MarkerInstance>() as u64,
    step_mode: wgpu::VertexStepMode::Instance,
    attributes: &[
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 0,
            shader_location: 1,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 12,
            shader_location: 2,
        },
    ],
};

fn depth_stencil(write: bool, compare: wgpu::CompareFunction) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

pub struct SceneRenderer {
    depth_only_pipeline: wgpu::RenderPipeline,
    fill_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    marker_pipeline: wgpu::RenderPipeline,
    probe_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    plane_vb: wgpu::Buffer,
    grid_vb: wgpu::Buffer,
    grid_vertex_count: u32,
    marker_quad_vb: wgpu::Buffer,
    marker_instance_vb: wgpu::Buffer,
    probe_vb: wgpu::Buffer,
    point_count: u32,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        scene_data: &SceneData,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene-shader"),
            source: wgpu::ShaderSource::Wgsl(occl_core::SCENE_WGSL.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene-uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene-bg"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // Geometry is fixed for the session; only the marker instances and
        // uniforms are rewritten per frame.
        let plane_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("plane-vb"),
            contents: bytemuck::cast_slice(&scene::plane_triangles(scene_data.plane_y)),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let grid_vertices = scene::grid_lines(scene_data.plane_y);
        let grid_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid-vb"),
            contents: bytemuck::cast_slice(&grid_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let marker_quad: [f32; 12] = [
            -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5, 0.5,
        ];
        let marker_quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("marker-quad-vb"),
            contents: bytemuck::cast_slice(&marker_quad),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let marker_instance_vb = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("marker-instance-vb"),
            size: (std::mem::size_of::<MarkerInstance>() * scene_data.points.len()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let probe_positions: Vec<[f32; 3]> =
            scene_data.points.iter().map(|p| p.to_array()).collect();
        let probe_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("probe-vb"),
            contents: bytemuck::cast_slice(&probe_positions),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Pass 1: occluder depth with color writes absent entirely.
        let depth_only_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("depth-only-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_plane"),
                buffers: &[POS3_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(depth_stencil(true, wgpu::CompareFunction::Less)),
            multisample: wgpu::MultisampleState::default(),
            fragment: None,
            cache: None,
            multiview: None,
        });

        // Pass 2a: translucent fill over its own depth-only result, so the
        // compare must admit equal depths.
        let fill_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("fill-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_plane"),
                buffers: &[POS3_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(depth_stencil(false, wgpu::CompareFunction::LessEqual)),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_plane"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        // Pass 2b: unblended grid overlay.
        let grid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grid-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_grid"),
                buffers: &[POS3_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil(false, wgpu::CompareFunction::LessEqual)),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_grid"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        // Pass 2c: classification markers, depth writes restored.
        let marker_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("marker-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_marker"),
                buffers: &[MARKER_CORNER_LAYOUT, MARKER_INSTANCE_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(depth_stencil(true, wgpu::CompareFunction::Less)),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_marker"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        // Query-strategy probe: point primitives, depth test only, no
        // fragment stage and no color target.
        let probe_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("probe-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_probe"),
                buffers: &[POS3_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::PointList,
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil(false, wgpu::CompareFunction::Less)),
            multisample: wgpu::MultisampleState::default(),
            fragment: None,
            cache: None,
            multiview: None,
        });

        let depth_texture = create_depth_texture(device, width, height);
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            depth_only_pipeline,
            fill_pipeline,
            grid_pipeline,
            marker_pipeline,
            probe_pipeline,
            uniform_buffer,
            bind_group,
            plane_vb,
            grid_vb,
            grid_vertex_count: grid_vertices.len() as u32,
            marker_quad_vb,
            marker_instance_vb,
            probe_vb,
            point_count: scene_data.points.len() as u32,
            depth_texture,
            depth_view,
        }
    }

    /// Recreate the depth attachment after a surface resize. The viewport
    /// handed to projection math must be refreshed by the caller as well.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = create_depth_texture(device, width, height);
        self.depth_view = self
            .depth_texture
            .create_view(&wgpu::TextureViewDescriptor::default());
    }

    pub fn update_uniforms(&self, queue: &wgpu::Queue, view_proj: Mat4, viewport: Viewport) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&SceneUniforms::new(view_proj, viewport)),
        );
    }

    pub fn update_markers(
        &self,
        queue: &wgpu::Queue,
        scene_data: &SceneData,
        results: Option<&[bool]>,
    ) {
        let instances = marker_instances(scene_data, results);
        queue.write_buffer(&self.marker_instance_vb, 0, bytemuck::cast_slice(&instances));
    }

    /// Pass 1: rasterize the occluder into a cleared depth buffer. Runs in
    /// its own submission so a pending test sees the occluder's depth and
    /// nothing else.
    pub fn encode_depth_pass(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("occluder-depth-pass"),
            color_attachments: &[],
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
        rpass.set_pipeline(&self.depth_only_pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.plane_vb.slice(..));
        rpass.draw(0..6, 0..1);
    }

    /// Passes 2a-2c: translucent fill, grid overlay, then markers, all over
    /// the depth buffer produced by [`Self::encode_depth_pass`].
    pub fn encode_color_pass(&self, encoder: &mut wgpu::CommandEncoder, color_view: &wgpu::TextureView) {
        let [r, g, b, a] = constants::CLEAR_COLOR;
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene-color-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        rpass.set_pipeline(&self.fill_pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.plane_vb.slice(..));
        rpass.draw(0..6, 0..1);

        rpass.set_pipeline(&self.grid_pipeline);
        rpass.set_vertex_buffer(0, self.grid_vb.slice(..));
        rpass.draw(0..self.grid_vertex_count, 0..1);

        rpass.set_pipeline(&self.marker_pipeline);
        rpass.set_vertex_buffer(0, self.marker_quad_vb.slice(..));
        rpass.set_vertex_buffer(1, self.marker_instance_vb.slice(..));
        rpass.draw(0..6, 0..self.point_count);
    }

    pub fn depth_texture(&self) -> &wgpu::Texture {
        &self.depth_texture
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub fn probe_pipeline(&self) -> &wgpu::RenderPipeline {
        &self.probe_pipeline
    }

    pub fn probe_vb(&self) -> &wgpu::Buffer {
        &self.probe_vb
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn point_count(&self) -> u32 {
        self.point_count
    }
}
