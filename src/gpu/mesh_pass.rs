//! The lit mesh pass: pipelines, uniforms, the ground grid, and the draw
//! call.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use super::grid::{GridLines, GridVertex};
use super::model_buffers::{GpuModel, MeshVertex};
use super::pipeline_helpers::{
    filtering_sampler, repeat_linear_sampler, texture_2d, uniform_buffer,
};
use super::texture::{SampledTexture, DEPTH_FORMAT};
use crate::camera::{Camera, CameraUniform};
use crate::mesh::MeshMaterial;
use crate::options::DisplayOptions;
use crate::texture::TextureImage;

/// Blinn-Phong exponent for a material roughness in `[0, 1]`. The default
/// roughness of 0.6 gives 32; fully smooth gives 2048.
#[must_use]
pub fn shininess(roughness: f32) -> f32 {
    let roughness = if roughness.is_finite() {
        roughness.clamp(0.0, 1.0)
    } else {
        1.0
    };
    (1.0 + 10.0 * (1.0 - roughness)).exp2()
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
/// Lighting and material parameters for `mesh.wgsl`.
pub struct LightingUniform {
    /// Point light position in world space.
    pub light_position: [f32; 3],
    /// Ambient term.
    pub ambient: f32,
    /// Surface color when untextured.
    pub base_color: [f32; 3],
    /// Diffuse weight.
    pub diffuse: f32,
    /// Specular weight.
    pub specular: f32,
    /// Specular exponent.
    pub shininess: f32,
    /// Tints the highlight with the surface color.
    pub metallic: f32,
    /// Output alpha multiplier.
    pub opacity: f32,
    /// 1 to sample the model texture, 0 for `base_color`.
    pub use_texture: u32,
    /// 1 to light back faces with the flipped normal.
    pub double_sided: u32,
    pub(crate) _pad: [f32; 2],
}

impl LightingUniform {
    /// Build from display options and the model material.
    #[must_use]
    pub fn new(
        display: &DisplayOptions,
        material: &MeshMaterial,
        textured: bool,
    ) -> Self {
        Self {
            light_position: display.light_position,
            ambient: display.ambient,
            base_color: material.base_color,
            diffuse: display.diffuse,
            specular: display.specular,
            shininess: shininess(material.roughness),
            metallic: material.metallic.clamp(0.0, 1.0),
            opacity: display.opacity,
            use_texture: u32::from(textured && display.show_texture),
            double_sided: u32::from(material.double_sided),
            _pad: [0.0; 2],
        }
    }
}

/// Which mesh pipeline variant draws the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    /// Rasterize edges only.
    pub wireframe: bool,
    /// Cull back faces.
    pub cull_back: bool,
    /// Alpha-blend without writing depth.
    pub blended: bool,
}

impl PipelineKey {
    /// Variant for the current display settings and material. Translucent
    /// models are never culled so their far side shows through.
    #[must_use]
    pub fn select(
        display: &DisplayOptions,
        material: &MeshMaterial,
        wireframe_supported: bool,
    ) -> Self {
        let blended = display.is_translucent();
        Self {
            wireframe: display.wireframe && wireframe_supported,
            cull_back: !material.double_sided && !blended,
            blended,
        }
    }

    fn all(wireframe_supported: bool) -> impl Iterator<Item = Self> {
        let wire = if wireframe_supported {
            &[false, true][..]
        } else {
            &[false][..]
        };
        wire.iter().flat_map(|&wireframe| {
            [
                Self { wireframe, cull_back: false, blended: false },
                Self { wireframe, cull_back: true, blended: false },
                Self { wireframe, cull_back: false, blended: true },
            ]
        })
    }

    fn label(self) -> &'static str {
        match (self.wireframe, self.cull_back, self.blended) {
            (false, false, false) => "Mesh Pipeline",
            (false, true, _) => "Mesh Culled Pipeline",
            (false, false, true) => "Mesh Blended Pipeline",
            (true, false, false) => "Mesh Wireframe Pipeline",
            (true, true, _) => "Mesh Culled Wireframe Pipeline",
            (true, false, true) => "Mesh Blended Wireframe Pipeline",
        }
    }
}

/// Per-frame inputs to [`MeshPass::draw`].
pub struct DrawParams<'a> {
    /// Clear color.
    pub background: [f32; 3],
    /// Model to draw, if any.
    pub model: Option<&'a GpuModel>,
    /// Pipeline variant for the model.
    pub key: PipelineKey,
    /// Grid drawn under the model, if shown.
    pub grid: Option<&'a GridLines>,
}

/// Pipelines and shared bindings for drawing one model.
pub struct MeshPass {
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    grid_pipeline: wgpu::RenderPipeline,
    wireframe_supported: bool,
    camera_buffer: wgpu::Buffer,
    lighting_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    fallback: SampledTexture,
}

impl MeshPass {
    /// Build the pass for a surface of `format`. Wireframe variants are
    /// only created when `wireframe_supported`.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        wireframe_supported: bool,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("shaders/mesh.wgsl").into(),
            ),
        });

        let camera_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::cast_slice(&[CameraUniform::new()]),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });
        let lighting = LightingUniform::new(
            &DisplayOptions::default(),
            &MeshMaterial::default(),
            false,
        );
        let lighting_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Lighting Buffer"),
                contents: bytemuck::cast_slice(&[lighting]),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });

        let uniform_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Mesh Uniform Layout"),
                entries: &[uniform_buffer(0), uniform_buffer(1)],
            });
        let uniform_bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Mesh Uniform Bind Group"),
                layout: &uniform_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: camera_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: lighting_buffer.as_entire_binding(),
                    },
                ],
            });

        let texture_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Mesh Texture Layout"),
                entries: &[texture_2d(0), filtering_sampler(1)],
            });

        let layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Mesh Pipeline Layout"),
                bind_group_layouts: &[&uniform_layout, &texture_layout],
                push_constant_ranges: &[],
            });

        let pipelines = PipelineKey::all(wireframe_supported)
            .map(|key| {
                (key, create_pipeline(device, &layout, &shader, format, key))
            })
            .collect();

        let grid_shader =
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Grid Shader"),
                source: wgpu::ShaderSource::Wgsl(
                    include_str!("shaders/grid.wgsl").into(),
                ),
            });
        let grid_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Grid Pipeline Layout"),
                bind_group_layouts: &[&uniform_layout],
                push_constant_ranges: &[],
            });
        let grid_pipeline =
            create_grid_pipeline(device, &grid_layout, &grid_shader, format);

        let fallback = SampledTexture::upload(
            device,
            queue,
            &TextureImage::solid([255, 255, 255, 255]),
            "Fallback Texture",
        );

        Self {
            pipelines,
            grid_pipeline,
            wireframe_supported,
            camera_buffer,
            lighting_buffer,
            uniform_bind_group,
            texture_layout,
            sampler: repeat_linear_sampler(device, "Model Sampler"),
            fallback,
        }
    }

    /// Bind group for a model texture, or the white fallback when `None`.
    #[must_use]
    pub fn texture_bind_group(
        &self,
        device: &wgpu::Device,
        view: Option<&wgpu::TextureView>,
    ) -> wgpu::BindGroup {
        let view = view.unwrap_or(&self.fallback.view);
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Texture Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Whether line rasterization is available.
    #[must_use]
    pub fn supports_wireframe(&self) -> bool {
        self.wireframe_supported
    }

    /// Write this frame's camera and lighting.
    pub fn update(
        &self,
        queue: &wgpu::Queue,
        camera: &Camera,
        lighting: &LightingUniform,
    ) {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera);
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[uniform]),
        );
        queue.write_buffer(
            &self.lighting_buffer,
            0,
            bytemuck::cast_slice(&[*lighting]),
        );
    }

    /// Clear, draw the grid (if any), then the model (if any).
    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        params: &DrawParams<'_>,
    ) {
        let background = params.background;
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Mesh Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: f64::from(background[0]),
                        g: f64::from(background[1]),
                        b: f64::from(background[2]),
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(
                wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                },
            ),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        if let Some(grid) = params.grid {
            let (vertices, count) = grid.vertices();
            pass.set_pipeline(&self.grid_pipeline);
            pass.set_vertex_buffer(0, vertices.slice(..));
            pass.draw(0..count, 0..1);
        }

        let Some(model) = params.model else { return };
        let Some((vertices, count)) = model.vertices() else {
            return;
        };
        let Some(pipeline) = self.pipelines.get(&params.key) else {
            return;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(1, &model.texture_bind_group, &[]);
        pass.set_vertex_buffer(0, vertices.slice(..));
        pass.draw(0..count, 0..1);
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    key: PipelineKey,
) -> wgpu::RenderPipeline {
    let blend = if key.blended {
        wgpu::BlendState::ALPHA_BLENDING
    } else {
        wgpu::BlendState::REPLACE
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(key.label()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[MeshVertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: key.cull_back.then_some(wgpu::Face::Back),
            polygon_mode: if key.wireframe {
                wgpu::PolygonMode::Line
            } else {
                wgpu::PolygonMode::Fill
            },
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: !key.blended,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Grid lines test against the model's depth but never write it.
fn create_grid_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Grid Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[GridVertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::LineList,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
