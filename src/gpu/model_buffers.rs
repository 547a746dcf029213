//! Per-model GPU resources with explicit release.

use wgpu::util::DeviceExt;

use super::mesh_pass::MeshPass;
use super::texture::SampledTexture;
use crate::loader::LoadId;
use crate::mesh::RenderableMesh;
use crate::texture::TextureImage;

/// Interleaved corner vertex.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Position.
    pub position: [f32; 3],
    /// Unit normal.
    pub normal: [f32; 3],
    /// Texture coordinate (0,0 when the mesh has none).
    pub uv: [f32; 2],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    /// Vertex buffer layout matching `mesh.wgsl`.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Interleave the corner buffers of `mesh`.
///
/// Only whole triangles are emitted. Ingested meshes carry one normal per
/// corner and either one UV per corner or none; corners past the end of a
/// shorter buffer get `+Y` / `(0, 0)`.
#[must_use]
pub fn interleave(mesh: &RenderableMesh) -> Vec<MeshVertex> {
    let count = mesh.triangle_count() * 3;
    (0..count)
        .map(|i| {
            let position = [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ];
            let normal = mesh
                .normals
                .get(i * 3..i * 3 + 3)
                .map_or([0.0, 1.0, 0.0], |n| [n[0], n[1], n[2]]);
            let uv = mesh
                .tex_coords
                .get(i * 2..i * 2 + 2)
                .map_or([0.0, 0.0], |t| [t[0], t[1]]);
            MeshVertex {
                position,
                normal,
                uv,
            }
        })
        .collect()
}

/// GPU copy of one model.
pub struct GpuModel {
    /// Load that produced the model.
    pub id: LoadId,
    vertex_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    texture: Option<SampledTexture>,
    /// Bind group for the texture (or the fallback texture).
    pub texture_bind_group: wgpu::BindGroup,
}

impl GpuModel {
    /// Upload `mesh` and its optional texture, binding it the way `pass`
    /// expects.
    #[must_use]
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pass: &MeshPass,
        id: LoadId,
        mesh: &RenderableMesh,
        image: Option<&TextureImage>,
    ) -> Self {
        let vertices = interleave(mesh);
        let vertex_buffer = (!vertices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Model Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        let max_side = device.limits().max_texture_dimension_2d;
        let texture = image.map(|image| {
            let scaled = image.fit_within(max_side);
            SampledTexture::upload(
                device,
                queue,
                scaled.as_ref().unwrap_or(image),
                "Model Texture",
            )
        });
        let texture_bind_group = pass.texture_bind_group(
            device,
            texture.as_ref().map(|t| &t.view),
        );

        log::debug!(
            "uploaded model {id}: {} vertices{}",
            vertices.len(),
            if texture.is_some() { ", textured" } else { "" }
        );

        Self {
            id,
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            texture,
            texture_bind_group,
        }
    }

    /// Whether a texture was uploaded.
    #[must_use]
    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    /// Vertex buffer and vertex count, if there is anything to draw.
    #[must_use]
    pub fn vertices(&self) -> Option<(&wgpu::Buffer, u32)> {
        self.vertex_buffer.as_ref().map(|b| (b, self.vertex_count))
    }

    /// Destroy the buffer and texture. The model must not be drawn after.
    pub fn release(self) {
        if let Some(buffer) = &self.vertex_buffer {
            buffer.destroy();
        }
        if let Some(texture) = &self.texture {
            texture.destroy();
        }
        log::debug!("released GPU resources of model {}", self.id);
    }
}
