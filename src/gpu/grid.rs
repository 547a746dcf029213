//! Ground grid on the `y = 0` plane.

use wgpu::util::DeviceExt;

/// Gray of the two lines through the origin.
const AXIS_GRAY: f32 = 0.5;
/// Gray of every other line.
const LINE_GRAY: f32 = 0.3;

/// Colored line endpoint.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GridVertex {
    /// Position on the ground plane.
    pub position: [f32; 3],
    /// Linear RGB.
    pub color: [f32; 3],
}

impl GridVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Vertex buffer layout matching `grid.wgsl`.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Line-list vertices for a square grid with `half_lines` lines on each
/// side of the origin, `spacing` apart, in both X and Z.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
pub fn grid_vertices(half_lines: u32, spacing: f32) -> Vec<GridVertex> {
    let half = half_lines as i32;
    let extent = half as f32 * spacing;
    let mut vertices = Vec::with_capacity((2 * half_lines as usize + 1) * 4);
    for i in -half..=half {
        let offset = i as f32 * spacing;
        let gray = if i == 0 { AXIS_GRAY } else { LINE_GRAY };
        let color = [gray; 3];
        // Parallel to X, then parallel to Z.
        for (a, b) in [
            ([-extent, 0.0, offset], [extent, 0.0, offset]),
            ([offset, 0.0, -extent], [offset, 0.0, extent]),
        ] {
            vertices.push(GridVertex { position: a, color });
            vertices.push(GridVertex { position: b, color });
        }
    }
    vertices
}

/// Uploaded grid lines, rebuilt when the grid layout changes.
pub struct GridLines {
    buffer: wgpu::Buffer,
    count: u32,
    half_lines: u32,
    spacing: f32,
}

impl GridLines {
    /// Upload a grid of `half_lines` lines per side, `spacing` apart.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(device: &wgpu::Device, half_lines: u32, spacing: f32) -> Self {
        let vertices = grid_vertices(half_lines, spacing);
        let buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Grid Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Self {
            buffer,
            count: vertices.len() as u32,
            half_lines,
            spacing,
        }
    }

    /// Whether this grid was built with the given layout.
    #[must_use]
    pub fn matches(&self, half_lines: u32, spacing: f32) -> bool {
        self.half_lines == half_lines && self.spacing == spacing
    }

    /// Vertex buffer and vertex count.
    #[must_use]
    pub fn vertices(&self) -> (&wgpu::Buffer, u32) {
        (&self.buffer, self.count)
    }

    /// Destroy the vertex buffer.
    pub fn release(self) {
        self.buffer.destroy();
    }
}
