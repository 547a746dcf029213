//! GPU resource management: device/surface setup, per-model buffers with
//! explicit release, the ground grid, and the mesh draw pass.

/// Ground grid vertices and buffer.
pub mod grid;
/// Interleaved vertex buffers and textures for one model.
pub mod model_buffers;
/// Lit mesh pipeline, uniforms, and draw call.
pub mod mesh_pass;
/// Shared wgpu boilerplate helpers.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// Frame rendering driven by a viewer session.
pub mod renderer;
/// Depth target and sampled textures.
pub mod texture;

pub use render_context::{RenderContext, RenderContextError};
pub use renderer::ModelRenderer;
