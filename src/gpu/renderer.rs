//! Frame rendering for a [`ViewerSession`].

use super::grid::GridLines;
use super::mesh_pass::{DrawParams, LightingUniform, MeshPass, PipelineKey};
use super::model_buffers::GpuModel;
use super::render_context::RenderContext;
use super::texture::DepthTarget;
use crate::camera::Camera;
use crate::session::ViewerSession;

/// Owns the GPU context, the mesh pass, the grid, and the uploaded model.
pub struct ModelRenderer {
    context: RenderContext,
    depth: DepthTarget,
    pass: MeshPass,
    model: Option<GpuModel>,
    grid: Option<GridLines>,
    warned_wireframe: bool,
}

impl ModelRenderer {
    /// Build the renderer on an initialized context.
    #[must_use]
    pub fn new(context: RenderContext) -> Self {
        let depth = DepthTarget::new(
            &context.device,
            context.config.width,
            context.config.height,
        );
        let pass = MeshPass::new(
            &context.device,
            &context.queue,
            context.format(),
            context.wireframe_supported,
        );
        Self {
            context,
            depth,
            pass,
            model: None,
            grid: None,
            warned_wireframe: false,
        }
    }

    /// Resize the surface and depth target. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.context.resize(width, height);
        self.depth = DepthTarget::new(&self.context.device, width, height);
    }

    /// Release retired models and upload the session's model if it is new,
    /// reporting the upload back to the session.
    pub fn sync(&mut self, session: &mut ViewerSession) {
        for retired in session.drain_retired() {
            if self.model.as_ref().is_some_and(|m| m.id == retired.id) {
                if let Some(model) = self.model.take() {
                    model.release();
                }
            }
        }

        let Some(current) = session.model() else {
            return;
        };
        if self.model.as_ref().is_some_and(|m| m.id == current.id) {
            return;
        }
        if let Some(stale) = self.model.take() {
            stale.release();
        }
        self.model = Some(GpuModel::upload(
            &self.context.device,
            &self.context.queue,
            &self.pass,
            current.id,
            &current.mesh,
            current.texture.as_ref(),
        ));
        session.mark_uploaded(current.id);
    }

    /// Keep the grid buffer in step with the display options.
    fn sync_grid(&mut self, half_lines: u32, spacing: f32) {
        if self.grid.as_ref().is_some_and(|g| g.matches(half_lines, spacing)) {
            return;
        }
        if let Some(old) = self.grid.take() {
            old.release();
        }
        self.grid =
            Some(GridLines::new(&self.context.device, half_lines, spacing));
    }

    /// Draw one frame with `camera`.
    pub fn render(&mut self, session: &ViewerSession, camera: &Camera) {
        let display = &session.options().display;
        let wireframe_supported = self.pass.supports_wireframe();
        if display.wireframe && !wireframe_supported && !self.warned_wireframe {
            log::warn!("wireframe is not supported on this adapter");
            self.warned_wireframe = true;
        }

        let textured = self.model.as_ref().is_some_and(GpuModel::has_texture);
        let material = session
            .model()
            .map(|m| m.mesh.material)
            .unwrap_or_default();
        let lighting = LightingUniform::new(display, &material, textured);
        self.pass.update(&self.context.queue, camera, &lighting);
        let key = PipelineKey::select(display, &material, wireframe_supported);
        if display.show_grid {
            self.sync_grid(display.grid_half_lines, display.grid_spacing);
        }

        let frame = match self.context.get_next_frame() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.context.reconfigure();
                return;
            }
            Err(e) => {
                log::error!("failed to acquire frame: {e}");
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.context.create_encoder();
        let params = DrawParams {
            background: display.background,
            model: self.model.as_ref(),
            key,
            grid: self.grid.as_ref().filter(|_| display.show_grid),
        };
        self.pass.draw(&mut encoder, &view, &self.depth.view, &params);
        self.context.submit(encoder);
        frame.present();
    }

    /// Release the uploaded model and grid, e.g. before shutdown.
    pub fn release_model(&mut self) {
        if let Some(model) = self.model.take() {
            model.release();
        }
        if let Some(grid) = self.grid.take() {
            grid.release();
        }
    }
}
