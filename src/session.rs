//! Viewer session: everything the frame loop mutates, in one place.
//!
//! The session owns the options, the orbit controller, the attached model,
//! and the last-load-wins bookkeeping for background loads. Hosts drive it
//! with input events and one [`ViewerSession::frame`] call per frame.
//!
//! Hosts that upload models to the GPU call
//! [`ViewerSession::mark_uploaded`] after each upload and drain
//! [`ViewerSession::drain_retired`] every frame. Only uploaded models are
//! retired; a model replaced before it was ever uploaded is dropped at once,
//! so headless hosts that never upload never accumulate retired models.

use std::path::PathBuf;

use crate::camera::{Camera, OrbitCameraController};
use crate::error::{TransportError, ViewerError};
use crate::input::{InputEvent, KeyAction};
use crate::loader::{LoadEvent, LoadId, LoadRequest, LoadWorker, ModelSource};
use crate::mesh::RenderableMesh;
use crate::options::Options;
use crate::texture::TextureImage;

/// The attached model.
#[derive(Debug)]
pub struct Model {
    /// Load that produced it.
    pub id: LoadId,
    /// Short name for titles.
    pub name: String,
    /// Ingested geometry.
    pub mesh: RenderableMesh,
    /// Decoded texture, if any.
    pub texture: Option<TextureImage>,
    /// Where the texture came from.
    pub texture_path: Option<PathBuf>,
}

/// Counts shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelStats {
    /// Corner vertices uploaded.
    pub vertices: usize,
    /// Triangles drawn.
    pub faces: usize,
    /// Whether a texture is attached.
    pub textured: bool,
    /// Face corners skipped for bad position references.
    pub dropped_corners: usize,
}

/// Where loading stands, for titles and overlays.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// Nothing requested yet.
    Idle,
    /// A load is running.
    Loading {
        /// Latest request.
        id: LoadId,
        /// Latest progress message.
        message: String,
    },
    /// The latest request is attached.
    Ready,
    /// The latest request failed.
    Failed(String),
}

/// What applying a load event did.
#[derive(Debug)]
pub enum LoadUpdate {
    /// Progress for the latest request; the status text changed.
    Progress,
    /// A new model replaced the previous one.
    Attached(LoadId),
    /// The latest request failed.
    Failed(LoadId),
    /// The event belonged to a superseded request and was dropped.
    Stale(LoadId),
}

/// Result of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The key is not bound.
    Unbound,
    /// A bound action ran.
    Handled(KeyAction),
    /// The host should close.
    Quit,
}

/// Explicit session state shared by input handling, loading and rendering.
pub struct ViewerSession {
    options: Options,
    controller: OrbitCameraController,
    model: Option<Model>,
    retired: Vec<Model>,
    uploaded: Option<LoadId>,
    worker: Option<LoadWorker>,
    latest: Option<LoadId>,
    next_id: u64,
    status: LoadStatus,
    pending_name: String,
}

impl ViewerSession {
    /// New session for a `width` x `height` viewport.
    #[must_use]
    pub fn new(options: Options, width: u32, height: u32) -> Self {
        let controller =
            OrbitCameraController::new(&options.camera, width, height);
        Self {
            options,
            controller,
            model: None,
            retired: Vec::new(),
            uploaded: None,
            worker: None,
            latest: None,
            next_id: 1,
            status: LoadStatus::Idle,
            pending_name: String::new(),
        }
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Replace the options, pushing camera settings to the controller.
    pub fn set_options(&mut self, options: Options) {
        self.controller.set_options(&options.camera);
        self.options = options;
    }

    /// The orbit controller.
    #[must_use]
    pub fn controller(&self) -> &OrbitCameraController {
        &self.controller
    }

    /// Mutable orbit controller, for hosts that feed it directly.
    pub fn controller_mut(&mut self) -> &mut OrbitCameraController {
        &mut self.controller
    }

    /// The attached model.
    #[must_use]
    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Loading status.
    #[must_use]
    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Counts for the attached model.
    #[must_use]
    pub fn stats(&self) -> Option<ModelStats> {
        self.model.as_ref().map(|m| ModelStats {
            vertices: m.mesh.vertex_count(),
            faces: m.mesh.triangle_count(),
            textured: m.texture.is_some(),
            dropped_corners: m.mesh.report.dropped_corners,
        })
    }

    /// Window title reflecting the status and model.
    #[must_use]
    pub fn title(&self) -> String {
        match (&self.status, &self.model) {
            (LoadStatus::Loading { message, .. }, _) => {
                format!("scanview - {} - {message}", self.pending_name)
            }
            (LoadStatus::Failed(msg), _) => format!("scanview - error: {msg}"),
            (_, Some(model)) => {
                let stats = self.stats().unwrap_or(ModelStats {
                    vertices: 0,
                    faces: 0,
                    textured: false,
                    dropped_corners: 0,
                });
                format!(
                    "scanview - {} ({} vertices, {} faces{})",
                    model.name,
                    stats.vertices,
                    stats.faces,
                    if stats.textured { ", textured" } else { "" }
                )
            }
            _ => "scanview".to_owned(),
        }
    }

    fn allocate_id(&mut self) -> LoadId {
        let id = LoadId(self.next_id);
        self.next_id += 1;
        self.latest = Some(id);
        id
    }

    /// Start loading `source` in the background. Any earlier request is
    /// superseded: its result will be dropped even if it arrives later.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::ThreadSpawn`] if the worker thread cannot be
    /// started.
    pub fn request_load(
        &mut self,
        source: ModelSource,
        texture: Option<PathBuf>,
    ) -> Result<LoadId, ViewerError> {
        if self.worker.is_none() {
            self.worker = Some(LoadWorker::new()?);
        }
        let id = self.allocate_id();
        self.pending_name = source.display_name();
        self.status = LoadStatus::Loading {
            id,
            message: "Loading...".to_owned(),
        };
        let request = LoadRequest {
            source,
            texture,
            options: self.options.ingest.clone(),
        };
        if let Some(worker) = self.worker.as_mut() {
            worker.submit(id, request);
        }
        Ok(id)
    }

    /// Attach an already ingested mesh, superseding any background load.
    pub fn attach_mesh(
        &mut self,
        name: &str,
        mesh: RenderableMesh,
        texture: Option<TextureImage>,
    ) -> LoadId {
        if let Some(worker) = self.worker.as_mut() {
            worker.cancel_in_flight();
        }
        let id = self.allocate_id();
        self.attach(Model {
            id,
            name: name.to_owned(),
            mesh,
            texture,
            texture_path: None,
        });
        id
    }

    /// Apply every worker event that has arrived.
    pub fn poll_loads(&mut self) -> Vec<LoadUpdate> {
        let mut events = Vec::new();
        if let Some(worker) = &self.worker {
            while let Some(event) = worker.try_recv() {
                events.push(event);
            }
        }
        events
            .into_iter()
            .map(|event| self.apply_event(event))
            .collect()
    }

    /// Apply one worker event. Only events for the latest request change
    /// anything.
    pub fn apply_event(&mut self, event: LoadEvent) -> LoadUpdate {
        let id = event.id();
        if self.latest != Some(id) {
            if let LoadEvent::Failed { error, .. } = &event {
                log::debug!("load {id} superseded: {error}");
            } else if event.is_terminal() {
                log::debug!("dropping result of superseded load {id}");
            }
            return LoadUpdate::Stale(id);
        }

        match event {
            LoadEvent::Progress {
                percent, total, loaded, ..
            } => {
                let message = if total > 0 {
                    format!("Loading: {percent:.0}%")
                } else {
                    format!("Loading: {} KB", loaded / 1024)
                };
                self.status = LoadStatus::Loading { id, message };
                LoadUpdate::Progress
            }
            LoadEvent::ParseProgress { message, .. } => {
                self.status = LoadStatus::Loading { id, message };
                LoadUpdate::Progress
            }
            LoadEvent::Loaded {
                mesh,
                texture,
                texture_path,
                ..
            } => {
                let name = std::mem::take(&mut self.pending_name);
                self.attach(Model {
                    id,
                    name,
                    mesh: *mesh,
                    texture,
                    texture_path,
                });
                LoadUpdate::Attached(id)
            }
            LoadEvent::Failed { error, .. } => {
                if matches!(
                    error,
                    ViewerError::Transport(TransportError::Cancelled)
                ) {
                    return LoadUpdate::Stale(id);
                }
                log::error!("load {id} failed: {error}");
                self.status = LoadStatus::Failed(error.to_string());
                LoadUpdate::Failed(id)
            }
        }
    }

    fn attach(&mut self, model: Model) {
        if let Some(bounds) = model.mesh.bounds() {
            self.controller.fit_to_bounds(&bounds);
        }
        if let Some(old) = self.model.replace(model) {
            if self.uploaded == Some(old.id) {
                self.retired.push(old);
            } else {
                log::debug!("model {} replaced before upload", old.id);
            }
        }
        self.uploaded = None;
        self.status = LoadStatus::Ready;
    }

    /// Record that the model produced by `id` now has GPU resources. When
    /// it is replaced it will be handed out by
    /// [`drain_retired`](Self::drain_retired).
    pub fn mark_uploaded(&mut self, id: LoadId) {
        if self.model.as_ref().is_some_and(|m| m.id == id) {
            self.uploaded = Some(id);
        }
    }

    /// Uploaded models replaced since the last call. Their GPU resources
    /// should be released before they are dropped.
    pub fn drain_retired(&mut self) -> Vec<Model> {
        std::mem::take(&mut self.retired)
    }

    /// Track a resized viewport.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.controller.set_viewport(width, height);
    }

    /// Route an input event to key bindings or the camera.
    pub fn handle_input(&mut self, event: &InputEvent) -> KeyOutcome {
        match event {
            InputEvent::Key { code } => self.handle_key(code),
            other => {
                let _ = self.controller.handle_input(other);
                KeyOutcome::Unbound
            }
        }
    }

    /// Run the action bound to `code`, if any.
    pub fn handle_key(&mut self, code: &str) -> KeyOutcome {
        let Some(action) = self.options.keybindings.lookup(code) else {
            return KeyOutcome::Unbound;
        };
        match action {
            KeyAction::ResetCamera => self.controller.reset(),
            KeyAction::FitToModel => {
                if let Some(bounds) =
                    self.model.as_ref().and_then(|m| m.mesh.bounds())
                {
                    self.controller.fit_to_bounds(&bounds);
                }
            }
            KeyAction::ToggleTexture => {
                let display = &mut self.options.display;
                display.show_texture = !display.show_texture;
                log::info!("texture {}", on_off(display.show_texture));
            }
            KeyAction::ToggleWireframe => {
                let display = &mut self.options.display;
                display.wireframe = !display.wireframe;
                log::info!("wireframe {}", on_off(display.wireframe));
            }
            KeyAction::ToggleAutoRotate => {
                let on = self.controller.toggle_auto_rotate();
                log::info!("auto-rotate {}", on_off(on));
            }
            KeyAction::ToggleGrid => {
                let display = &mut self.options.display;
                display.show_grid = !display.show_grid;
                log::info!("grid {}", on_off(display.show_grid));
            }
            KeyAction::ToggleFullscreen => {
                let display = &mut self.options.display;
                display.fullscreen = !display.fullscreen;
                log::info!("fullscreen {}", on_off(display.fullscreen));
            }
            KeyAction::OpacityUp | KeyAction::OpacityDown => {
                let steps = if action == KeyAction::OpacityUp { 1 } else { -1 };
                self.options.display.step_opacity(steps);
                log::info!("opacity {:.1}", self.options.display.opacity);
            }
            KeyAction::Quit => return KeyOutcome::Quit,
            preset => {
                if let Some(opacity) = preset.opacity_preset() {
                    self.options.display.set_opacity(opacity);
                    log::info!("opacity {opacity:.1}");
                }
            }
        }
        KeyOutcome::Handled(action)
    }

    /// Advance the camera one frame and return it for rendering.
    pub fn frame(&mut self) -> Camera {
        let _ = self.controller.update();
        *self.controller.camera()
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use glam::Vec3;

    use super::*;
    use crate::input::MouseButton;
    use crate::mesh::ingest_str;
    use crate::options::IngestOptions;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    fn session() -> ViewerSession {
        ViewerSession::new(Options::default(), 800, 600)
    }

    fn mesh(text: &str) -> RenderableMesh {
        let raw = IngestOptions {
            normalize: false,
            ..IngestOptions::default()
        };
        ingest_str(text, &raw).unwrap()
    }

    fn loaded(id: LoadId, text: &str) -> LoadEvent {
        LoadEvent::Loaded {
            id,
            mesh: Box::new(mesh(text)),
            texture: None,
            texture_path: None,
        }
    }

    #[test]
    fn only_the_latest_request_attaches() {
        let mut s = session();
        let old = s.allocate_id();
        let new = s.allocate_id();

        assert!(matches!(
            s.apply_event(loaded(old, TRIANGLE)),
            LoadUpdate::Stale(_)
        ));
        assert!(s.model().is_none());

        assert!(matches!(
            s.apply_event(loaded(new, TRIANGLE)),
            LoadUpdate::Attached(id) if id == new
        ));
        assert_eq!(s.model().unwrap().id, new);
    }

    #[test]
    fn late_result_never_replaces_a_newer_model() {
        let mut s = session();
        let first = s.allocate_id();
        let second = s.attach_mesh("direct", mesh(TRIANGLE), None);
        assert!(second > first);

        let update = s.apply_event(loaded(first, TRIANGLE));
        assert!(matches!(update, LoadUpdate::Stale(_)));
        assert_eq!(s.model().unwrap().name, "direct");
        assert_eq!(s.status(), &LoadStatus::Ready);
    }

    #[test]
    fn replaced_models_are_retired_once() {
        let mut s = session();
        let a = s.attach_mesh("a", mesh(TRIANGLE), None);
        s.mark_uploaded(a);
        let _ = s.attach_mesh("b", mesh(TRIANGLE), None);
        let retired = s.drain_retired();
        assert_eq!(retired.len(), 1);
        assert_eq!(retired[0].id, a);
        assert!(s.drain_retired().is_empty());
    }

    #[test]
    fn models_never_uploaded_are_not_retained() {
        let mut s = session();
        for name in ["a", "b", "c", "d"] {
            let _ = s.attach_mesh(name, mesh(TRIANGLE), None);
        }
        assert!(s.drain_retired().is_empty());

        // Marking a model that is no longer attached has no effect.
        let stale = s.model().unwrap().id;
        let current = s.attach_mesh("e", mesh(TRIANGLE), None);
        s.mark_uploaded(stale);
        let _ = s.attach_mesh("f", mesh(TRIANGLE), None);
        assert!(s.drain_retired().is_empty());

        let g = s.attach_mesh("g", mesh(TRIANGLE), None);
        assert!(g > current);
        s.mark_uploaded(g);
        let _ = s.attach_mesh("h", mesh(TRIANGLE), None);
        assert_eq!(s.drain_retired().len(), 1);
    }

    #[test]
    fn stale_progress_and_failures_are_ignored() {
        let mut s = session();
        let old = s.allocate_id();
        let _new = s.allocate_id();
        let update = s.apply_event(LoadEvent::ParseProgress {
            id: old,
            message: "Parsing: 50%".into(),
        });
        assert!(matches!(update, LoadUpdate::Stale(_)));
        let update = s.apply_event(LoadEvent::Failed {
            id: old,
            error: ViewerError::Viewer("boom".into()),
        });
        assert!(matches!(update, LoadUpdate::Stale(_)));
        assert_eq!(s.status(), &LoadStatus::Idle);
    }

    #[test]
    fn failure_of_latest_sets_status() {
        let mut s = session();
        let id = s.allocate_id();
        let update = s.apply_event(LoadEvent::Failed {
            id,
            error: ViewerError::Viewer("boom".into()),
        });
        assert!(matches!(update, LoadUpdate::Failed(_)));
        assert!(matches!(s.status(), LoadStatus::Failed(_)));
        assert!(s.title().contains("boom"));
    }

    #[test]
    fn attaching_fits_the_camera() {
        let mut s = session();
        let far = "v 100 0 0\nv 101 0 0\nv 100 1 0\nf 1 2 3\n";
        let _ = s.attach_mesh("far", mesh(far), None);
        let target = s.controller().camera().pose.target;
        assert!((target - Vec3::new(100.5, 0.5, 0.0)).length() < 1e-4);
    }

    #[test]
    fn large_scans_are_viewable_with_defaults() {
        let text = "v -500 -500 0\nv 500 -500 0\nv 0 500 0\nf 1 2 3\n";
        let mut s = session();
        let scan = ingest_str(text, &IngestOptions::default()).unwrap();
        let radius = scan.bounds().unwrap().radius();
        assert!(radius <= 2.0 * 3f32.sqrt() + 1e-4);

        let _ = s.attach_mesh("scan", scan, None);
        let camera = s.frame();
        assert!(camera.pose.distance() > radius);
        assert!(camera.zfar > camera.pose.distance() + radius);
    }

    #[test]
    fn keys_drive_actions() {
        let mut s = session();
        assert!(s.options().display.show_texture);
        assert_eq!(
            s.handle_key("KeyT"),
            KeyOutcome::Handled(KeyAction::ToggleTexture)
        );
        assert!(!s.options().display.show_texture);

        assert_eq!(
            s.handle_key("KeyW"),
            KeyOutcome::Handled(KeyAction::ToggleWireframe)
        );
        assert!(s.options().display.wireframe);

        assert!(!s.controller().auto_rotate());
        let _ = s.handle_key("KeyA");
        assert!(s.controller().auto_rotate());

        assert!(s.options().display.show_grid);
        assert_eq!(
            s.handle_key("KeyG"),
            KeyOutcome::Handled(KeyAction::ToggleGrid)
        );
        assert!(!s.options().display.show_grid);

        assert!(!s.options().display.fullscreen);
        let _ = s.handle_key("KeyF");
        assert!(s.options().display.fullscreen);
        let _ = s.handle_key("KeyF");
        assert!(!s.options().display.fullscreen);

        assert_eq!(s.handle_key("Escape"), KeyOutcome::Quit);
        assert_eq!(s.handle_key("KeyQ"), KeyOutcome::Unbound);
    }

    #[test]
    fn opacity_keys_step_and_jump_to_presets() {
        let mut s = session();
        assert_eq!(s.options().display.opacity, 1.0);

        let _ = s.handle_key("Minus");
        let _ = s.handle_key("Minus");
        assert!((s.options().display.opacity - 0.8).abs() < 1e-6);

        assert_eq!(
            s.handle_key("Digit3"),
            KeyOutcome::Handled(KeyAction::Opacity30)
        );
        assert!((s.options().display.opacity - 0.3).abs() < 1e-6);

        for _ in 0..5 {
            let _ = s.handle_key("Minus");
        }
        assert!((s.options().display.opacity - 0.1).abs() < 1e-6);

        let _ = s.handle_key("Equal");
        assert!((s.options().display.opacity - 0.2).abs() < 1e-6);

        let _ = s.handle_key("Digit0");
        assert_eq!(s.options().display.opacity, 1.0);
        let _ = s.handle_key("Equal");
        assert_eq!(s.options().display.opacity, 1.0);
    }

    #[test]
    fn fit_key_refits_after_orbiting() {
        let mut s = session();
        let _ = s.attach_mesh("m", mesh(TRIANGLE), None);
        let fitted = s.controller().camera().pose.target;
        let controller = s.controller_mut();
        controller.pointer_down(MouseButton::Right, 0.0, 0.0);
        controller.pointer_move(200.0, 0.0);
        controller.pointer_up();
        for _ in 0..10 {
            let _ = s.frame();
        }
        assert_ne!(s.controller().camera().pose.target, fitted);

        assert_eq!(
            s.handle_key("KeyC"),
            KeyOutcome::Handled(KeyAction::FitToModel)
        );
        assert!((s.controller().camera().pose.target - fitted).length() < 1e-5);
    }

    #[test]
    fn reset_key_restores_the_fitted_view() {
        let mut s = session();
        let _ = s.attach_mesh("m", mesh(TRIANGLE), None);
        let home = s.controller().camera().pose;
        let _ = s.handle_input(&InputEvent::Scroll { delta: 1.0 });
        let _ = s.frame();
        assert_ne!(s.controller().camera().pose, home);
        let _ = s.handle_input(&InputEvent::Key {
            code: "KeyR".into(),
        });
        assert_eq!(s.controller().camera().pose, home);
    }

    #[test]
    fn background_load_attaches_through_poll() {
        let path = std::env::temp_dir()
            .join(format!("scanview-session-{}.obj", std::process::id()));
        std::fs::write(&path, TRIANGLE).unwrap();

        let mut s = session();
        let superseded = s
            .request_load(ModelSource::parse("/no/such/model.obj"), None)
            .unwrap();
        let id = s.request_load(ModelSource::File(path.clone()), None).unwrap();
        assert!(id > superseded);

        let deadline = Instant::now() + Duration::from_secs(10);
        while s.model().is_none() && Instant::now() < deadline {
            for update in s.poll_loads() {
                if let LoadUpdate::Failed(failed) = update {
                    assert_ne!(failed, id);
                }
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        let model = s.model().unwrap();
        assert_eq!(model.id, id);
        assert_eq!(s.stats().unwrap().faces, 1);
        assert_eq!(s.status(), &LoadStatus::Ready);

        let _ = std::fs::remove_file(path);
    }
}
