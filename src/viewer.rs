//! Standalone viewer window backed by winit.
//!
//! ```no_run
//! # use scanview::Viewer;
//! Viewer::builder()
//!     .with_model("scans/statue.obj")
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Fullscreen, Window, WindowId},
};

use crate::{
    error::ViewerError,
    gpu::{ModelRenderer, RenderContext},
    input::{event::scroll_notches, InputEvent, MouseButton},
    loader::ModelSource,
    options::Options,
    session::{KeyOutcome, LoadUpdate, ViewerSession},
};

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    model: Option<ModelSource>,
    texture: Option<PathBuf>,
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    fn new() -> Self {
        Self {
            model: None,
            texture: None,
            options: None,
            title: "scanview".into(),
        }
    }

    /// Model to open: a file path, or an `http(s)://` URL.
    #[must_use]
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(ModelSource::parse(model));
        self
    }

    /// Explicit texture image; otherwise one is looked for next to the
    /// model.
    #[must_use]
    pub fn with_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.texture = Some(path.into());
        self
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the initial window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            model: self.model,
            texture: self.texture,
            options: self.options.unwrap_or_default(),
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A window that displays one model with orbit controls.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run).
pub struct Viewer {
    model: Option<ModelSource>,
    texture: Option<PathBuf>,
    options: Options,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Viewer`] if the event loop fails.
    pub fn run(self) -> Result<(), ViewerError> {
        let event_loop = EventLoop::new()
            .map_err(|e| ViewerError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            window: None,
            session: None,
            renderer: None,
            model: self.model,
            texture: self.texture,
            options: Some(self.options),
            title: self.title,
            shown_title: String::new(),
            fullscreen: false,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| ViewerError::Viewer(e.to_string()))
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

struct ViewerApp {
    window: Option<Arc<Window>>,
    session: Option<ViewerSession>,
    renderer: Option<ModelRenderer>,
    model: Option<ModelSource>,
    texture: Option<PathBuf>,
    options: Option<Options>,
    title: String,
    shown_title: String,
    fullscreen: bool,
}

impl ViewerApp {
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(renderer) = &mut self.renderer {
            renderer.release_model();
        }
        event_loop.exit();
    }

    fn forward(&mut self, event: &InputEvent) -> KeyOutcome {
        self.session
            .as_mut()
            .map_or(KeyOutcome::Unbound, |s| s.handle_input(event))
    }

    fn redraw(&mut self) {
        let (Some(session), Some(renderer)) =
            (&mut self.session, &mut self.renderer)
        else {
            return;
        };

        for update in session.poll_loads() {
            if let LoadUpdate::Attached(id) = update {
                if let Some(stats) = session.stats() {
                    log::info!(
                        "model {id} ready: {} vertices, {} faces",
                        stats.vertices,
                        stats.faces
                    );
                }
            }
        }
        renderer.sync(session);

        let camera = session.frame();
        renderer.render(session, &camera);

        let title = session.title();
        if title != self.shown_title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.shown_title = title;
        }
        self.sync_fullscreen();
    }

    /// Apply the session's fullscreen flag to the window when it changed.
    fn sync_fullscreen(&mut self) {
        let (Some(window), Some(session)) = (&self.window, &self.session)
        else {
            return;
        };
        let wanted = session.options().display.fullscreen;
        if wanted == self.fullscreen {
            return;
        }
        window.set_fullscreen(wanted.then_some(Fullscreen::Borderless(None)));
        self.fullscreen = wanted;
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let inner = window.inner_size();
        let size = (inner.width.max(1), inner.height.max(1));
        let context =
            match pollster::block_on(RenderContext::new(window.clone(), size))
            {
                Ok(context) => context,
                Err(e) => {
                    log::error!("Failed to initialize GPU: {e}");
                    event_loop.exit();
                    return;
                }
            };

        let options = self.options.take().unwrap_or_default();
        let mut session = ViewerSession::new(options, size.0, size.1);
        if let Some(source) = self.model.take() {
            if let Err(e) = session.request_load(source, self.texture.take())
            {
                log::error!("Failed to start loading: {e}");
                event_loop.exit();
                return;
            }
        }

        window.request_redraw();
        self.renderer = Some(ModelRenderer::new(context));
        self.session = Some(session);
        self.window = Some(window);
        self.sync_fullscreen();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            self.shutdown(event_loop);
            return;
        }

        match event {
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                }
                if let Some(session) = &mut self.session {
                    session.resize(size.width.max(1), size.height.max(1));
                }
            }

            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            WindowEvent::MouseInput { button, state, .. } => {
                let _ = self.forward(&InputEvent::MouseButton {
                    button: MouseButton::from(button),
                    pressed: state == ElementState::Pressed,
                });
            }

            WindowEvent::CursorMoved { position, .. } => {
                let _ = self.forward(&InputEvent::CursorMoved {
                    x: position.x as f32,
                    y: position.y as f32,
                });
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let _ = self.forward(&InputEvent::Scroll {
                    delta: scroll_notches(delta),
                });
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let outcome = self.forward(&InputEvent::Key {
                    code: format!("{code:?}"),
                });
                if outcome == KeyOutcome::Quit {
                    self.shutdown(event_loop);
                } else {
                    self.sync_fullscreen();
                }
            }

            _ => (),
        }
    }
}
