//! Orbit camera: target point plus a spherical offset, driven by pointer
//! input and a per-frame update with exponential damping.

use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec2, Vec3};

use super::core::{Camera, CameraPose};
use super::spherical::Spherical;
use crate::input::{InputEvent, MouseButton};
use crate::mesh::Bounds;
use crate::options::CameraOptions;

/// Extra room around a fitted bounding sphere.
const FIT_PADDING: f32 = 1.5;

/// Pointer interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// No button held.
    #[default]
    Idle,
    /// Primary button held: drag orbits around the target.
    Rotating,
    /// Secondary button held: drag moves the target.
    Panning,
}

/// Orbit state consumed and refreshed by
/// [`OrbitCameraController::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Offset from the target as of the last update.
    pub spherical: Spherical,
    /// Rotation accumulated from input, not yet applied.
    pub pending: Spherical,
    /// Multiplicative radius change for the next update.
    pub zoom_scale: f32,
    /// Target translation accumulated from input.
    pub pan_offset: Vec3,
}

impl OrbitState {
    fn at_rest(target: Vec3, spherical: Spherical) -> Self {
        Self {
            target,
            spherical,
            pending: Spherical::ZERO,
            zoom_scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }
}

/// Orbit camera controller.
///
/// Input handlers only accumulate deltas; nothing moves until
/// [`update`](Self::update), which must be called once per frame (it also
/// drives idle auto-rotation and damping).
pub struct OrbitCameraController {
    options: CameraOptions,
    camera: Camera,
    state: OrbitState,
    mode: InteractionMode,
    auto_rotate: bool,
    /// Pointer position at the previous move (or at button press).
    pointer: Vec2,
    /// Latest cursor position reported by the host.
    cursor: Vec2,
    viewport: Vec2,
    home: CameraPose,
    /// Distance and radius of the last fitted model; 0 when none.
    fit_distance: f32,
    fit_radius: f32,
    to_y_up: Quat,
    from_y_up: Quat,
}

impl OrbitCameraController {
    /// Create a controller for a `width` x `height` viewport.
    #[must_use]
    pub fn new(options: &CameraOptions, width: u32, height: u32) -> Self {
        let viewport = Vec2::new(width as f32, height as f32);
        let camera = Camera::from_options(options, aspect(viewport));
        let to_y_up = Quat::from_rotation_arc(
            camera.pose.up.normalize_or(Vec3::Y),
            Vec3::Y,
        );
        let spherical = Spherical::from_vec3(
            to_y_up * (camera.pose.eye - camera.pose.target),
        );
        Self {
            options: options.clone(),
            state: OrbitState::at_rest(camera.pose.target, spherical),
            home: camera.pose,
            camera,
            mode: InteractionMode::Idle,
            auto_rotate: options.auto_rotate,
            pointer: Vec2::ZERO,
            cursor: Vec2::ZERO,
            viewport,
            fit_distance: 0.0,
            fit_radius: 0.0,
            to_y_up,
            from_y_up: to_y_up.inverse(),
        }
    }

    /// Current camera (pose plus projection).
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Orbit state as of the last update plus any input since.
    #[must_use]
    pub fn state(&self) -> &OrbitState {
        &self.state
    }

    /// Current interaction mode.
    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Whether idle auto-rotation is on.
    #[must_use]
    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    /// Options the controller was built with.
    #[must_use]
    pub fn options(&self) -> &CameraOptions {
        &self.options
    }

    /// Replace the options. Projection parameters take effect immediately,
    /// limits on the next update.
    pub fn set_options(&mut self, options: &CameraOptions) {
        self.options = options.clone();
        self.auto_rotate = options.auto_rotate;
        self.camera.fovy = options.fovy;
        self.camera.znear = options.znear;
        self.camera.zfar = options.zfar;
        self.apply_far_plane();
    }

    /// Configured distance range, widened so a fitted model can be framed
    /// and zoomed out from.
    #[must_use]
    pub fn distance_limits(&self) -> (f32, f32) {
        let (min, max) =
            ordered(self.options.min_distance, self.options.max_distance);
        (min, max.max(self.fit_distance * 2.0))
    }

    fn apply_far_plane(&mut self) {
        let (_, max_distance) = self.distance_limits();
        self.camera.zfar = self.options.zfar.max(max_distance + self.fit_radius);
    }

    /// Track a resized viewport.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Vec2::new(width as f32, height as f32);
        self.camera.aspect = aspect(self.viewport);
    }

    /// Flip idle auto-rotation; returns the new setting.
    pub fn toggle_auto_rotate(&mut self) -> bool {
        self.auto_rotate = !self.auto_rotate;
        self.auto_rotate
    }

    /// Button press at `(x, y)`. Primary starts rotating, secondary starts
    /// panning; other buttons are ignored.
    pub fn pointer_down(&mut self, button: MouseButton, x: f32, y: f32) {
        self.mode = match button {
            MouseButton::Left => InteractionMode::Rotating,
            MouseButton::Right => InteractionMode::Panning,
            MouseButton::Middle => return,
        };
        self.pointer = Vec2::new(x, y);
        self.cursor = self.pointer;
    }

    /// Pointer moved to `(x, y)`.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.cursor = Vec2::new(x, y);
        let delta = self.cursor - self.pointer;
        self.pointer = self.cursor;

        match self.mode {
            InteractionMode::Idle => {}
            InteractionMode::Rotating => self.rotate(delta),
            InteractionMode::Panning => self.pan(delta),
        }
    }

    /// Any button released.
    pub fn pointer_up(&mut self) {
        self.mode = InteractionMode::Idle;
    }

    /// Wheel by `delta` notches. Positive brings the camera closer.
    pub fn wheel(&mut self, delta: f32) {
        let dolly = self.options.dolly_factor;
        if dolly <= 0.0 {
            return;
        }
        if delta > 0.0 {
            self.state.zoom_scale *= dolly;
        } else if delta < 0.0 {
            self.state.zoom_scale /= dolly;
        }
    }

    /// Route a platform-agnostic event. Returns `true` if the camera
    /// consumed it.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::CursorMoved { x, y } => {
                self.pointer_move(x, y);
                self.mode != InteractionMode::Idle
            }
            InputEvent::MouseButton {
                button,
                pressed: true,
            } => {
                self.pointer_down(button, self.cursor.x, self.cursor.y);
                self.mode != InteractionMode::Idle
            }
            InputEvent::MouseButton { pressed: false, .. } => {
                let was_active = self.mode != InteractionMode::Idle;
                self.pointer_up();
                was_active
            }
            InputEvent::Scroll { delta } => {
                self.wheel(delta);
                true
            }
            InputEvent::Key { .. } => false,
        }
    }

    fn rotate(&mut self, delta: Vec2) {
        let height = self.viewport.y;
        if height <= 0.0 {
            return;
        }
        let speed = self.options.rotate_speed;
        self.state.pending.azimuth -= TAU * delta.x / height * speed;
        self.state.pending.polar -= TAU * delta.y / height * speed;
    }

    fn pan(&mut self, delta: Vec2) {
        let height = self.viewport.y;
        if height <= 0.0 {
            return;
        }
        let pose = self.camera.pose;
        let (right, up) = pose.basis();
        let half_fov = (self.camera.fovy.to_radians() * 0.5).tan();
        let scale =
            2.0 * pose.distance() * half_fov / height * self.options.pan_speed;
        // Dragging right moves the scene right, so the target goes left.
        self.state.pan_offset +=
            -right * delta.x * scale + up * delta.y * scale;
    }

    /// Advance one frame and return the new pose.
    pub fn update(&mut self) -> CameraPose {
        let opts = &self.options;
        let pose = self.camera.pose;

        let mut spherical =
            Spherical::from_vec3(self.to_y_up * (pose.eye - pose.target));

        if self.auto_rotate && self.mode == InteractionMode::Idle {
            spherical.azimuth += TAU / 3600.0 * opts.auto_rotate_speed;
        }

        let step = if opts.damping {
            opts.damping_factor
        } else {
            1.0
        };
        spherical.azimuth += self.state.pending.azimuth * step;
        spherical.polar += self.state.pending.polar * step;

        let (min_polar, max_polar) = ordered(
            opts.min_polar_angle.max(0.0),
            opts.max_polar_angle.min(PI),
        );
        spherical.polar = spherical.polar.clamp(min_polar, max_polar);
        spherical = spherical.make_safe();

        let (min_distance, max_distance) = self.distance_limits();
        spherical.radius = (spherical.radius * self.state.zoom_scale)
            .clamp(min_distance, max_distance);

        let target = pose.target + self.state.pan_offset * step;
        let eye = target + self.from_y_up * spherical.to_vec3();
        self.camera.pose = CameraPose {
            eye,
            target,
            up: pose.up,
        };
        self.state.target = target;
        self.state.spherical = spherical;

        if opts.damping {
            let keep = 1.0 - opts.damping_factor;
            self.state.pending.azimuth *= keep;
            self.state.pending.polar *= keep;
            self.state.pan_offset *= keep;
        } else {
            self.state.pending = Spherical::ZERO;
            self.state.pan_offset = Vec3::ZERO;
        }
        self.state.zoom_scale = 1.0;

        self.camera.pose
    }

    /// Return to the home pose and drop any pending motion.
    pub fn reset(&mut self) {
        self.camera.pose = self.home;
        self.state = OrbitState::at_rest(
            self.home.target,
            Spherical::from_vec3(
                self.to_y_up * (self.home.eye - self.home.target),
            ),
        );
        self.mode = InteractionMode::Idle;
    }

    /// Center on `bounds` and back off until its bounding sphere fits the
    /// vertical field of view. The fitted pose becomes the new home pose.
    ///
    /// When the model needs more room than `max_distance` / `zfar` allow,
    /// both limits grow to keep it in view.
    pub fn fit_to_bounds(&mut self, bounds: &Bounds) {
        let center = bounds.center();
        let radius = bounds.radius();
        if !center.is_finite() || !radius.is_finite() {
            log::warn!("fit_to_bounds: non-finite bounds, keeping camera");
            return;
        }

        let half_fov = (self.camera.fovy.to_radians() * 0.5).tan();
        let (min_distance, _) =
            ordered(self.options.min_distance, self.options.max_distance);
        let distance = if half_fov > 0.0 {
            radius / half_fov * FIT_PADDING
        } else {
            radius * FIT_PADDING
        }
        .max(min_distance);
        // Models larger than the configured range widen it.
        self.fit_distance = distance;
        self.fit_radius = radius;
        self.apply_far_plane();

        let fallback = Vec3::from_array(self.options.initial_offset)
            .normalize_or(Vec3::Z);
        let direction = (self.camera.pose.eye - self.camera.pose.target)
            .normalize_or(fallback);
        self.home = CameraPose {
            eye: center + direction * distance,
            target: center,
            up: self.camera.pose.up,
        };
        self.reset();
    }

    /// Restore the pose built from the options, forgetting any fitted home.
    pub fn reset_to_initial(&mut self) {
        self.fit_distance = 0.0;
        self.fit_radius = 0.0;
        self.apply_far_plane();
        self.home = Camera::from_options(&self.options, self.camera.aspect).pose;
        self.reset();
    }
}

fn aspect(viewport: Vec2) -> f32 {
    if viewport.y > 0.0 {
        viewport.x / viewport.y
    } else {
        1.0
    }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
