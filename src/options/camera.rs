use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Camera", inline)]
#[serde(default)]
/// Camera projection, orbit limits, and interaction parameters.
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    #[schemars(title = "Field of View", range(min = 20.0, max = 90.0), extend("step" = 1.0))]
    pub fovy: f32,
    /// Near clipping plane distance.
    #[schemars(skip)]
    pub znear: f32,
    /// Far clipping plane distance.
    #[schemars(skip)]
    pub zfar: f32,
    /// Rotation sensitivity multiplier.
    #[schemars(title = "Rotate Speed", range(min = 0.1, max = 2.0), extend("step" = 0.05))]
    pub rotate_speed: f32,
    /// Pan sensitivity multiplier.
    #[schemars(title = "Pan Speed", range(min = 0.1, max = 2.0), extend("step" = 0.05))]
    pub pan_speed: f32,
    /// Per-notch dolly factor; scrolling toward the model divides the
    /// orbit radius by this.
    #[schemars(title = "Dolly Factor", range(min = 0.5, max = 0.99), extend("step" = 0.01))]
    pub dolly_factor: f32,
    /// Smooth input with exponential decay instead of stopping instantly.
    #[schemars(title = "Damping")]
    pub damping: bool,
    /// Fraction of the pending motion removed each frame when damping.
    #[schemars(title = "Damping Factor", range(min = 0.01, max = 1.0), extend("step" = 0.01))]
    pub damping_factor: f32,
    /// Spin around the target while idle.
    #[schemars(title = "Auto Rotate")]
    pub auto_rotate: bool,
    /// Auto-rotation speed; 1.0 is one turn per minute at 60 frames/s.
    #[schemars(title = "Auto Rotate Speed", range(min = 0.1, max = 10.0), extend("step" = 0.1))]
    pub auto_rotate_speed: f32,
    /// Closest allowed orbit radius.
    #[schemars(skip)]
    pub min_distance: f32,
    /// Farthest allowed orbit radius.
    #[schemars(skip)]
    pub max_distance: f32,
    /// Smallest polar angle in radians (0 looks straight down).
    #[schemars(skip)]
    pub min_polar_angle: f32,
    /// Largest polar angle in radians (π looks straight up).
    #[schemars(skip)]
    pub max_polar_angle: f32,
    /// Initial camera position relative to the target.
    #[schemars(skip)]
    pub initial_offset: [f32; 3],
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            znear: 0.1,
            zfar: 100.0,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            dolly_factor: 0.95,
            damping: true,
            damping_factor: 0.05,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
            min_distance: 0.1,
            max_distance: 50.0,
            min_polar_angle: 0.0,
            max_polar_angle: std::f32::consts::PI,
            initial_offset: [0.0, 0.0, 5.0],
        }
    }
}
