use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Display", inline)]
#[serde(default)]
/// Display toggles and simple lighting.
pub struct DisplayOptions {
    /// Sample the model texture when one is loaded.
    #[schemars(title = "Show Texture")]
    pub show_texture: bool,
    /// Draw triangle edges instead of filled faces.
    #[schemars(title = "Wireframe")]
    pub wireframe: bool,
    /// Clear color (linear RGB).
    #[schemars(skip)]
    pub background: [f32; 3],
    /// Ambient light term.
    #[schemars(title = "Ambient", range(min = 0.0, max = 1.0), extend("step" = 0.05))]
    pub ambient: f32,
    /// Diffuse light term.
    #[schemars(title = "Diffuse", range(min = 0.0, max = 1.0), extend("step" = 0.05))]
    pub diffuse: f32,
    /// Specular light term.
    #[schemars(title = "Specular", range(min = 0.0, max = 1.0), extend("step" = 0.05))]
    pub specular: f32,
    /// Light position in world space.
    #[schemars(skip)]
    pub light_position: [f32; 3],
    /// Model opacity in `[MIN_OPACITY, 1]`. Below 1 the model is blended
    /// over the background without writing depth.
    #[schemars(title = "Opacity", range(min = 0.1, max = 1.0), extend("step" = 0.1))]
    pub opacity: f32,
    /// Draw the ground grid on the `y = 0` plane.
    #[schemars(title = "Show Grid")]
    pub show_grid: bool,
    /// Grid lines on each side of the origin.
    #[schemars(skip)]
    pub grid_half_lines: u32,
    /// Distance between grid lines.
    #[schemars(skip)]
    pub grid_spacing: f32,
    /// Start in (or switch to) fullscreen.
    #[schemars(title = "Fullscreen")]
    pub fullscreen: bool,
}

/// Lowest opacity reachable from the keyboard.
pub const MIN_OPACITY: f32 = 0.1;
/// Opacity change per step.
pub const OPACITY_STEP: f32 = 0.1;

impl DisplayOptions {
    /// Set opacity, clamped to `[MIN_OPACITY, 1]`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_finite() {
            opacity.clamp(MIN_OPACITY, 1.0)
        } else {
            1.0
        };
    }

    /// Change opacity by `steps` increments of [`OPACITY_STEP`].
    pub fn step_opacity(&mut self, steps: i32) {
        // Round to tenths so repeated steps land on the presets.
        let next = self.opacity + steps as f32 * OPACITY_STEP;
        self.set_opacity((next * 10.0).round() / 10.0);
    }

    /// Whether the model needs the blended pipeline.
    #[must_use]
    pub fn is_translucent(&self) -> bool {
        self.opacity < 1.0
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_texture: true,
            wireframe: false,
            background: [0.1, 0.12, 0.15],
            ambient: 0.3,
            diffuse: 0.6,
            specular: 0.3,
            light_position: [5.0, 5.0, 5.0],
            opacity: 1.0,
            show_grid: true,
            grid_half_lines: 10,
            grid_spacing: 0.5,
            fullscreen: false,
        }
    }
}
