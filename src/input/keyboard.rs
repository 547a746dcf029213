use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Viewer actions that can be bound to keys.
///
/// Serde serializes as `snake_case` strings so TOML files stay readable:
/// ```toml
/// [keybindings.bindings]
/// reset_camera = "KeyR"
/// toggle_wireframe = "KeyW"
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    /// Restore the initial camera pose.
    ResetCamera,
    /// Frame the loaded model.
    FitToModel,
    /// Show or hide the model texture.
    ToggleTexture,
    /// Switch between filled and wireframe drawing.
    ToggleWireframe,
    /// Start or stop idle auto-rotation.
    ToggleAutoRotate,
    /// Show or hide the ground grid.
    ToggleGrid,
    /// Switch the window in and out of fullscreen.
    ToggleFullscreen,
    /// Raise model opacity by one step.
    OpacityUp,
    /// Lower model opacity by one step.
    OpacityDown,
    /// Set opacity to 10%.
    Opacity10,
    /// Set opacity to 20%.
    Opacity20,
    /// Set opacity to 30%.
    Opacity30,
    /// Set opacity to 40%.
    Opacity40,
    /// Set opacity to 50%.
    Opacity50,
    /// Set opacity to 60%.
    Opacity60,
    /// Set opacity to 70%.
    Opacity70,
    /// Set opacity to 80%.
    Opacity80,
    /// Set opacity to 90%.
    Opacity90,
    /// Set opacity to 100%.
    Opacity100,
    /// Close the viewer.
    Quit,
}

impl KeyAction {
    /// The opacity a preset action sets, or `None` for other actions.
    #[must_use]
    pub fn opacity_preset(self) -> Option<f32> {
        let tenths = match self {
            Self::Opacity10 => 1,
            Self::Opacity20 => 2,
            Self::Opacity30 => 3,
            Self::Opacity40 => 4,
            Self::Opacity50 => 5,
            Self::Opacity60 => 6,
            Self::Opacity70 => 7,
            Self::Opacity80 => 8,
            Self::Opacity90 => 9,
            Self::Opacity100 => 10,
            _ => return None,
        };
        Some(tenths as f32 / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_cover_tenths() {
        assert_eq!(KeyAction::Opacity10.opacity_preset(), Some(0.1));
        assert_eq!(KeyAction::Opacity100.opacity_preset(), Some(1.0));
        assert_eq!(KeyAction::OpacityUp.opacity_preset(), None);
    }

    #[test]
    fn actions_serialize_as_snake_case() {
        let json = serde_json::to_string(&KeyAction::ToggleFullscreen).unwrap();
        assert_eq!(json, "\"toggle_fullscreen\"");
        let preset: KeyAction = serde_json::from_str("\"opacity50\"").unwrap();
        assert_eq!(preset, KeyAction::Opacity50);
    }
}
