//! Centralized viewer options with TOML file support.
//!
//! Camera limits and interaction, ingestion, display toggles, and
//! keybindings are consolidated here. Every section uses
//! `#[serde(default)]`, so a partial file (e.g. only overriding `[camera]`)
//! fills the rest from defaults.

mod camera;
mod display;
mod ingest;
mod keybindings;

use std::path::Path;

pub use camera::CameraOptions;
pub use display::DisplayOptions;
pub use ingest::IngestOptions;
pub use keybindings::KeybindingOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ViewerError;

/// Top-level options container.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Camera projection and orbit parameters.
    pub camera: CameraOptions,
    /// Mesh ingestion parameters.
    pub ingest: IngestOptions,
    /// Display toggles and lighting.
    pub display: DisplayOptions,
    /// Keyboard binding options.
    #[schemars(skip)]
    pub keybindings: KeybindingOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Parse options from TOML text. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::OptionsParse`] for invalid TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, ViewerError> {
        let mut options: Self = toml::from_str(content)
            .map_err(|e| ViewerError::OptionsParse(e.to_string()))?;
        options.keybindings.rebuild_reverse_map();
        Ok(options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Io`] if the file cannot be read and
    /// [`ViewerError::OptionsParse`] for invalid TOML.
    pub fn load(path: &Path) -> Result<Self, ViewerError> {
        let content = std::fs::read_to_string(path).map_err(ViewerError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError`] on serialization or write failure.
    pub fn save(&self, path: &Path) -> Result<(), ViewerError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ViewerError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ViewerError::Io)?;
        }
        std::fs::write(path, content).map_err(ViewerError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyAction;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed = Options::from_toml_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
        assert_eq!(
            parsed.keybindings.lookup("KeyW"),
            Some(KeyAction::ToggleWireframe)
        );
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[camera]
damping_factor = 0.2
auto_rotate = true
";
        let opts = Options::from_toml_str(toml_str).unwrap();
        assert_eq!(opts.camera.damping_factor, 0.2);
        assert!(opts.camera.auto_rotate);
        // Everything else should be default
        assert_eq!(opts.camera.dolly_factor, 0.95);
        assert_eq!(opts.ingest, IngestOptions::default());
        assert!(opts.display.show_texture);
    }

    #[test]
    fn invalid_toml_is_an_options_error() {
        let err = Options::from_toml_str("[camera\nfovy = 1").unwrap_err();
        assert!(matches!(err, ViewerError::OptionsParse(_)));
    }

    #[test]
    fn keybinding_lookup() {
        let opts = Options::default();
        assert_eq!(
            opts.keybindings.lookup("KeyR"),
            Some(KeyAction::ResetCamera)
        );
        assert_eq!(opts.keybindings.lookup("Escape"), Some(KeyAction::Quit));
        assert_eq!(opts.keybindings.lookup("KeyZ"), None);
        assert_eq!(
            opts.keybindings.lookup("KeyF"),
            Some(KeyAction::ToggleFullscreen)
        );
        assert_eq!(
            opts.keybindings.lookup("KeyC"),
            Some(KeyAction::FitToModel)
        );
        assert_eq!(
            opts.keybindings.lookup("Digit5"),
            Some(KeyAction::Opacity50)
        );
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value =
            serde_json::to_value(Options::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();

        assert!(props.contains_key("camera"));
        assert!(props.contains_key("ingest"));
        assert!(props.contains_key("display"));
        assert!(!props.contains_key("keybindings"));

        let camera = &props["camera"]["properties"];
        assert!(camera.get("damping_factor").is_some());
        assert!(camera.get("min_distance").is_none());
    }
}
