use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::input::KeyAction;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
/// Configurable keyboard bindings mapping actions to key codes.
pub struct KeybindingOptions {
    /// Maps action → key string (e.g. `ToggleWireframe` → `"KeyW"`).
    pub bindings: HashMap<KeyAction, String>,
    /// Reverse lookup cache (key string → action). Rebuilt on load.
    #[serde(skip)]
    key_to_action: HashMap<String, KeyAction>,
}

impl Default for KeybindingOptions {
    fn default() -> Self {
        let bindings = HashMap::from([
            (KeyAction::ResetCamera, "KeyR".into()),
            (KeyAction::FitToModel, "KeyC".into()),
            (KeyAction::ToggleTexture, "KeyT".into()),
            (KeyAction::ToggleWireframe, "KeyW".into()),
            (KeyAction::ToggleAutoRotate, "KeyA".into()),
            (KeyAction::ToggleGrid, "KeyG".into()),
            (KeyAction::ToggleFullscreen, "KeyF".into()),
            (KeyAction::OpacityUp, "Equal".into()),
            (KeyAction::OpacityDown, "Minus".into()),
            (KeyAction::Opacity10, "Digit1".into()),
            (KeyAction::Opacity20, "Digit2".into()),
            (KeyAction::Opacity30, "Digit3".into()),
            (KeyAction::Opacity40, "Digit4".into()),
            (KeyAction::Opacity50, "Digit5".into()),
            (KeyAction::Opacity60, "Digit6".into()),
            (KeyAction::Opacity70, "Digit7".into()),
            (KeyAction::Opacity80, "Digit8".into()),
            (KeyAction::Opacity90, "Digit9".into()),
            (KeyAction::Opacity100, "Digit0".into()),
            (KeyAction::Quit, "Escape".into()),
        ]);

        let mut opts = Self {
            bindings,
            key_to_action: HashMap::new(),
        };
        opts.rebuild_reverse_map();
        opts
    }
}

impl KeybindingOptions {
    /// Rebuild the reverse lookup map (key string → action).
    pub fn rebuild_reverse_map(&mut self) {
        self.key_to_action.clear();
        for (action, key) in &self.bindings {
            let _ = self.key_to_action.insert(key.clone(), *action);
        }
    }

    /// Look up the action for a key string.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<KeyAction> {
        self.key_to_action.get(key).copied()
    }
}

// The reverse map is derived state; equality only looks at the bindings.
impl PartialEq for KeybindingOptions {
    fn eq(&self, other: &Self) -> bool {
        self.bindings == other.bindings
    }
}

impl Eq for KeybindingOptions {}
