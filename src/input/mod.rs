//! Input handling: platform-agnostic events and bindable key actions.

/// Platform-agnostic input events.
pub mod event;
/// Bindable viewer actions.
pub mod keyboard;

pub use event::{InputEvent, MouseButton};
pub use keyboard::KeyAction;
