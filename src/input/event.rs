/// Platform-agnostic input events.
///
/// Hosts translate their windowing events into these and hand them to
/// [`ViewerSession::handle_input`](crate::session::ViewerSession::handle_input)
/// (or straight to the orbit controller).
///
/// # Example
///
/// ```
/// use scanview::input::{InputEvent, MouseButton};
///
/// let events = [
///     InputEvent::MouseButton { button: MouseButton::Left, pressed: true },
///     InputEvent::CursorMoved { x: 120.0, y: 80.0 },
///     InputEvent::MouseButton { button: MouseButton::Left, pressed: false },
/// ];
/// assert_eq!(events.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Cursor moved to absolute screen position.
    CursorMoved {
        /// Horizontal position in physical pixels.
        x: f32,
        /// Vertical position in physical pixels.
        y: f32,
    },
    /// Mouse button pressed or released.
    MouseButton {
        /// Which button changed.
        button: MouseButton,
        /// `true` for press, `false` for release.
        pressed: bool,
    },
    /// Scroll wheel (positive = zoom in).
    Scroll {
        /// Scroll amount in notches (positive = zoom in, negative = zoom
        /// out).
        delta: f32,
    },
    /// A key was pressed.
    Key {
        /// Physical key code in `winit::keyboard::KeyCode` debug format
        /// (`"KeyR"`, `"Escape"`, ...).
        code: String,
    },
}

/// Platform-agnostic mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary (left) mouse button.
    Left,
    /// Secondary (right) mouse button.
    Right,
    /// Middle mouse button (wheel click).
    Middle,
}

#[cfg(feature = "viewer")]
impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Right => Self::Right,
            winit::event::MouseButton::Middle => Self::Middle,
            _ => Self::Left,
        }
    }
}

/// Convert a winit wheel delta to notches. winit reports positive `y` when
/// the wheel rolls away from the user, which zooms in. Pixel deltas are
/// scaled down to roughly one notch per 100 px.
#[cfg(feature = "viewer")]
#[must_use]
pub fn scroll_notches(delta: winit::event::MouseScrollDelta) -> f32 {
    match delta {
        winit::event::MouseScrollDelta::LineDelta(_, y) => y,
        winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.01,
    }
}
