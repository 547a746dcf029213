//! Camera system: an orbit controller around a target point.
//!
//! Input accumulates into pending deltas; [`orbit::OrbitCameraController::update`]
//! applies them once per frame with optional damping and auto-rotation.

/// Core camera struct, pose, and GPU uniform.
pub mod core;
/// Orbit controller with damping and auto-rotation.
pub mod orbit;
/// Spherical coordinates in a Y-up basis.
pub mod spherical;

pub use self::core::{Camera, CameraPose, CameraUniform};
pub use orbit::{InteractionMode, OrbitCameraController, OrbitState};
pub use spherical::Spherical;
