use glam::{Mat4, Vec3};

use crate::options::CameraOptions;

/// Where the camera sits and what it looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Eye position in world space.
    pub eye: Vec3,
    /// Look-at target.
    pub target: Vec3,
    /// Up direction.
    pub up: Vec3,
}

impl CameraPose {
    /// Right-handed view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Unit vector from the eye toward the target.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or(Vec3::NEG_Z)
    }

    /// Camera-space right and up axes expressed in world space.
    #[must_use]
    pub fn basis(&self) -> (Vec3, Vec3) {
        let forward = self.forward();
        let right = forward.cross(self.up).normalize_or(Vec3::X);
        (right, right.cross(forward))
    }

    /// Distance between eye and target.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.eye.distance(self.target)
    }
}

/// Perspective camera defined by a pose and projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye, target and up.
    pub pose: CameraPose,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

impl Camera {
    /// Camera at `options.initial_offset` from the origin, looking at it.
    #[must_use]
    pub fn from_options(options: &CameraOptions, aspect: f32) -> Self {
        Self {
            pose: CameraPose {
                eye: Vec3::from_array(options.initial_offset),
                target: Vec3::ZERO,
                up: Vec3::Y,
            },
            aspect,
            fovy: options.fovy,
            znear: options.znear,
            zfar: options.zfar,
        }
    }

    /// Projection matrix. `perspective_rh` already uses the [0,1] depth
    /// range wgpu expects.
    #[must_use]
    pub fn build_projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fovy.to_radians(),
            self.aspect,
            self.znear,
            self.zfar,
        )
    }

    /// Combined view-projection matrix.
    #[must_use]
    pub fn build_matrix(&self) -> Mat4 {
        self.build_projection() * self.pose.view_matrix()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
/// GPU uniform holding the view-projection matrix and eye position.
pub struct CameraUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Camera world-space position.
    pub position: [f32; 3],
    /// Viewport aspect ratio.
    pub aspect: f32,
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    /// Identity view-projection at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0; 3],
            aspect: 1.0,
        }
    }

    /// Update uniform fields from the given camera.
    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_proj = camera.build_matrix().to_cols_array_2d();
        self.position = camera.pose.eye.to_array();
        self.aspect = camera.aspect;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_is_orthonormal() {
        let pose = CameraPose {
            eye: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        };
        let (right, up) = pose.basis();
        assert!((right - Vec3::X).length() < 1e-6);
        assert!((up - Vec3::Y).length() < 1e-6);
        assert!((pose.distance() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let camera = Camera::from_options(&CameraOptions::default(), 1.5);
        let clip = camera.build_matrix() * Vec3::ZERO.extend(1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn uniform_tracks_eye() {
        let camera = Camera::from_options(&CameraOptions::default(), 2.0);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera);
        assert_eq!(uniform.position, [0.0, 0.0, 5.0]);
        assert_eq!(uniform.aspect, 2.0);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
    }
}
