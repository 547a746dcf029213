use std::f32::consts::PI;

use glam::Vec3;

/// Smallest distance kept between the polar angle and either pole.
pub const POLE_EPSILON: f32 = 1e-6;

/// Spherical coordinates in a Y-up basis.
///
/// `polar` is measured from `+Y` (0 = straight up), `azimuth` around `+Y`
/// starting at `+Z` and turning toward `+X`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spherical {
    /// Distance from the origin.
    pub radius: f32,
    /// Angle from `+Y` in radians.
    pub polar: f32,
    /// Angle around `+Y` in radians.
    pub azimuth: f32,
}

impl Spherical {
    /// All-zero coordinates, used for pending deltas.
    pub const ZERO: Self = Self {
        radius: 0.0,
        polar: 0.0,
        azimuth: 0.0,
    };

    /// Spherical coordinates of `v`. The zero vector maps to all zeros.
    #[must_use]
    pub fn from_vec3(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self::ZERO;
        }
        Self {
            radius,
            polar: (v.y / radius).clamp(-1.0, 1.0).acos(),
            azimuth: v.x.atan2(v.z),
        }
    }

    /// Cartesian vector for these coordinates.
    #[must_use]
    pub fn to_vec3(self) -> Vec3 {
        let ring = self.polar.sin() * self.radius;
        Vec3::new(
            ring * self.azimuth.sin(),
            self.polar.cos() * self.radius,
            ring * self.azimuth.cos(),
        )
    }

    /// Keep the polar angle off the exact poles, where azimuth is
    /// undefined.
    #[must_use]
    pub fn make_safe(mut self) -> Self {
        self.polar = self.polar.clamp(POLE_EPSILON, PI - POLE_EPSILON);
        self
    }

    /// Magnitude of the angular part, used to watch deltas decay.
    #[must_use]
    pub fn angular_magnitude(self) -> f32 {
        self.polar.hypot(self.azimuth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_vectors() {
        let s = Spherical::from_vec3(Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(s.radius, 2.0);
        assert!((s.polar - PI / 2.0).abs() < 1e-6);
        assert!(s.azimuth.abs() < 1e-6);

        let up = Spherical::from_vec3(Vec3::Y);
        assert!(up.polar.abs() < 1e-6);

        let x = Spherical::from_vec3(Vec3::X);
        assert!((x.azimuth - PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn converts_back_to_the_same_vector() {
        let v = Vec3::new(1.5, -2.0, 0.7);
        let back = Spherical::from_vec3(v).to_vec3();
        assert!((back - v).length() < 1e-5);
    }

    #[test]
    fn make_safe_moves_off_the_poles() {
        let top = Spherical {
            radius: 1.0,
            polar: 0.0,
            azimuth: 0.3,
        }
        .make_safe();
        assert!(top.polar > 0.0);

        let bottom = Spherical {
            radius: 1.0,
            polar: PI,
            azimuth: 0.3,
        }
        .make_safe();
        assert!(bottom.polar < PI);
    }

    #[test]
    fn zero_vector_is_zero() {
        assert_eq!(Spherical::from_vec3(Vec3::ZERO), Spherical::ZERO);
    }
}
