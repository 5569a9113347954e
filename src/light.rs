use glam::{Mat4, Vec3};

use crate::transform::euler_rotation;

/// A light infinitely far away, shining along a single direction.
///
/// Only orientation and colour matter for a directional light, so it carries an
/// Euler rotation instead of a full [`Transform`](crate::Transform). The
/// rotation follows the same `Rz * Ry * Rx` convention.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DirectionalLight {
    /// Euler angles in radians.
    pub rotation: Vec3,
    /// Linear RGB colour. Black until set.
    pub color: Vec3,
}

impl DirectionalLight {
    pub fn new(color: Vec3) -> Self {
        Self {
            rotation: Vec3::ZERO,
            color,
        }
    }

    pub fn rotation_matrix(&self) -> Mat4 {
        euler_rotation(self.rotation)
    }

    /// World-space direction of the light: +Z rotated by [`Self::rotation_matrix`].
    pub fn direction(&self) -> Vec3 {
        self.rotation_matrix().transform_vector3(Vec3::Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;
    use crate::transform::tests::{EPSILON, approx_vec3, sample_rotations};
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn zero_rotation_points_down_z() {
        assert_eq!(DirectionalLight::default().direction(), Vec3::Z);
    }

    #[test]
    fn direction_is_unit_length() {
        for rotation in sample_rotations() {
            let light = DirectionalLight {
                rotation,
                ..Default::default()
            };
            assert!((light.direction().length() - 1.0).abs() < EPSILON, "{rotation:?}");
        }
    }

    #[test]
    fn direction_matches_transform_forward() {
        for rotation in sample_rotations() {
            let light = DirectionalLight {
                rotation,
                color: Vec3::ONE,
            };
            let transform = Transform::new().rotation(rotation);
            assert_eq!(light.rotation_matrix(), transform.rotation_matrix());
            assert!(approx_vec3(light.direction(), transform.forward()));
        }
    }

    #[test]
    fn pitching_about_x_swings_toward_negative_y() {
        let light = DirectionalLight {
            rotation: Vec3::new(FRAC_PI_2, 0.0, 0.0),
            ..Default::default()
        };
        assert!(approx_vec3(light.direction(), Vec3::NEG_Y));
    }
}
