//! Cameras with perspective or orthographic projection.
//!
//! A [`Camera`] is a [`Transform`] plus the clip-volume parameters shared by
//! every projection (`aspect_ratio`, `near`, `far`) and a [`Projection`] variant
//! carrying the parameters that differ. Every camera owns a concrete variant,
//! so there is no projection-less camera to construct by mistake.
//!
//! Projections are left-handed with a `[0, 1]` depth range, the convention
//! wgpu clip space expects: camera-space `z = near` lands on depth 0 and
//! `z = far` on depth 1.
//!
//! # Example
//!
//! ```
//! use skylit::{Camera, Vec3};
//!
//! let camera = Camera::perspective(60f32.to_radians())
//!     .at(Vec3::new(0.0, 0.0, -5.0))
//!     .aspect_ratio(16.0 / 9.0);
//!
//! // The world origin sits five units in front of the camera.
//! let eye = camera.view_matrix().transform_point3(Vec3::ZERO);
//! assert_eq!(eye, Vec3::new(0.0, 0.0, 5.0));
//! ```

use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::transform::Transform;

/// A camera parameter combination that cannot produce a projection matrix.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CameraError {
    #[error("aspect ratio must be positive, got {0}")]
    AspectRatio(f32),
    #[error("near plane must be positive, got {0}")]
    NearPlane(f32),
    #[error("far plane ({far}) must be greater than near plane ({near})")]
    ClipRange { near: f32, far: f32 },
    #[error("vertical field of view must be in (0, pi) radians, got {0}")]
    FieldOfView(f32),
    #[error("orthographic size must be positive, got {0}")]
    OrthographicSize(f32),
}

/// The projection-specific half of a camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    /// Field-of-view projection.
    Perspective {
        /// Vertical field of view in radians.
        fov_y: f32,
    },
    /// Parallel projection without perspective divide.
    Orthographic {
        /// Half-height of the view volume in world units. The half-width is
        /// `size * aspect_ratio`.
        size: f32,
    },
}

/// A viewpoint into the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Camera pose. Scale is ignored by [`Camera::view_matrix`].
    pub transform: Transform,
    /// Viewport width divided by height.
    pub aspect_ratio: f32,
    /// Distance to the near clip plane.
    pub near: f32,
    /// Distance to the far clip plane.
    pub far: f32,
    pub projection: Projection,
}

impl Camera {
    /// A perspective camera at the origin looking down +Z.
    pub fn perspective(fov_y: f32) -> Self {
        Self::with_projection(Projection::Perspective { fov_y })
    }

    /// An orthographic camera at the origin looking down +Z.
    pub fn orthographic(size: f32) -> Self {
        Self::with_projection(Projection::Orthographic { size })
    }

    fn with_projection(projection: Projection) -> Self {
        Self {
            transform: Transform::default(),
            aspect_ratio: 1.0,
            near: 0.1,
            far: 100.0,
            projection,
        }
    }

    /// Moves the camera to `position`.
    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Sets the Euler rotation of the camera in radians.
    pub fn rotated(mut self, rotation: Vec3) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// World position of the camera.
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Checks the invariants [`Camera::projection_matrix`] relies on.
    pub fn validate(&self) -> Result<(), CameraError> {
        if !(self.aspect_ratio > 0.0) {
            return Err(CameraError::AspectRatio(self.aspect_ratio));
        }
        if !(self.near > 0.0) {
            return Err(CameraError::NearPlane(self.near));
        }
        if !(self.far > self.near) {
            return Err(CameraError::ClipRange {
                near: self.near,
                far: self.far,
            });
        }
        match self.projection {
            Projection::Perspective { fov_y } if !(fov_y > 0.0 && fov_y < std::f32::consts::PI) => {
                Err(CameraError::FieldOfView(fov_y))
            }
            Projection::Orthographic { size } if !(size > 0.0) => {
                Err(CameraError::OrthographicSize(size))
            }
            _ => Ok(()),
        }
    }

    /// World space to camera space.
    ///
    /// This is the inverse of the camera's rotation and translation: the
    /// transposed rotation applied after moving the world by `-position`.
    pub fn view_matrix(&self) -> Mat4 {
        self.transform.rotation_matrix().transpose() * Mat4::from_translation(-self.transform.position)
    }

    /// Camera space to clip space.
    ///
    /// # Panics
    ///
    /// Panics if the camera parameters are degenerate (see [`Camera::validate`]).
    /// Calling this on such a camera is a programming error.
    pub fn projection_matrix(&self) -> Mat4 {
        if let Err(e) = self.validate() {
            panic!("invalid camera: {e}");
        }

        match self.projection {
            Projection::Perspective { fov_y } => {
                Mat4::perspective_lh(fov_y, self.aspect_ratio, self.near, self.far)
            }
            Projection::Orthographic { size } => {
                let half_width = size * self.aspect_ratio;
                Mat4::orthographic_lh(-half_width, half_width, -size, size, self.near, self.far)
            }
        }
    }

    /// Combined `projection * view`.
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::tests::{EPSILON, approx_vec3, sample_rotations};
    use glam::Vec4;

    fn clip_to_ndc(clip: Vec4) -> Vec3 {
        clip.truncate() / clip.w
    }

    #[test]
    fn view_matrix_moves_world_into_camera_space() {
        let camera = Camera::perspective(1.0).at(Vec3::new(0.0, 0.0, -5.0));
        let eye = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert_eq!(eye, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn view_matrix_inverts_rotation_and_translation() {
        for rotation in sample_rotations() {
            let camera = Camera::perspective(1.0)
                .at(Vec3::new(1.5, -2.0, 4.0))
                .rotated(rotation);

            let camera_to_world =
                Mat4::from_translation(camera.position()) * camera.transform.rotation_matrix();
            let product = camera.view_matrix() * camera_to_world;

            assert!(product.abs_diff_eq(Mat4::IDENTITY, 1e-4), "{rotation:?}");
        }
    }

    #[test]
    fn view_matrix_ignores_scale() {
        let mut camera = Camera::perspective(1.0).at(Vec3::new(2.0, 0.0, 0.0));
        let unscaled = camera.view_matrix();
        camera.transform.scale = Vec3::splat(4.0);
        assert_eq!(camera.view_matrix(), unscaled);
    }

    #[test]
    fn camera_forward_is_view_axis() {
        let camera = Camera::perspective(1.0).rotated(Vec3::new(0.3, -1.1, 0.5));
        let ahead = camera.position() + camera.transform.forward() * 3.0;
        let eye = camera.view_matrix().transform_point3(ahead);
        assert!(approx_vec3(eye, Vec3::new(0.0, 0.0, 3.0)));
    }

    #[test]
    fn perspective_near_and_far_map_to_depth_range() {
        let camera = Camera::perspective(60f32.to_radians())
            .aspect_ratio(1.5)
            .clip_planes(0.5, 50.0);
        let proj = camera.projection_matrix();

        let near = clip_to_ndc(proj * Vec4::new(0.0, 0.0, 0.5, 1.0));
        let far = clip_to_ndc(proj * Vec4::new(0.0, 0.0, 50.0, 1.0));

        assert!(near.z.abs() < EPSILON, "near depth {}", near.z);
        assert!((far.z - 1.0).abs() < EPSILON, "far depth {}", far.z);
    }

    #[test]
    fn perspective_frustum_edge_maps_to_clip_edge() {
        let fov_y = 90f32.to_radians();
        let camera = Camera::perspective(fov_y).aspect_ratio(2.0);
        let proj = camera.projection_matrix();

        // At depth d with a 90° vertical fov the frustum spans y in [-d, d].
        let top = clip_to_ndc(proj * Vec4::new(0.0, 10.0, 10.0, 1.0));
        let right = clip_to_ndc(proj * Vec4::new(20.0, 0.0, 10.0, 1.0));
        assert!((top.y - 1.0).abs() < EPSILON);
        assert!((right.x - 1.0).abs() < EPSILON);
    }

    #[test]
    fn orthographic_is_affine() {
        let camera = Camera::orthographic(4.0).aspect_ratio(1.25).clip_planes(0.1, 20.0);
        let proj = camera.projection_matrix();

        let p = Vec4::new(1.5, -0.75, 7.0, 1.0);
        let clip = proj * p;
        assert_eq!(clip.w, 1.0);

        for k in [-3.0, 0.5, 2.0, 10.0] {
            let scaled = proj * Vec4::new(p.x * k, p.y * k, p.z, 1.0);
            assert!((scaled.x - clip.x * k).abs() < EPSILON);
            assert!((scaled.y - clip.y * k).abs() < EPSILON);
            assert!((scaled.z - clip.z).abs() < EPSILON);
            assert_eq!(scaled.w, 1.0);
        }
    }

    #[test]
    fn orthographic_box_maps_to_clip_volume() {
        let camera = Camera::orthographic(2.0).aspect_ratio(2.0).clip_planes(1.0, 11.0);
        let proj = camera.projection_matrix();

        let corner = proj * Vec4::new(4.0, 2.0, 1.0, 1.0);
        assert!(approx_vec3(corner.truncate(), Vec3::new(1.0, 1.0, 0.0)));

        let far = proj * Vec4::new(-4.0, -2.0, 11.0, 1.0);
        assert!(approx_vec3(far.truncate(), Vec3::new(-1.0, -1.0, 1.0)));
    }

    #[test]
    fn validate_reports_degenerate_parameters() {
        let base = Camera::perspective(1.0);

        assert_eq!(
            base.aspect_ratio(0.0).validate(),
            Err(CameraError::AspectRatio(0.0))
        );
        assert_eq!(
            base.clip_planes(1.0, 1.0).validate(),
            Err(CameraError::ClipRange { near: 1.0, far: 1.0 })
        );
        assert_eq!(
            base.clip_planes(0.0, 10.0).validate(),
            Err(CameraError::NearPlane(0.0))
        );
        assert_eq!(
            Camera::perspective(0.0).validate(),
            Err(CameraError::FieldOfView(0.0))
        );
        assert_eq!(
            Camera::orthographic(-1.0).validate(),
            Err(CameraError::OrthographicSize(-1.0))
        );
        assert!(matches!(
            base.aspect_ratio(f32::NAN).validate(),
            Err(CameraError::AspectRatio(_))
        ));
        assert_eq!(base.validate(), Ok(()));
    }

    #[test]
    #[should_panic(expected = "aspect ratio must be positive")]
    fn zero_aspect_ratio_panics() {
        Camera::perspective(1.0).aspect_ratio(0.0).projection_matrix();
    }

    #[test]
    #[should_panic(expected = "must be greater than near plane")]
    fn equal_clip_planes_panic() {
        Camera::orthographic(1.0).clip_planes(5.0, 5.0).projection_matrix();
    }

    #[test]
    fn view_projection_is_projection_after_view() {
        let camera = Camera::perspective(1.0)
            .at(Vec3::new(1.0, 2.0, -5.0))
            .rotated(Vec3::new(0.2, -0.4, 0.1))
            .aspect_ratio(1.5);
        let expected = camera.projection_matrix() * camera.view_matrix();
        assert!(camera.view_projection().abs_diff_eq(expected, 1e-4));

        // A point straight ahead of the camera lands in the centre of the screen.
        let ahead = camera.position() + camera.transform.forward() * 3.0;
        let ndc = clip_to_ndc(camera.view_projection() * ahead.extend(1.0));
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4, "{ndc:?}");
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
