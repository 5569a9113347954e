//! Spatial transforms built from Euler angles.
//!
//! [`Transform`] stores position, rotation and scale as plain vectors and derives
//! its matrices from scratch on every call, so the result only ever depends on the
//! current field values.
//!
//! # Conventions
//!
//! Every rotation in Skylit goes through [`euler_rotation`]:
//!
//! ```text
//! R = Rz(rotation.z) * Ry(rotation.y) * Rx(rotation.x)
//! ```
//!
//! A column vector is rotated about X first, then Y, then Z. The coordinate
//! system is left-handed with +X right, +Y up and **+Z forward**.
//!
//! ```
//! use skylit::{Transform, Vec3};
//!
//! let transform = Transform::new()
//!     .position(Vec3::new(0.0, -0.3, -3.0))
//!     .uniform_scale(0.3);
//!
//! let world = transform.matrix().transform_point3(Vec3::ZERO);
//! assert_eq!(world, Vec3::new(0.0, -0.3, -3.0));
//! ```

use glam::{Mat4, Vec3};

/// Builds the rotation-only matrix for a set of Euler angles (radians).
///
/// Composition is `Rz * Ry * Rx`. The same function backs [`Transform`],
/// [`Camera`](crate::Camera) and [`DirectionalLight`](crate::DirectionalLight).
pub fn euler_rotation(rotation: Vec3) -> Mat4 {
    Mat4::from_rotation_z(rotation.z)
        * Mat4::from_rotation_y(rotation.y)
        * Mat4::from_rotation_x(rotation.x)
}

/// Position, Euler rotation and per-axis scale of an object.
///
/// # Transformation Order
///
/// [`Transform::matrix()`] applies **Scale → Rotate → Translate**: the object
/// is scaled along its local axes, rotated about its local origin, then moved
/// to `position` in world space.
///
/// # Default Values
///
/// - `position`: `(0, 0, 0)`
/// - `rotation`: `(0, 0, 0)`
/// - `scale`: `(1, 1, 1)`
///
/// Zero or negative scale components are accepted and produce a degenerate or
/// mirrored matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// World-space position (translation).
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    /// Scale factors for each local axis.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Creates an identity transform (origin, no rotation, unit scale).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transform positioned at the given location.
    ///
    /// ```
    /// use skylit::{Transform, Vec3};
    ///
    /// let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
    /// assert_eq!(transform.position, Vec3::new(1.0, 2.0, 3.0));
    /// assert_eq!(transform.scale, Vec3::ONE);
    /// ```
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Sets the position component.
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the Euler rotation in radians.
    pub fn rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets non-uniform scale factors.
    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the same scale on all three axes.
    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// The rotation-only matrix for this transform's Euler angles.
    pub fn rotation_matrix(&self) -> Mat4 {
        euler_rotation(self.rotation)
    }

    /// The model matrix `T * R * S`.
    ///
    /// Applying it to a local-space point yields that point's world-space
    /// position.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * self.rotation_matrix() * Mat4::from_scale(self.scale)
    }

    /// Local +Z axis in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation_matrix().transform_vector3(Vec3::Z)
    }

    /// Local +X axis in world space.
    pub fn right(&self) -> Vec3 {
        self.rotation_matrix().transform_vector3(Vec3::X)
    }

    /// Local +Y axis in world space.
    pub fn up(&self) -> Vec3 {
        self.rotation_matrix().transform_vector3(Vec3::Y)
    }
}
