//! Rigid transforms (position + orientation, no scale)

use crate::foundation::math::{Mat3, Quat, Vec3};

/// Pose of a collision object: a rigid transform from local to world space
///
/// Scale is kept separately on [`super::GeometricObject`] so that poses can be
/// inverted and composed without shear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position in world space
    pub position: Vec3,
    /// Orientation (local → world rotation)
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Identity pose at the origin
    pub fn identity() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Quat::identity(),
        }
    }

    /// Create a pose with position and orientation
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self { position, orientation }
    }

    /// Create a pose with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::identity(),
        }
    }

    /// Rotation as a 3x3 matrix (columns are the local axes in world space)
    pub fn rotation_matrix(&self) -> Mat3 {
        *self.orientation.to_rotation_matrix().matrix()
    }

    /// Transform a point from local to world space
    pub fn to_world_point(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * local
    }

    /// Transform a direction from local to world space
    pub fn to_world_direction(&self, local: Vec3) -> Vec3 {
        self.orientation * local
    }

    /// Transform a point from world to local space
    pub fn to_local_point(&self, world: Vec3) -> Vec3 {
        self.orientation.inverse_transform_vector(&(world - self.position))
    }

    /// Transform a direction from world to local space
    pub fn to_local_direction(&self, world: Vec3) -> Vec3 {
        self.orientation.inverse_transform_vector(&world)
    }

    /// Inverse pose (world → local)
    pub fn inverse(&self) -> Pose {
        let orientation = self.orientation.inverse();
        Pose {
            position: orientation * -self.position,
            orientation,
        }
    }

    /// `self * other`: apply `other` first, then `self`
    pub fn compose(&self, other: &Pose) -> Pose {
        Pose {
            position: self.to_world_point(other.position),
            orientation: self.orientation * other.orientation,
        }
    }

    /// Check that position and orientation contain no NaN or infinity
    pub fn is_finite(&self) -> bool {
        let q = self.orientation.quaternion();
        crate::foundation::math::utils::is_finite(&self.position)
            && q.w.is_finite()
            && q.i.is_finite()
            && q.j.is_finite()
            && q.k.is_finite()
    }
}
