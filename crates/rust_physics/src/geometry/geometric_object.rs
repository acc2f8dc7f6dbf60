//! Positioned and scaled shapes

use crate::collision::CollisionError;
use crate::foundation::math::{utils, Vec3};
use super::{aabb::Aabb, pose::Pose, shape::{Shape, ShapeType}};

/// A shape placed in the world: pose, per-axis scale and shape
///
/// All setters validate their input so that NaN or degenerate values never
/// reach the broad phase. The world AABB is recomputed on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometricObject {
    pose: Pose,
    scale: Vec3,
    shape: Shape,
    aabb: Aabb,
}

impl GeometricObject {
    /// Create an object with unit scale
    pub fn new(shape: impl Into<Shape>, pose: Pose) -> Result<Self, CollisionError> {
        Self::with_scale(shape, pose, Vec3::new(1.0, 1.0, 1.0))
    }

    /// Create an object with an explicit scale
    pub fn with_scale(shape: impl Into<Shape>, pose: Pose, scale: Vec3) -> Result<Self, CollisionError> {
        let shape = shape.into();
        validate_pose(&pose)?;
        validate_scale(&scale)?;
        let aabb = shape.aabb(scale, &pose);
        Ok(Self { pose, scale, shape, aabb })
    }

    /// Local → world rigid transform
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Per-axis scale applied in local space before the pose
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// The model-space shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Shape discriminant
    pub fn shape_type(&self) -> ShapeType {
        self.shape.shape_type()
    }

    /// World-space bounding box
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// Replace the pose
    pub fn set_pose(&mut self, pose: Pose) -> Result<(), CollisionError> {
        validate_pose(&pose)?;
        self.pose = pose;
        self.refresh_aabb();
        Ok(())
    }

    /// Replace the scale
    pub fn set_scale(&mut self, scale: Vec3) -> Result<(), CollisionError> {
        validate_scale(&scale)?;
        self.scale = scale;
        self.refresh_aabb();
        Ok(())
    }

    /// Replace the shape
    pub fn set_shape(&mut self, shape: impl Into<Shape>) {
        self.shape = shape.into();
        self.refresh_aabb();
    }

    /// Re-run the NaN/degenerate checks on the current state
    pub fn validate(&self) -> Result<(), CollisionError> {
        validate_pose(&self.pose)?;
        validate_scale(&self.scale)?;
        if !self.aabb.is_finite() {
            return Err(CollisionError::InvalidGeometry(format!(
                "bounding box is not finite: {:?}",
                self.aabb
            )));
        }
        Ok(())
    }

    fn refresh_aabb(&mut self) {
        self.aabb = self.shape.aabb(self.scale, &self.pose);
    }
}

fn validate_pose(pose: &Pose) -> Result<(), CollisionError> {
    if !pose.is_finite() {
        return Err(CollisionError::InvalidGeometry(format!("pose is not finite: {pose:?}")));
    }
    Ok(())
}

fn validate_scale(scale: &Vec3) -> Result<(), CollisionError> {
    if !utils::is_finite(scale) || scale.min() <= 0.0 {
        return Err(CollisionError::InvalidGeometry(format!(
            "scale must be finite and positive, got {scale:?}"
        )));
    }
    Ok(())
}
