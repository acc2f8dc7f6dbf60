//! Geometry layer: shapes, poses and bounding volumes
//!
//! # Key Types
//!
//! - [`Shape`] - Model-space shape (ray, sphere, box)
//! - [`Pose`] - Rigid local → world transform
//! - [`GeometricObject`] - Shape with pose and scale, the unit the narrow phase works on
//! - [`Aabb`] - World-space bounding box used by the broad phase

pub mod aabb;
pub mod pose;
pub mod shape;
pub mod geometric_object;

pub use aabb::Aabb;
pub use pose::Pose;
pub use shape::{Shape, ShapeType, RayShape, SphereShape, BoxShape, WorldRay};
pub use geometric_object::GeometricObject;
