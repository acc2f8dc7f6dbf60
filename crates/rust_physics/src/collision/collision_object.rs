//! Collision objects tracked by a collision domain

use super::collision_layers::CollisionLayers;
use super::CollisionError;
use crate::foundation::collections::new_key_type;
use crate::foundation::math::Vec3;
use crate::geometry::{Aabb, GeometricObject, Pose, Shape, ShapeType, WorldRay};
use std::sync::atomic::{AtomicU64, Ordering};

new_key_type! {
    /// Handle of a collision object registered in a [`super::CollisionDomain`]
    pub struct CollisionObjectId;
}

/// Identifies a collision domain
///
/// Collision objects store this as a non-owning back-reference to the domain
/// they are registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomainId(u64);

impl DomainId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A geometric object that takes part in collision detection
///
/// Every mutation bumps a generation counter. The collision domain compares
/// these against the values cached per contact set to decide which pairs
/// need a new narrow-phase run.
#[derive(Debug, Clone)]
pub struct CollisionObject {
    geometry: GeometricObject,
    enabled: bool,
    layers: CollisionLayers,
    group: u32,
    domain: Option<DomainId>,
    pose_generation: u64,
    filter_generation: u64,
}

impl CollisionObject {
    /// Create an enabled collision object on all layers
    pub fn new(geometry: GeometricObject) -> Self {
        Self {
            geometry,
            enabled: true,
            layers: CollisionLayers::ALL,
            group: 0,
            domain: None,
            pose_generation: 0,
            filter_generation: 0,
        }
    }

    /// Create an object from a shape and pose with unit scale
    pub fn from_shape(shape: impl Into<Shape>, pose: Pose) -> Result<Self, CollisionError> {
        Ok(Self::new(GeometricObject::new(shape, pose)?))
    }

    /// Set the collision layers
    pub fn with_layers(mut self, layers: CollisionLayers) -> Self {
        self.layers = layers;
        self
    }

    /// Set the user group tag
    pub fn with_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }

    /// The positioned shape
    pub fn geometry(&self) -> &GeometricObject {
        &self.geometry
    }

    /// Shortcut for `geometry().pose()`
    pub fn pose(&self) -> &Pose {
        self.geometry.pose()
    }

    /// Shortcut for `geometry().shape_type()`
    pub fn shape_type(&self) -> ShapeType {
        self.geometry.shape_type()
    }

    /// World-space bounding box
    pub fn aabb(&self) -> Aabb {
        self.geometry.aabb()
    }

    /// Disabled objects never collide
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Collision layers
    pub fn layers(&self) -> CollisionLayers {
        self.layers
    }

    /// User group tag
    pub fn group(&self) -> u32 {
        self.group
    }

    /// The domain this object is registered in, if any
    pub fn domain(&self) -> Option<DomainId> {
        self.domain
    }

    /// Incremented on every pose, scale or shape change
    pub fn pose_generation(&self) -> u64 {
        self.pose_generation
    }

    /// Incremented whenever filter-relevant state changes
    pub fn filter_generation(&self) -> u64 {
        self.filter_generation
    }

    /// Whether this object is a ray
    pub fn is_ray(&self) -> bool {
        self.shape_type() == ShapeType::Ray
    }

    /// Whether this object is a ray that only reports its closest hit
    pub fn is_first_hit_ray(&self) -> bool {
        self.geometry
            .shape()
            .as_ray()
            .is_some_and(|ray| ray.stops_at_first_hit())
    }

    /// The ray in world space, if this object is a ray
    pub fn world_ray(&self) -> Option<WorldRay> {
        self.geometry
            .shape()
            .as_ray()
            .map(|ray| ray.to_world(self.geometry.scale(), self.geometry.pose()))
    }

    /// Move the object
    pub fn set_pose(&mut self, pose: Pose) -> Result<(), CollisionError> {
        self.geometry.set_pose(pose)?;
        self.pose_generation += 1;
        Ok(())
    }

    /// Change the scale
    pub fn set_scale(&mut self, scale: Vec3) -> Result<(), CollisionError> {
        self.geometry.set_scale(scale)?;
        self.pose_generation += 1;
        Ok(())
    }

    /// Replace the shape (a shape of another type selects a new algorithm)
    pub fn set_shape(&mut self, shape: impl Into<Shape>) {
        self.geometry.set_shape(shape);
        self.pose_generation += 1;
    }

    /// Enable or disable collisions for this object
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.filter_generation += 1;
        }
    }

    /// Change the collision layers
    pub fn set_layers(&mut self, layers: CollisionLayers) {
        if self.layers != layers {
            self.layers = layers;
            self.filter_generation += 1;
        }
    }

    /// Change the group tag
    pub fn set_group(&mut self, group: u32) {
        if self.group != group {
            self.group = group;
            self.filter_generation += 1;
        }
    }

    pub(crate) fn set_domain(&mut self, domain: Option<DomainId>) {
        self.domain = domain;
    }
}
