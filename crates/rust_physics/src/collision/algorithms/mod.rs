//! Narrow-phase collision algorithms
//!
//! GEA 13.3.3: "Once we have a list of potentially colliding pairs, the
//! narrow phase determines whether each pair is actually in contact and
//! computes contact information."
//!
//! Each algorithm handles one unordered pair of shape types. Callers may pass
//! the objects in either order; algorithms swap internally so their first
//! object is always the canonical type and negate the resulting normals
//! afterwards, so a normal always points from the caller's A toward B.

pub mod matrix;
mod box_box;
mod box_sphere;
mod no_collision;
mod ray_convex;
mod ray_sphere;
mod sphere_sphere;

pub use box_box::BoxBoxAlgorithm;
pub use box_sphere::BoxSphereAlgorithm;
pub use matrix::CollisionAlgorithmMatrix;
pub use no_collision::NoCollisionAlgorithm;
pub use ray_convex::RayConvexAlgorithm;
pub use ray_sphere::RaySphereAlgorithm;
pub use sphere_sphere::SphereSphereAlgorithm;

use super::collision_object::CollisionObject;
use super::contact_set::ContactSet;
use super::query::CollisionQueryType;
use super::CollisionError;
use crate::geometry::ShapeType;

/// Computes contacts for one pair of shape types
pub trait CollisionAlgorithm: Send + Sync {
    /// Human readable name, used in errors and logs
    fn name(&self) -> &'static str;

    /// Run `query` for `pair`, replacing the contents of `contact_set`
    ///
    /// The set's contact flag and contacts are written from scratch; any
    /// persistent state (lifetimes, user data) is merged by the caller.
    fn compute_collision(
        &self,
        pair: ObjectPair<'_>,
        contact_set: &mut ContactSet,
        query: CollisionQueryType,
    ) -> Result<(), CollisionError>;
}

/// The two objects of a contact set, in contact-set order
#[derive(Debug, Clone, Copy)]
pub struct ObjectPair<'a> {
    /// Object A
    pub a: &'a CollisionObject,
    /// Object B
    pub b: &'a CollisionObject,
}

impl<'a> ObjectPair<'a> {
    /// Pair `a` with `b`
    pub fn new(a: &'a CollisionObject, b: &'a CollisionObject) -> Self {
        Self { a, b }
    }

    /// The same pair with A and B exchanged
    pub fn swapped(self) -> Self {
        Self { a: self.b, b: self.a }
    }

    /// Shape types of A and B
    pub fn shape_types(&self) -> (ShapeType, ShapeType) {
        (self.a.shape_type(), self.b.shape_type())
    }

    /// Reorder so that A has shape type `first` and B has `second`
    ///
    /// Returns the reordered pair and whether a swap happened, or
    /// `InvalidArgument` if the pair does not consist of these two types.
    pub(crate) fn canonical(
        self,
        first: ShapeType,
        second: ShapeType,
        algorithm: &'static str,
    ) -> Result<(Self, bool), CollisionError> {
        match self.shape_types() {
            (a, b) if a == first && b == second => Ok((self, false)),
            (a, b) if a == second && b == first => Ok((self.swapped(), true)),
            (a, b) => Err(CollisionError::InvalidArgument(format!(
                "{algorithm} expects {first:?} and {second:?}, got {a:?} and {b:?}"
            ))),
        }
    }
}

/// Negate normals written in canonical order if the inputs were swapped
pub(crate) fn restore_order(contact_set: &mut ContactSet, swapped: bool) {
    if swapped {
        contact_set.flip_normals();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::collision::{CollisionObject, ContactSet};
    use crate::foundation::collections::Key;
    use crate::foundation::math::{Quat, Vec3};
    use crate::geometry::{BoxShape, GeometricObject, Pose, RayShape, SphereShape};

    pub fn sphere_at(center: Vec3, radius: f32) -> CollisionObject {
        CollisionObject::from_shape(SphereShape::new(radius).unwrap(), Pose::from_position(center)).unwrap()
    }

    pub fn box_at(center: Vec3, extent: Vec3) -> CollisionObject {
        CollisionObject::from_shape(BoxShape::new(extent).unwrap(), Pose::from_position(center)).unwrap()
    }

    pub fn rotated_box(center: Vec3, extent: Vec3, orientation: Quat) -> CollisionObject {
        CollisionObject::from_shape(BoxShape::new(extent).unwrap(), Pose::new(center, orientation)).unwrap()
    }

    pub fn ray(origin: Vec3, direction: Vec3, length: f32) -> CollisionObject {
        let shape = RayShape::new(Vec3::zeros(), direction.normalize(), length).unwrap();
        CollisionObject::from_shape(shape, Pose::from_position(origin)).unwrap()
    }

    pub fn scaled_sphere(center: Vec3, radius: f32, scale: Vec3) -> CollisionObject {
        let geometry =
            GeometricObject::with_scale(SphereShape::new(radius).unwrap(), Pose::from_position(center), scale)
                .unwrap();
        CollisionObject::new(geometry)
    }

    pub fn scratch() -> ContactSet {
        ContactSet::new(Key::null(), Key::null())
    }
}
