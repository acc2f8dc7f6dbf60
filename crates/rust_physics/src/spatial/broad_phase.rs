//! Abstract broad-phase interface
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.2:
//! "Spatial partitioning schemes... allow us to quickly cull out pairs of
//! objects that cannot possibly be colliding."
//!
//! This abstraction allows swapping different spatial partitioning schemes
//! (octree, grid, BVH, etc.) without changing the collision domain.

use crate::collision::CollisionObjectId;
use crate::geometry::Aabb;

/// Two objects whose bounding boxes overlap
///
/// Pairs are normalized so that `a < b`; the same two objects always form
/// the same pair regardless of discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidatePair {
    /// Smaller id
    pub a: CollisionObjectId,
    /// Larger id
    pub b: CollisionObjectId,
}

impl CandidatePair {
    /// Create a normalized pair
    pub fn new(first: CollisionObjectId, second: CollisionObjectId) -> Self {
        if first <= second {
            Self { a: first, b: second }
        } else {
            Self { a: second, b: first }
        }
    }

    /// Whether `id` is one of the two objects
    pub fn contains(&self, id: CollisionObjectId) -> bool {
        self.a == id || self.b == id
    }
}

/// Coarse AABB overlap detection
///
/// GEA 13.3.2: "The broad phase quickly identifies pairs of objects that might
/// be colliding using some kind of spatial partitioning scheme."
pub trait BroadPhase: Send + Sync {
    /// Add an object with its world bounding box
    fn insert(&mut self, id: CollisionObjectId, aabb: Aabb);

    /// Remove an object, returning whether it was present
    fn remove(&mut self, id: CollisionObjectId) -> bool;

    /// Move an object to a new bounding box
    fn update(&mut self, id: CollisionObjectId, aabb: Aabb);

    /// Append every object whose box intersects `aabb`
    fn query_aabb(&self, aabb: &Aabb, results: &mut Vec<CollisionObjectId>);

    /// Append all overlapping pairs in a deterministic order
    fn overlapping_pairs(&self, pairs: &mut Vec<CandidatePair>);

    /// Bounding box stored for `id`
    fn aabb(&self, id: CollisionObjectId) -> Option<Aabb>;

    /// Remove all objects
    fn clear(&mut self);

    /// Number of stored objects
    fn len(&self) -> usize;

    /// Whether no objects are stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
