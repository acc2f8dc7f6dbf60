//! Pairwise collision filters
//!
//! The domain checks `enabled` itself; filters only decide whether two
//! enabled objects may collide. Filter results are cached per pair and the
//! cache is flushed whenever the domain's filter is replaced.

use super::collision_object::CollisionObject;
use std::collections::HashSet;

/// Decides whether two collision objects may collide
pub trait CollisionFilter: Send + Sync {
    /// Return `true` if `a` and `b` should be tested for collision
    fn can_collide(&self, a: &CollisionObject, b: &CollisionObject) -> bool;
}

/// Filter based on [`super::CollisionLayers`] layer/mask pairs
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerCollisionFilter;

impl CollisionFilter for LayerCollisionFilter {
    fn can_collide(&self, a: &CollisionObject, b: &CollisionObject) -> bool {
        a.layers().should_collide(&b.layers())
    }
}

/// Layer filter plus per-group-pair switches
///
/// Collisions between two groups can be disabled, which also covers
/// self-collision of a group (`disable_group_pair(g, g)`).
#[derive(Debug, Clone, Default)]
pub struct GroupCollisionFilter {
    disabled_pairs: HashSet<(u32, u32)>,
}

impl GroupCollisionFilter {
    /// Create a filter with every group pair enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable collisions between `group_a` and `group_b`
    pub fn disable_group_pair(&mut self, group_a: u32, group_b: u32) {
        self.disabled_pairs.insert(Self::key(group_a, group_b));
    }

    /// Re-enable collisions between `group_a` and `group_b`
    pub fn enable_group_pair(&mut self, group_a: u32, group_b: u32) {
        self.disabled_pairs.remove(&Self::key(group_a, group_b));
    }

    /// Whether collisions between the two groups are enabled
    pub fn is_group_pair_enabled(&self, group_a: u32, group_b: u32) -> bool {
        !self.disabled_pairs.contains(&Self::key(group_a, group_b))
    }

    fn key(a: u32, b: u32) -> (u32, u32) {
        if a <= b { (a, b) } else { (b, a) }
    }
}

impl CollisionFilter for GroupCollisionFilter {
    fn can_collide(&self, a: &CollisionObject, b: &CollisionObject) -> bool {
        a.layers().should_collide(&b.layers()) && self.is_group_pair_enabled(a.group(), b.group())
    }
}

impl<F> CollisionFilter for F
where
    F: Fn(&CollisionObject, &CollisionObject) -> bool + Send + Sync,
{
    fn can_collide(&self, a: &CollisionObject, b: &CollisionObject) -> bool {
        self(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionLayer, CollisionLayers};
    use crate::geometry::{Pose, SphereShape};

    fn sphere(group: u32) -> CollisionObject {
        CollisionObject::from_shape(SphereShape::new(1.0).unwrap(), Pose::identity())
            .unwrap()
            .with_group(group)
    }

    #[test]
    fn test_group_filter_is_symmetric() {
        let mut filter = GroupCollisionFilter::new();
        filter.disable_group_pair(2, 1);
        assert!(!filter.can_collide(&sphere(1), &sphere(2)));
        assert!(!filter.can_collide(&sphere(2), &sphere(1)));
        assert!(filter.can_collide(&sphere(1), &sphere(1)));

        filter.enable_group_pair(1, 2);
        assert!(filter.can_collide(&sphere(1), &sphere(2)));
    }

    #[test]
    fn test_layer_filter() {
        let a = sphere(0).with_layers(CollisionLayers::new(CollisionLayer::DYNAMIC, CollisionLayer::STATIC));
        let b = sphere(0).with_layers(CollisionLayers::new(CollisionLayer::DEBRIS, CollisionLayer::all()));
        assert!(!LayerCollisionFilter.can_collide(&a, &b));
    }

    #[test]
    fn test_closure_filter() {
        let filter = |a: &CollisionObject, b: &CollisionObject| a.group() != b.group();
        assert!(filter.can_collide(&sphere(1), &sphere(2)));
        assert!(!CollisionFilter::can_collide(&filter, &sphere(3), &sphere(3)));
    }
}
