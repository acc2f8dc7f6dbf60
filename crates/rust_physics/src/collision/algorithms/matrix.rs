//! Collision algorithm dispatch table

use super::{
    BoxBoxAlgorithm, BoxSphereAlgorithm, CollisionAlgorithm, NoCollisionAlgorithm, RayConvexAlgorithm,
    RaySphereAlgorithm, SphereSphereAlgorithm,
};
use crate::collision::CollisionError;
use crate::geometry::ShapeType;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Table of collision algorithms indexed by shape type pairs
///
/// Registering `(a, b)` also fills the mirrored entry `(b, a)` unless that
/// entry was registered explicitly. Algorithms detect the order of their
/// inputs themselves, so one instance serves both orderings.
#[derive(Clone)]
pub struct CollisionAlgorithmMatrix {
    entries: HashMap<(ShapeType, ShapeType), Entry>,
}

#[derive(Clone)]
struct Entry {
    algorithm: Arc<dyn CollisionAlgorithm>,
    explicit: bool,
}

impl CollisionAlgorithmMatrix {
    /// A matrix without any algorithms
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register `algorithm` for shape types `a` and `b`
    pub fn set(&mut self, a: ShapeType, b: ShapeType, algorithm: Arc<dyn CollisionAlgorithm>) {
        self.entries.insert(
            (a, b),
            Entry {
                algorithm: Arc::clone(&algorithm),
                explicit: true,
            },
        );
        if a != b {
            let mirrored = self.entries.get(&(b, a)).is_some_and(|entry| entry.explicit);
            if !mirrored {
                self.entries.insert((b, a), Entry { algorithm, explicit: false });
            }
        }
    }

    /// Algorithm for `(a, b)`, falling back to `(b, a)`
    pub fn get(&self, a: ShapeType, b: ShapeType) -> Option<Arc<dyn CollisionAlgorithm>> {
        self.entries
            .get(&(a, b))
            .or_else(|| self.entries.get(&(b, a)))
            .map(|entry| Arc::clone(&entry.algorithm))
    }

    /// Like [`Self::get`], but a missing entry is an `InvalidArgument` error
    pub fn resolve(&self, a: ShapeType, b: ShapeType) -> Result<Arc<dyn CollisionAlgorithm>, CollisionError> {
        self.get(a, b).ok_or_else(|| {
            CollisionError::InvalidArgument(format!("no collision algorithm registered for {a:?} vs {b:?}"))
        })
    }
}

impl Default for CollisionAlgorithmMatrix {
    fn default() -> Self {
        use ShapeType::{Box, Ray, Sphere};

        let mut matrix = Self::empty();
        matrix.set(Ray, Ray, Arc::new(NoCollisionAlgorithm));
        matrix.set(Ray, Sphere, Arc::new(RaySphereAlgorithm));
        matrix.set(Ray, Box, Arc::new(RayConvexAlgorithm));
        matrix.set(Sphere, Sphere, Arc::new(SphereSphereAlgorithm));
        matrix.set(Box, Sphere, Arc::new(BoxSphereAlgorithm));
        matrix.set(Box, Box, Arc::new(BoxBoxAlgorithm));
        matrix
    }
}

impl fmt::Debug for CollisionAlgorithmMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(key, entry)| (*key, entry.algorithm.name()))
            .collect();
        entries.sort_by_key(|(key, _)| *key);
        f.debug_struct("CollisionAlgorithmMatrix").field("entries", &entries).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ShapeType::{Box, Ray, Sphere};

    #[test]
    fn test_default_table_covers_all_pairs() {
        let matrix = CollisionAlgorithmMatrix::default();
        for a in [Ray, Sphere, Box] {
            for b in [Ray, Sphere, Box] {
                assert!(matrix.get(a, b).is_some(), "{a:?} vs {b:?}");
            }
        }
        assert_eq!(matrix.get(Sphere, Ray).map(|algo| algo.name()), Some("RaySphereAlgorithm"));
        assert_eq!(matrix.get(Sphere, Box).map(|algo| algo.name()), Some("BoxSphereAlgorithm"));
    }

    #[test]
    fn test_commutative_fallback() {
        let mut matrix = CollisionAlgorithmMatrix::empty();
        matrix.set(Ray, Box, Arc::new(RayConvexAlgorithm));
        assert_eq!(matrix.get(Box, Ray).map(|algo| algo.name()), Some("RayConvexAlgorithm"));
        assert!(matrix.get(Box, Box).is_none());
        assert!(matrix.resolve(Box, Box).is_err());
    }

    #[test]
    fn test_explicit_entry_not_overwritten_by_mirror() {
        let mut matrix = CollisionAlgorithmMatrix::empty();
        matrix.set(Sphere, Ray, Arc::new(RayConvexAlgorithm));
        matrix.set(Ray, Sphere, Arc::new(RaySphereAlgorithm));
        assert_eq!(matrix.get(Sphere, Ray).map(|algo| algo.name()), Some("RayConvexAlgorithm"));
        assert_eq!(matrix.get(Ray, Sphere).map(|algo| algo.name()), Some("RaySphereAlgorithm"));
    }
}
