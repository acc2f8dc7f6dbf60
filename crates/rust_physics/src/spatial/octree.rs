//! Loose octree broad phase
//!
//! Divides 3D space into hierarchical regions. Each object is stored in the
//! deepest node whose bounds fully contain its AABB; nodes subdivide into 8
//! octants when their object count exceeds a threshold. Objects outside the
//! world bounds stay in the root.

use super::broad_phase::{BroadPhase, CandidatePair};
use crate::collision::CollisionObjectId;
use crate::foundation::math::Vec3;
use crate::geometry::Aabb;
use std::collections::HashMap;

/// Configuration for octree behavior
#[derive(Debug, Clone)]
pub struct OctreeConfig {
    /// Region covered by the tree
    pub world_bounds: Aabb,

    /// Maximum entries per node before subdivision
    pub max_entries_per_node: usize,

    /// Maximum subdivision depth
    pub max_depth: u32,

    /// Minimum node half size (prevents excessive subdivision)
    pub min_node_size: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            world_bounds: Aabb::new(Vec3::new(-512.0, -512.0, -512.0), Vec3::new(512.0, 512.0, 512.0)),
            max_entries_per_node: 8,
            max_depth: 8,
            min_node_size: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OctreeEntry {
    id: CollisionObjectId,
    aabb: Aabb,
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
struct OctreeNode {
    bounds: Aabb,
    entries: Vec<OctreeEntry>,
    children: Option<Box<[OctreeNode; 8]>>,
    depth: u32,
}

impl OctreeNode {
    fn new(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            entries: Vec::new(),
            children: None,
            depth,
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Child octant that contains `aabb` in its interior, if any
    ///
    /// Boxes touching a child boundary stay in the parent so that entries
    /// of sibling subtrees can never touch each other.
    fn containing_child(&self, aabb: &Aabb) -> Option<usize> {
        let children = self.children.as_ref()?;
        children.iter().position(|child| {
            let bounds = &child.bounds;
            (0..3).all(|axis| aabb.min[axis] > bounds.min[axis] && aabb.max[axis] < bounds.max[axis])
        })
    }

    fn subdivide(&mut self) {
        if self.children.is_some() {
            return;
        }

        let center = self.bounds.center();
        let quarter_extents = self.bounds.extents() * 0.5;

        // Octant layout: bit 0 = +X, bit 1 = +Y, bit 2 = +Z
        let children: [OctreeNode; 8] = std::array::from_fn(|octant| {
            let sign = |bit: usize| if octant & bit != 0 { 1.0 } else { -1.0 };
            let child_center = center + quarter_extents.component_mul(&Vec3::new(sign(1), sign(2), sign(4)));
            OctreeNode::new(Aabb::from_center_extents(child_center, quarter_extents), self.depth + 1)
        });
        self.children = Some(Box::new(children));

        // Redistribute entries that now fit into a child
        let entries = std::mem::take(&mut self.entries);
        for entry in entries {
            match self.containing_child(&entry.aabb) {
                Some(octant) => {
                    if let Some(children) = self.children.as_mut() {
                        children[octant].entries.push(entry);
                    }
                }
                None => self.entries.push(entry),
            }
        }
    }

    fn insert(&mut self, entry: OctreeEntry, config: &OctreeConfig) {
        if self.is_leaf() {
            let should_subdivide = self.entries.len() >= config.max_entries_per_node
                && self.depth < config.max_depth
                && self.bounds.extents().x > config.min_node_size;
            if !should_subdivide {
                self.entries.push(entry);
                return;
            }
            self.subdivide();
        }

        match self.containing_child(&entry.aabb) {
            Some(octant) => {
                if let Some(children) = self.children.as_mut() {
                    children[octant].insert(entry, config);
                }
            }
            None => self.entries.push(entry),
        }
    }

    /// Remove an entry; `aabb` is the box it was inserted with
    fn remove(&mut self, id: CollisionObjectId, aabb: &Aabb) -> bool {
        if let Some(index) = self.entries.iter().position(|e| e.id == id) {
            self.entries.swap_remove(index);
            return true;
        }
        match (self.containing_child(aabb), self.children.as_mut()) {
            (Some(octant), Some(children)) => children[octant].remove(id, aabb),
            _ => false,
        }
    }

    fn query_aabb(&self, aabb: &Aabb, results: &mut Vec<CollisionObjectId>) {
        results.extend(self.entries.iter().filter(|e| e.aabb.intersects(aabb)).map(|e| e.id));
        if let Some(children) = &self.children {
            for child in children.iter().filter(|child| child.bounds.intersects(aabb)) {
                child.query_aabb(aabb, results);
            }
        }
    }

    /// Test own entries against each other and against all ancestors
    fn collect_pairs(&self, ancestors: &mut Vec<OctreeEntry>, pairs: &mut Vec<CandidatePair>) {
        for (index, entry) in self.entries.iter().enumerate() {
            for ancestor in ancestors.iter() {
                if ancestor.aabb.intersects(&entry.aabb) {
                    pairs.push(CandidatePair::new(ancestor.id, entry.id));
                }
            }
            for other in &self.entries[index + 1..] {
                if other.aabb.intersects(&entry.aabb) {
                    pairs.push(CandidatePair::new(entry.id, other.id));
                }
            }
        }

        if let Some(children) = &self.children {
            let ancestor_count = ancestors.len();
            ancestors.extend_from_slice(&self.entries);
            for child in children.iter() {
                child.collect_pairs(ancestors, pairs);
            }
            ancestors.truncate(ancestor_count);
        }
    }

    fn count_entries(&self) -> usize {
        let mut count = self.entries.len();
        if let Some(children) = &self.children {
            count += children.iter().map(OctreeNode::count_entries).sum::<usize>();
        }
        count
    }
}

/// Octree-based implementation of [`BroadPhase`]
#[derive(Debug, Clone)]
pub struct OctreeBroadPhase {
    root: OctreeNode,
    config: OctreeConfig,
    /// Box each object was inserted with, used to locate it on removal
    entries: HashMap<CollisionObjectId, Aabb>,
}

impl OctreeBroadPhase {
    /// Create an empty octree
    pub fn new(config: OctreeConfig) -> Self {
        Self {
            root: OctreeNode::new(config.world_bounds, 0),
            config,
            entries: HashMap::new(),
        }
    }

    /// Maximum depth reached by any node
    pub fn depth(&self) -> u32 {
        fn deepest(node: &OctreeNode) -> u32 {
            node.children
                .as_ref()
                .map_or(node.depth, |children| children.iter().map(deepest).max().unwrap_or(node.depth))
        }
        deepest(&self.root)
    }
}

impl Default for OctreeBroadPhase {
    fn default() -> Self {
        Self::new(OctreeConfig::default())
    }
}

impl BroadPhase for OctreeBroadPhase {
    fn insert(&mut self, id: CollisionObjectId, aabb: Aabb) {
        if self.entries.contains_key(&id) {
            self.update(id, aabb);
            return;
        }
        self.root.insert(OctreeEntry { id, aabb }, &self.config);
        self.entries.insert(id, aabb);
    }

    fn remove(&mut self, id: CollisionObjectId) -> bool {
        match self.entries.remove(&id) {
            Some(aabb) => self.root.remove(id, &aabb),
            None => false,
        }
    }

    fn update(&mut self, id: CollisionObjectId, aabb: Aabb) {
        // Octree requires remove + re-insert for updates
        if let Some(old) = self.entries.get(&id).copied() {
            if old == aabb {
                return;
            }
            self.root.remove(id, &old);
        }
        self.root.insert(OctreeEntry { id, aabb }, &self.config);
        self.entries.insert(id, aabb);
    }

    fn query_aabb(&self, aabb: &Aabb, results: &mut Vec<CollisionObjectId>) {
        self.root.query_aabb(aabb, results);
    }

    fn overlapping_pairs(&self, pairs: &mut Vec<CandidatePair>) {
        let mut ancestors = Vec::new();
        self.root.collect_pairs(&mut ancestors, pairs);
    }

    fn aabb(&self, id: CollisionObjectId) -> Option<Aabb> {
        self.entries.get(&id).copied()
    }

    fn clear(&mut self) {
        self.root = OctreeNode::new(self.config.world_bounds, 0);
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
