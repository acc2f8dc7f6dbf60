//! Collision layer system for filtering collision detection
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.8:
//! "Most games need to filter collisions... This is typically done via
//! collision layers or groups."

use bitflags::bitflags;

bitflags! {
    /// Collision layer bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionLayer: u32 {
        /// Static world geometry
        const STATIC = 1 << 0;
        /// Simulated rigid bodies
        const DYNAMIC = 1 << 1;
        /// Animated bodies that push but are not pushed
        const KINEMATIC = 1 << 2;
        /// Query rays (picking, line of sight, sensors)
        const RAY = 1 << 3;
        /// Trigger volumes (no physical response)
        const TRIGGER = 1 << 4;
        /// Debris and small physics objects
        const DEBRIS = 1 << 5;

        // Bits 8-31 are free for user-defined layers
        const _ = !0;
    }
}

/// Layer membership plus the layers an object wants to collide with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionLayers {
    /// Layers this object is on
    pub layer: CollisionLayer,
    /// Layers this object collides with
    pub mask: CollisionLayer,
}

impl CollisionLayers {
    /// On all layers, colliding with all layers
    pub const ALL: Self = Self {
        layer: CollisionLayer::all(),
        mask: CollisionLayer::all(),
    };

    /// Create layers from a layer and a mask
    pub fn new(layer: CollisionLayer, mask: CollisionLayer) -> Self {
        Self { layer, mask }
    }

    /// A user-defined layer from bit index 8..=31
    pub fn custom(bit: u32) -> CollisionLayer {
        CollisionLayer::from_bits_retain(1 << bit.clamp(8, 31))
    }

    /// Check if two objects should collide based on their layers and masks
    ///
    /// A's layer must be in B's mask AND B's layer must be in A's mask.
    pub fn should_collide(&self, other: &CollisionLayers) -> bool {
        self.layer.intersects(other.mask) && other.layer.intersects(self.mask)
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::ALL
    }
}
