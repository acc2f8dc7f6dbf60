//! Contact points

use crate::foundation::math::Vec3;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque per-contact slot for the solver (e.g. a cached constraint)
pub type ContactUserData = Arc<dyn Any + Send + Sync>;

/// A single contact between two objects
///
/// `normal` points from object A toward object B. `penetration_depth` is
/// positive when the objects interpenetrate and `<= 0` when they are
/// touching or separated (closest-point queries).
#[derive(Clone)]
pub struct Contact {
    /// World-space position, halfway between the two surfaces
    pub position: Vec3,
    /// Unit normal from A toward B
    pub normal: Vec3,
    /// Overlap along the normal
    pub penetration_depth: f32,
    /// Seconds this contact has persisted
    pub lifetime: f64,
    /// Set for ray contacts: `position` is the hit point, depth the hit distance
    pub is_ray_hit: bool,
    /// Solver-side data attached to this contact
    pub user_data: Option<ContactUserData>,
}

impl Contact {
    /// Create a new contact with zero lifetime
    pub fn new(position: Vec3, normal: Vec3, penetration_depth: f32) -> Self {
        Self {
            position,
            normal,
            penetration_depth,
            lifetime: 0.0,
            is_ray_hit: false,
            user_data: None,
        }
    }

    /// Create a ray hit contact
    pub fn ray_hit(position: Vec3, normal: Vec3, distance: f32) -> Self {
        Self {
            is_ray_hit: true,
            ..Self::new(position, normal, distance)
        }
    }

    /// Point on the surface of object A
    ///
    /// A penetrating contact has A's surface point inside B, so it lies
    /// along the normal from `position`.
    pub fn position_a(&self) -> Vec3 {
        if self.is_ray_hit {
            return self.position;
        }
        self.position + self.normal * (self.penetration_depth * 0.5)
    }

    /// Point on the surface of object B
    pub fn position_b(&self) -> Vec3 {
        if self.is_ray_hit {
            return self.position;
        }
        self.position - self.normal * (self.penetration_depth * 0.5)
    }

    /// Same contact as seen with A and B exchanged
    pub fn swapped(&self) -> Self {
        Self {
            normal: -self.normal,
            ..self.clone()
        }
    }

    /// Negate the normal in place
    pub fn swap_in_place(&mut self) {
        self.normal = -self.normal;
    }
}

impl fmt::Debug for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contact")
            .field("position", &self.position)
            .field("normal", &self.normal)
            .field("penetration_depth", &self.penetration_depth)
            .field("lifetime", &self.lifetime)
            .field("is_ray_hit", &self.is_ray_hit)
            .field("has_user_data", &self.user_data.is_some())
            .finish()
    }
}
