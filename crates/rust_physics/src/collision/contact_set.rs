//! Contact sets: all contacts between one pair of objects

use super::algorithms::CollisionAlgorithm;
use super::collision_object::CollisionObjectId;
use super::contact::Contact;
use crate::foundation::collections::Key;
use crate::geometry::ShapeType;
use std::fmt;
use std::sync::Arc;

/// Cached result of the pairwise collision filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanCollide {
    /// Not evaluated yet, or invalidated
    #[default]
    Unknown,
    /// The pair passed the filter
    Yes,
    /// The pair was rejected by the filter
    No,
}

/// Generations a cached filter result was computed against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FilterStamp {
    pub domain: u64,
    pub object_a: u64,
    pub object_b: u64,
}

/// Algorithm resolved from the matrix for a given shape-type pair
#[derive(Clone)]
pub(crate) struct CachedAlgorithm {
    pub shape_types: (ShapeType, ShapeType),
    pub algorithm: Arc<dyn CollisionAlgorithm>,
}

impl fmt::Debug for CachedAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedAlgorithm")
            .field("shape_types", &self.shape_types)
            .field("algorithm", &self.algorithm.name())
            .finish()
    }
}

/// Contacts between object A and object B plus per-pair caches
///
/// Contacts are kept in insertion order. After a `Boolean` or `Contacts`
/// query `len() > 0` implies `have_contact()` and `!have_contact()` implies
/// an empty contact list. `ClosestPoints` queries may leave one
/// closest-point contact in a set that does not have contact.
#[derive(Debug, Clone)]
pub struct ContactSet {
    object_a: CollisionObjectId,
    object_b: CollisionObjectId,
    contacts: Vec<Contact>,
    have_contact: bool,
    pub(crate) can_collide: CanCollide,
    pub(crate) filter_stamp: Option<FilterStamp>,
    pub(crate) algorithm: Option<CachedAlgorithm>,
    pub(crate) is_valid: bool,
    pub(crate) pose_stamp: (u64, u64),
}

impl ContactSet {
    /// Create an empty contact set for the pair
    ///
    /// Objects that are not registered in a domain (ad hoc queries) use
    /// `CollisionObjectId::null()`.
    pub fn new(object_a: CollisionObjectId, object_b: CollisionObjectId) -> Self {
        Self {
            object_a,
            object_b,
            contacts: Vec::with_capacity(4),
            have_contact: false,
            can_collide: CanCollide::Unknown,
            filter_stamp: None,
            algorithm: None,
            is_valid: false,
            pose_stamp: (0, 0),
        }
    }

    /// An unassigned set, used by the contact-set pool
    pub(crate) fn empty() -> Self {
        Self::new(CollisionObjectId::null(), CollisionObjectId::null())
    }

    /// Reset all state so the set can be reused for another pair
    pub(crate) fn reset(&mut self) {
        self.object_a = CollisionObjectId::null();
        self.object_b = CollisionObjectId::null();
        self.contacts.clear();
        self.have_contact = false;
        self.can_collide = CanCollide::Unknown;
        self.filter_stamp = None;
        self.algorithm = None;
        self.is_valid = false;
        self.pose_stamp = (0, 0);
    }

    pub(crate) fn assign(&mut self, object_a: CollisionObjectId, object_b: CollisionObjectId) {
        self.object_a = object_a;
        self.object_b = object_b;
    }

    /// First object of the pair
    pub fn object_a(&self) -> CollisionObjectId {
        self.object_a
    }

    /// Second object of the pair
    pub fn object_b(&self) -> CollisionObjectId {
        self.object_b
    }

    /// Whether the pair contains `id`
    pub fn contains(&self, id: CollisionObjectId) -> bool {
        self.object_a == id || self.object_b == id
    }

    /// The other object of the pair, if `id` is part of it
    pub fn partner_of(&self, id: CollisionObjectId) -> Option<CollisionObjectId> {
        if self.object_a == id {
            Some(self.object_b)
        } else if self.object_b == id {
            Some(self.object_a)
        } else {
            None
        }
    }

    /// Whether the objects touch or interpenetrate
    pub fn have_contact(&self) -> bool {
        self.have_contact
    }

    /// Set the contact flag; clearing it also drops all contacts
    pub fn set_have_contact(&mut self, have_contact: bool) {
        self.have_contact = have_contact;
        if !have_contact {
            self.contacts.clear();
        }
    }

    /// Contacts in insertion order
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Mutable access to the contacts (e.g. to attach solver user data)
    pub fn contacts_mut(&mut self) -> &mut [Contact] {
        &mut self.contacts
    }

    /// Number of contacts
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether the set holds no contacts
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Append a contact and mark the pair as touching
    pub fn add_contact(&mut self, contact: Contact) {
        self.contacts.push(contact);
        self.have_contact = true;
    }

    /// Append a closest-point result without touching the contact flag
    ///
    /// Closest-point queries report the nearest pair of surface points even
    /// for separated objects, so the list may be non-empty while
    /// `have_contact()` is `false`.
    pub fn add_closest_point(&mut self, contact: Contact) {
        self.contacts.push(contact);
    }

    /// Negate the normal of every contact
    pub(crate) fn flip_normals(&mut self) {
        for contact in &mut self.contacts {
            contact.swap_in_place();
        }
    }

    /// Remove all contacts and clear the contact flag
    pub fn clear(&mut self) {
        self.contacts.clear();
        self.have_contact = false;
    }

    /// Cached filter result
    pub fn can_collide(&self) -> CanCollide {
        self.can_collide
    }

    /// Whether the cached narrow-phase result is still current
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Contact with the largest penetration depth
    pub fn deepest_contact(&self) -> Option<&Contact> {
        self.contacts
            .iter()
            .max_by(|a, b| a.penetration_depth.total_cmp(&b.penetration_depth))
    }

    /// Contact with the smallest penetration depth (for rays: the nearest hit)
    pub fn shallowest_contact(&self) -> Option<&Contact> {
        self.contacts
            .iter()
            .min_by(|a, b| a.penetration_depth.total_cmp(&b.penetration_depth))
    }

    /// Exchange A and B, negating every normal
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.object_a, &mut self.object_b);
        std::mem::swap(&mut self.pose_stamp.0, &mut self.pose_stamp.1);
        if let Some(stamp) = &mut self.filter_stamp {
            std::mem::swap(&mut stamp.object_a, &mut stamp.object_b);
        }
        self.flip_normals();
    }

    /// Copy of this set with A and B exchanged
    pub fn swapped(&self) -> Self {
        let mut copy = self.clone();
        copy.swap();
        copy
    }

    /// Add `delta_time` to the lifetime of every contact
    pub fn age(&mut self, delta_time: f64) {
        for contact in &mut self.contacts {
            contact.lifetime += delta_time;
        }
    }

    /// Merge freshly computed contacts into this persistent set
    ///
    /// A new contact within `tolerance` of a cached one replaces it in place
    /// and inherits its lifetime (aged by `delta_time`) and user data.
    /// Other new contacts are appended with zero lifetime; cached contacts
    /// without a match are dropped.
    pub fn merge(&mut self, fresh: &ContactSet, tolerance: f32, delta_time: f64) {
        let tolerance_squared = tolerance * tolerance;
        let mut previous = std::mem::take(&mut self.contacts);
        self.contacts.reserve(fresh.contacts.len());

        for new_contact in &fresh.contacts {
            let matched = previous
                .iter()
                .enumerate()
                .map(|(index, old)| (index, (old.position - new_contact.position).magnitude_squared()))
                .filter(|(_, distance_squared)| *distance_squared <= tolerance_squared)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(index, _)| index);

            let mut contact = new_contact.clone();
            if let Some(index) = matched {
                let old = previous.swap_remove(index);
                contact.lifetime = old.lifetime + delta_time;
                contact.user_data = old.user_data;
            } else {
                contact.lifetime = 0.0;
            }
            self.contacts.push(contact);
        }

        self.have_contact = fresh.have_contact;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    fn set_with(points: &[Vec3]) -> ContactSet {
        let mut set = ContactSet::empty();
        for &point in points {
            set.add_contact(Contact::new(point, Vec3::y(), 0.1));
        }
        set
    }

    #[test]
    fn test_add_contact_sets_flag() {
        let set = set_with(&[Vec3::zeros()]);
        assert!(set.have_contact());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_clearing_flag_drops_contacts() {
        let mut set = set_with(&[Vec3::zeros(), Vec3::x()]);
        set.set_have_contact(false);
        assert!(set.is_empty());
    }

    #[test]
    fn test_merge_preserves_lifetime_within_tolerance() {
        let mut persistent = set_with(&[Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0)]);
        persistent.age(0.5);
        persistent.contacts_mut()[0].user_data = Some(Arc::new("constraint"));

        let fresh = set_with(&[Vec3::new(0.001, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)]);
        persistent.merge(&fresh, 0.01, 0.25);

        assert_eq!(persistent.len(), 2);
        assert_relative_eq!(persistent.contacts()[0].lifetime, 0.75);
        assert!(persistent.contacts()[0].user_data.is_some());
        assert_relative_eq!(persistent.contacts()[0].position, Vec3::new(0.001, 0.0, 0.0));
        // New point, the unmatched cached contact at x = 1 is gone
        assert_eq!(persistent.contacts()[1].lifetime, 0.0);
        assert_relative_eq!(persistent.contacts()[1].position, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_merge_with_no_contact_clears() {
        let mut persistent = set_with(&[Vec3::zeros()]);
        persistent.merge(&ContactSet::empty(), 0.01, 0.0);
        assert!(!persistent.have_contact());
        assert!(persistent.is_empty());
    }

    #[test]
    fn test_swap_negates_normals() {
        let mut set = ContactSet::empty();
        set.add_contact(Contact::new(Vec3::zeros(), Vec3::x(), 0.3));
        let swapped = set.swapped();
        assert_eq!(swapped.contacts()[0].normal, -Vec3::x());
        assert_eq!(swapped.contacts()[0].penetration_depth, 0.3);
    }
}
