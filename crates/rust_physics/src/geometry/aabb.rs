//! Axis-aligned bounding boxes

use crate::foundation::math::Vec3;

/// Axis-Aligned Bounding Box for broad-phase queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest AABB containing both points
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Smallest AABB containing this one and `other`
    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if `other` lies completely inside this AABB
    pub fn contains(&self, other: &Aabb) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Check if this AABB intersects another AABB (touching counts)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Check that both corners are finite
    pub fn is_finite(&self) -> bool {
        crate::foundation::math::utils::is_finite(&self.min)
            && crate::foundation::math::utils::is_finite(&self.max)
    }

    /// Slab test of the segment `origin + t * direction`, `t ∈ [0, length]`
    ///
    /// `inverse_direction` is the component-wise reciprocal of `direction`
    /// (infinite for zero components), precomputed once per ray.
    /// Based on "An Efficient and Robust Ray–Box Intersection Algorithm".
    pub fn intersects_segment(&self, origin: Vec3, inverse_direction: Vec3, length: f32) -> bool {
        let mut t_min = 0.0_f32;
        let mut t_max = length;

        for axis in 0..3 {
            let inv = inverse_direction[axis];
            let mut t1 = (self.min[axis] - origin[axis]) * inv;
            let mut t2 = (self.max[axis] - origin[axis]) * inv;

            // 0 * inf yields NaN when the origin lies exactly on a slab plane
            // of an axis-parallel ray; such a ray is inside that slab.
            if t1.is_nan() || t2.is_nan() {
                if origin[axis] < self.min[axis] || origin[axis] > self.max[axis] {
                    return false;
                }
                continue;
            }

            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return false;
            }
        }

        true
    }
}

/// Component-wise reciprocal of a ray direction, infinite for zero components
pub fn inverse_direction(direction: Vec3) -> Vec3 {
    Vec3::new(
        if direction.x != 0.0 { 1.0 / direction.x } else { f32::INFINITY },
        if direction.y != 0.0 { 1.0 / direction.y } else { f32::INFINITY },
        if direction.z != 0.0 { 1.0 / direction.z } else { f32::INFINITY },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_intersects_and_contains() {
        let a = unit_box();
        let b = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let c = Aabb::new(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains(&Aabb::new(Vec3::zeros(), Vec3::new(0.5, 0.5, 0.5))));
        assert!(!a.contains(&b));
    }

    #[test]
    fn test_segment_hits_box() {
        let direction = Vec3::new(1.0, 0.0, 0.0);
        let inv = inverse_direction(direction);
        assert!(unit_box().intersects_segment(Vec3::new(-5.0, 0.0, 0.0), inv, 10.0));
    }

    #[test]
    fn test_segment_too_short() {
        let direction = Vec3::new(1.0, 0.0, 0.0);
        let inv = inverse_direction(direction);
        assert!(!unit_box().intersects_segment(Vec3::new(-5.0, 0.0, 0.0), inv, 3.0));
    }

    #[test]
    fn test_segment_pointing_away() {
        let direction = Vec3::new(-1.0, 0.0, 0.0);
        let inv = inverse_direction(direction);
        assert!(!unit_box().intersects_segment(Vec3::new(-5.0, 0.0, 0.0), inv, 10.0));
    }

    #[test]
    fn test_axis_parallel_segment_outside_slab() {
        let direction = Vec3::new(1.0, 0.0, 0.0);
        let inv = inverse_direction(direction);
        assert!(!unit_box().intersects_segment(Vec3::new(-5.0, 2.0, 0.0), inv, 10.0));
        // On the boundary plane of the y slab
        assert!(unit_box().intersects_segment(Vec3::new(-5.0, 1.0, 0.0), inv, 10.0));
    }
}
