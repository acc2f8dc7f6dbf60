//! Ray vs convex shapes under arbitrary scale

use super::{restore_order, CollisionAlgorithm, ObjectPair};
use crate::collision::{CollisionError, CollisionObject, CollisionQueryType, Contact, ContactSet};
use crate::foundation::math::{utils, Vec3};
use crate::geometry::{Shape, ShapeType, WorldRay};

/// Ray vs sphere, ellipsoid or box
///
/// The ray segment is mapped into the unscaled local space of the convex
/// shape. Segment parameters are preserved by that affine map, so the hit
/// parameter found there is also the fraction of the world-space ray.
#[derive(Debug, Clone, Copy, Default)]
pub struct RayConvexAlgorithm;

/// First intersection of a segment with a convex shape
struct SegmentHit {
    /// Segment parameter in `[0, 1]`, zero when the segment starts inside
    t: f32,
    /// Outward surface normal in world space (None when starting inside)
    outward_normal: Option<Vec3>,
}

impl RayConvexAlgorithm {
    fn intersect(ray: &WorldRay, convex: &CollisionObject) -> Option<SegmentHit> {
        let pose = convex.pose();
        let scale = convex.geometry().scale();
        let p0 = pose.to_local_point(ray.origin).component_div(&scale);
        let p1 = pose.to_local_point(ray.end()).component_div(&scale);
        let e = p1 - p0;

        match convex.geometry().shape() {
            Shape::Sphere(sphere) => {
                let radius = sphere.radius();
                let a = e.magnitude_squared();
                let b = p0.dot(&e);
                let c = p0.magnitude_squared() - radius * radius;
                if c <= 0.0 {
                    return Some(SegmentHit { t: 0.0, outward_normal: None });
                }
                let discriminant = b * b - a * c;
                if discriminant < 0.0 || a <= 0.0 {
                    return None;
                }
                let t1 = (-b - discriminant.sqrt()) / a;
                if !(0.0..=1.0).contains(&t1) {
                    return None;
                }
                // Ellipsoid gradient in scaled local space is p / s
                let local_normal = (p0 + e * t1).component_div(&scale);
                Some(SegmentHit {
                    t: t1,
                    outward_normal: Some(pose.to_world_direction(local_normal)),
                })
            }
            Shape::Box(b) => {
                let half = b.half_extent();
                let mut t_enter = 0.0_f32;
                let mut t_exit = 1.0_f32;
                let mut enter_axis = None;

                for axis in 0..3 {
                    if e[axis].abs() <= f32::EPSILON {
                        if p0[axis].abs() > half[axis] {
                            return None;
                        }
                        continue;
                    }
                    let inv = 1.0 / e[axis];
                    let mut t1 = (-half[axis] - p0[axis]) * inv;
                    let mut t2 = (half[axis] - p0[axis]) * inv;
                    if t1 > t2 {
                        std::mem::swap(&mut t1, &mut t2);
                    }
                    if t1 > t_enter {
                        t_enter = t1;
                        enter_axis = Some(axis);
                    }
                    t_exit = t_exit.min(t2);
                    if t_enter > t_exit {
                        return None;
                    }
                }

                let outward_normal = enter_axis.map(|axis| {
                    let mut local = Vec3::zeros();
                    local[axis] = -e[axis].signum();
                    pose.to_world_direction(local)
                });
                Some(SegmentHit { t: t_enter, outward_normal })
            }
            Shape::Ray(_) => None,
        }
    }

    /// Ray hit contact for a successful intersection
    fn hit_contact(ray: &WorldRay, convex: &CollisionObject, hit: &SegmentHit) -> Contact {
        let distance = hit.t * ray.length;
        match hit.outward_normal {
            Some(outward) => Contact::ray_hit(ray.point_at(distance), utils::normalize_or(-outward, utils::up()), distance),
            None => {
                let normal = utils::normalize_or(convex.pose().position - ray.origin, utils::up());
                Contact::ray_hit(ray.origin, normal, 0.0)
            }
        }
    }

    /// Approximate closest points for a ray that misses
    ///
    /// Uses the segment point nearest the shape center and the support point
    /// of the shape toward it. Exact for spheres, conservative for
    /// ellipsoids and boxes.
    fn closest_points(ray: &WorldRay, convex: &CollisionObject) -> Option<Contact> {
        let pose = convex.pose();
        let center = pose.position;
        let segment_point = utils::closest_point_on_segment(ray.origin, ray.end(), center);
        let local_direction = pose.to_local_direction(segment_point - center);
        let support = convex
            .geometry()
            .shape()
            .support_point(local_direction, convex.geometry().scale())?;
        let surface_point = pose.to_world_point(support);

        let gap = surface_point - segment_point;
        let normal = utils::normalize_or(gap, utils::normalize_or(center - segment_point, utils::up()));
        let position = (surface_point + segment_point) * 0.5;
        Some(Contact::new(position, normal, -gap.magnitude()))
    }
}

impl CollisionAlgorithm for RayConvexAlgorithm {
    fn name(&self) -> &'static str {
        "RayConvexAlgorithm"
    }

    fn compute_collision(
        &self,
        pair: ObjectPair<'_>,
        contact_set: &mut ContactSet,
        query: CollisionQueryType,
    ) -> Result<(), CollisionError> {
        let (canonical, swapped) = match pair.shape_types() {
            (ShapeType::Ray, b) if b != ShapeType::Ray => (pair, false),
            (a, ShapeType::Ray) if a != ShapeType::Ray => (pair.swapped(), true),
            (a, b) => {
                return Err(CollisionError::InvalidArgument(format!(
                    "{} expects a ray and a convex shape, got {a:?} and {b:?}",
                    self.name()
                )))
            }
        };
        let Some(ray) = canonical.a.world_ray() else {
            return Err(CollisionError::InvalidArgument(format!("{} expects a ray object", self.name())));
        };
        let convex = canonical.b;

        contact_set.clear();
        let hit = Self::intersect(&ray, convex);

        match (query, hit) {
            (CollisionQueryType::Boolean, hit) => contact_set.set_have_contact(hit.is_some()),
            (_, Some(hit)) => contact_set.add_contact(Self::hit_contact(&ray, convex, &hit)),
            (CollisionQueryType::ClosestPoints, None) => {
                if let Some(contact) = Self::closest_points(&ray, convex) {
                    contact_set.add_closest_point(contact);
                }
            }
            (CollisionQueryType::Contacts, None) => {}
        }

        restore_order(contact_set, swapped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::foundation::math::{constants::PI, Quat};
    use approx::assert_relative_eq;

    fn run(pair: ObjectPair<'_>, query: CollisionQueryType) -> ContactSet {
        let mut set = scratch();
        RayConvexAlgorithm.compute_collision(pair, &mut set, query).unwrap();
        set
    }

    #[test]
    fn test_ray_hits_box_face() {
        let ray = ray(Vec3::new(-5.0, 0.2, 0.3), Vec3::x(), 10.0);
        let cube = box_at(Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0));
        let set = run(ObjectPair::new(&ray, &cube), CollisionQueryType::Contacts);

        let contact = &set.contacts()[0];
        assert_relative_eq!(contact.penetration_depth, 4.0, epsilon = 1e-5);
        assert_relative_eq!(contact.position, Vec3::new(-1.0, 0.2, 0.3), epsilon = 1e-5);
        assert_relative_eq!(contact.normal, Vec3::x(), epsilon = 1e-5);
    }

    #[test]
    fn test_ray_hits_rotated_box() {
        let ray = ray(Vec3::new(0.0, 5.0, 0.0), -Vec3::y(), 10.0);
        let tilted = rotated_box(Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0), Quat::from_axis_angle(&Vec3::z_axis(), PI / 4.0));
        let set = run(ObjectPair::new(&ray, &tilted), CollisionQueryType::Contacts);
        // Hits the upper corner edge at height sqrt(2)
        assert_relative_eq!(set.contacts()[0].penetration_depth, 5.0 - 2.0_f32.sqrt(), epsilon = 1e-4);
    }

    #[test]
    fn test_ray_misses_box() {
        let ray = ray(Vec3::new(-5.0, 1.5, 0.0), Vec3::x(), 10.0);
        let cube = box_at(Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0));
        let boolean = run(ObjectPair::new(&ray, &cube), CollisionQueryType::Boolean);
        assert!(!boolean.have_contact());

        let closest = run(ObjectPair::new(&ray, &cube), CollisionQueryType::ClosestPoints);
        assert!(!closest.have_contact());
        assert_eq!(closest.len(), 1);
        assert!(closest.contacts()[0].penetration_depth < 0.0);
    }

    #[test]
    fn test_ray_inside_box_has_zero_depth() {
        let ray = ray(Vec3::new(0.1, 0.0, 0.0), Vec3::x(), 10.0);
        let cube = box_at(Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0));
        let set = run(ObjectPair::new(&cube, &ray), CollisionQueryType::Contacts);
        assert_eq!(set.contacts()[0].penetration_depth, 0.0);
        // Swapped pair: normal points from the box toward the ray origin
        assert_relative_eq!(set.contacts()[0].normal, Vec3::x(), epsilon = 1e-5);
    }

    #[test]
    fn test_ray_hits_ellipsoid() {
        let ray = ray(Vec3::new(0.0, 5.0, 0.0), -Vec3::y(), 10.0);
        let ellipsoid = scaled_sphere(Vec3::zeros(), 1.0, Vec3::new(1.0, 3.0, 1.0));
        let set = run(ObjectPair::new(&ray, &ellipsoid), CollisionQueryType::Contacts);
        assert_relative_eq!(set.contacts()[0].penetration_depth, 2.0, epsilon = 1e-4);
        assert_relative_eq!(set.contacts()[0].normal, -Vec3::y(), epsilon = 1e-4);
    }

    #[test]
    fn test_two_rays_rejected() {
        let a = ray(Vec3::zeros(), Vec3::x(), 1.0);
        let b = ray(Vec3::zeros(), Vec3::y(), 1.0);
        let mut set = scratch();
        let result = RayConvexAlgorithm.compute_collision(ObjectPair::new(&a, &b), &mut set, CollisionQueryType::Contacts);
        assert!(result.is_err());
    }
}
