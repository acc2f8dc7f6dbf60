//! Ray vs sphere

use super::{restore_order, CollisionAlgorithm, ObjectPair, RayConvexAlgorithm};
use crate::collision::{CollisionError, CollisionQueryType, Contact, ContactSet};
use crate::foundation::math::utils;
use crate::geometry::ShapeType;

/// Analytic ray vs uniformly scaled sphere
///
/// Non-uniformly scaled spheres are ellipsoids and are passed on to
/// [`RayConvexAlgorithm`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RaySphereAlgorithm;

impl CollisionAlgorithm for RaySphereAlgorithm {
    fn name(&self) -> &'static str {
        "RaySphereAlgorithm"
    }

    fn compute_collision(
        &self,
        pair: ObjectPair<'_>,
        contact_set: &mut ContactSet,
        query: CollisionQueryType,
    ) -> Result<(), CollisionError> {
        let (canonical, swapped) = pair.canonical(ShapeType::Ray, ShapeType::Sphere, self.name())?;
        let ray_object = canonical.a;
        let sphere_object = canonical.b;

        let scale = sphere_object.geometry().scale();
        if !utils::is_uniform(&scale) {
            return RayConvexAlgorithm.compute_collision(pair, contact_set, query);
        }

        let (Some(ray), Some(sphere)) = (
            ray_object.world_ray(),
            sphere_object.geometry().shape().as_sphere(),
        ) else {
            return Err(CollisionError::InvalidArgument(format!(
                "{} received a shape that does not match its shape type",
                self.name()
            )));
        };

        contact_set.clear();
        let center = sphere_object.pose().position;
        let radius = sphere.radius() * scale.x;

        if matches!(query, CollisionQueryType::Boolean | CollisionQueryType::ClosestPoints) {
            let closest = utils::closest_point_on_segment(ray.origin, ray.end(), center);
            let to_center = center - closest;
            let distance_squared = to_center.magnitude_squared();
            let have_contact = radius * radius - distance_squared >= 0.0;

            if query == CollisionQueryType::Boolean {
                contact_set.set_have_contact(have_contact);
                return Ok(());
            }

            let penetration_depth = radius - distance_squared.sqrt();
            if penetration_depth <= 0.0 {
                let normal = utils::normalize_or(to_center, utils::up());
                let surface_point = center - normal * radius;
                let position = (surface_point + closest) * 0.5;
                let contact = Contact::new(position, normal, penetration_depth);
                if have_contact {
                    contact_set.add_contact(contact);
                } else {
                    contact_set.add_closest_point(contact);
                }
                restore_order(contact_set, swapped);
                return Ok(());
            }
            // Penetrating closest points are the ray hit
        }

        // Quadratic in the sphere's local frame
        let pose = sphere_object.pose();
        let s = pose.to_local_point(ray.origin);
        let r = pose.to_local_direction(ray.direction * ray.length);
        let length_squared = r.magnitude_squared();

        let delta = -s.dot(&r);
        let sigma = delta * delta - length_squared * (s.magnitude_squared() - radius * radius);
        if sigma < 0.0 {
            return Ok(());
        }
        let sqrt_sigma = sigma.sqrt();
        let lambda_1 = (delta - sqrt_sigma) / length_squared;
        let lambda_2 = delta + sqrt_sigma;
        if lambda_2 < 0.0 || lambda_1 > 1.0 {
            return Ok(());
        }

        let contact = if lambda_1 > 0.0 {
            let local_normal = -(s + r * lambda_1);
            let normal = utils::normalize_or(pose.to_world_direction(local_normal), utils::up());
            Contact::ray_hit(ray.point_at(lambda_1 * ray.length), normal, lambda_1 * ray.length)
        } else {
            // Ray starts inside the sphere
            let normal = utils::normalize_or(pose.to_world_direction(-s), utils::up());
            Contact::ray_hit(ray.origin, normal, 0.0)
        };

        contact_set.add_contact(contact);
        restore_order(contact_set, swapped);
        Ok(())
    }
}
