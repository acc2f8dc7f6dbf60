//! Box vs sphere

use super::sphere_sphere::world_radius;
use super::{restore_order, CollisionAlgorithm, ObjectPair};
use crate::collision::{CollisionError, CollisionQueryType, Contact, ContactSet};
use crate::foundation::math::{utils, Vec3};
use crate::geometry::ShapeType;

/// Closest point on the oriented box to the sphere center
///
/// A sphere center inside the box is pushed out along the face of minimum
/// penetration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxSphereAlgorithm;

impl CollisionAlgorithm for BoxSphereAlgorithm {
    fn name(&self) -> &'static str {
        "BoxSphereAlgorithm"
    }

    fn compute_collision(
        &self,
        pair: ObjectPair<'_>,
        contact_set: &mut ContactSet,
        query: CollisionQueryType,
    ) -> Result<(), CollisionError> {
        let (canonical, swapped) = pair.canonical(ShapeType::Box, ShapeType::Sphere, self.name())?;
        let box_object = canonical.a;
        let sphere_object = canonical.b;
        let (Some(b), Some(radius)) = (box_object.geometry().shape().as_box(), world_radius(sphere_object)) else {
            return Err(CollisionError::InvalidArgument(format!(
                "{} expects a box and a sphere",
                self.name()
            )));
        };

        contact_set.clear();
        let pose = box_object.pose();
        let half = b.half_extent().component_mul(&box_object.geometry().scale());
        let center = pose.to_local_point(sphere_object.pose().position);
        let clamped = center.zip_map(&half, |c, h| c.clamp(-h, h));

        let (surface_point, local_normal, penetration_depth) = if clamped == center {
            // Center inside: leave through the nearest face
            let depths = half - center.abs();
            let axis = depths.imin();
            let sign = if center[axis] >= 0.0 { 1.0 } else { -1.0 };
            let mut surface = center;
            surface[axis] = sign * half[axis];
            let mut normal = Vec3::zeros();
            normal[axis] = sign;
            (surface, normal, radius + depths[axis])
        } else {
            let delta = center - clamped;
            let distance = delta.magnitude();
            (clamped, delta / distance, radius - distance)
        };

        let have_contact = penetration_depth >= 0.0;
        match query {
            CollisionQueryType::Boolean => {
                contact_set.set_have_contact(have_contact);
                return Ok(());
            }
            CollisionQueryType::Contacts if !have_contact => return Ok(()),
            _ => {}
        }

        let normal = utils::normalize_or(pose.to_world_direction(local_normal), utils::up());
        let box_point = pose.to_world_point(surface_point);
        let sphere_point = sphere_object.pose().position - normal * radius;
        let contact = Contact::new((box_point + sphere_point) * 0.5, normal, penetration_depth);
        if have_contact {
            contact_set.add_contact(contact);
        } else {
            contact_set.add_closest_point(contact);
        }
        restore_order(contact_set, swapped);
        Ok(())
    }
}
