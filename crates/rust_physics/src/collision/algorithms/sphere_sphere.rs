//! Sphere vs sphere

use super::{CollisionAlgorithm, ObjectPair};
use crate::collision::{CollisionError, CollisionObject, CollisionQueryType, Contact, ContactSet};
use crate::foundation::math::utils;
use crate::geometry::ShapeType;

/// Analytic sphere vs sphere test, supports every query type
///
/// Scaled spheres use their largest scale component as radius factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SphereSphereAlgorithm;

pub(super) fn world_radius(object: &CollisionObject) -> Option<f32> {
    let sphere = object.geometry().shape().as_sphere()?;
    Some(sphere.radius() * object.geometry().scale().max())
}

impl CollisionAlgorithm for SphereSphereAlgorithm {
    fn name(&self) -> &'static str {
        "SphereSphereAlgorithm"
    }

    fn compute_collision(
        &self,
        pair: ObjectPair<'_>,
        contact_set: &mut ContactSet,
        query: CollisionQueryType,
    ) -> Result<(), CollisionError> {
        let (pair, _) = pair.canonical(ShapeType::Sphere, ShapeType::Sphere, self.name())?;
        let (Some(radius_a), Some(radius_b)) = (world_radius(pair.a), world_radius(pair.b)) else {
            return Err(CollisionError::InvalidArgument(format!("{} expects two spheres", self.name())));
        };

        contact_set.clear();
        let center_a = pair.a.pose().position;
        let center_b = pair.b.pose().position;
        let offset = center_b - center_a;
        let radius_sum = radius_a + radius_b;
        let distance_squared = offset.magnitude_squared();
        let have_contact = distance_squared <= radius_sum * radius_sum;

        match query {
            CollisionQueryType::Boolean => {
                contact_set.set_have_contact(have_contact);
                return Ok(());
            }
            CollisionQueryType::Contacts if !have_contact => return Ok(()),
            _ => {}
        }

        let penetration_depth = radius_sum - distance_squared.sqrt();
        let normal = utils::normalize_or(offset, utils::up());
        let position = center_a + normal * (radius_a - penetration_depth * 0.5);
        let contact = Contact::new(position, normal, penetration_depth);
        if have_contact {
            contact_set.add_contact(contact);
        } else {
            contact_set.add_closest_point(contact);
        }
        Ok(())
    }
}
