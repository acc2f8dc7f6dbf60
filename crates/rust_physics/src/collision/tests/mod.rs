//! Collision domain scenarios

use super::algorithms::test_support::*;
use super::*;
use crate::config::CollisionConfig;
use crate::foundation::collections::Key;
use crate::foundation::math::Vec3;
use crate::geometry::{BoxShape, Pose, RayShape};
use approx::assert_relative_eq;

fn serial_domain() -> CollisionDomain {
    crate::foundation::logging::init_for_tests();
    CollisionDomain::new(CollisionConfig::default().with_multithreading(false)).unwrap()
}

fn ground() -> CollisionObject {
    box_at(Vec3::zeros(), Vec3::new(20.0, 1.0, 20.0))
}

fn first_hit_ray(origin: Vec3, direction: Vec3, length: f32) -> CollisionObject {
    let shape = RayShape::new(Vec3::zeros(), direction, length)
        .unwrap()
        .with_stops_at_first_hit(true);
    CollisionObject::from_shape(shape, Pose::from_position(origin)).unwrap()
}

/// Comparable snapshot of the published contact sets
fn snapshot(domain: &CollisionDomain) -> Vec<(CollisionObjectId, CollisionObjectId, Vec<(Vec3, Vec3, f32, f64)>)> {
    domain
        .contact_sets()
        .map(|set| {
            let contacts = set
                .contacts()
                .iter()
                .map(|c| (c.position, c.normal, c.penetration_depth, c.lifetime))
                .collect();
            (set.object_a(), set.object_b(), contacts)
        })
        .collect()
}

#[test]
fn test_update_publishes_resting_contact() {
    let mut domain = serial_domain();
    let floor = domain.add_object(ground()).unwrap();
    let ball = domain.add_object(sphere_at(Vec3::new(1.0, 0.9, 0.0), 0.5)).unwrap();
    domain.add_object(sphere_at(Vec3::new(8.0, 5.0, 0.0), 0.5)).unwrap();

    domain.update(1.0 / 60.0).unwrap();

    assert_eq!(domain.contact_set_count(), 1);
    assert!(domain.have_contact(ball, floor));
    assert!(domain.has_contact(ball));
    let set = domain.get_contacts_between(floor, ball).unwrap();
    assert!(set.have_contact());
    assert_eq!(set.can_collide(), CanCollide::Yes);
    assert!(set.is_valid());
    assert_relative_eq!(set.contacts()[0].penetration_depth, 0.1, epsilon = 1e-5);
    assert_eq!(domain.get_contacts(ball).count(), 1);
}

#[test]
fn test_update_with_zero_time_is_idempotent() {
    let mut domain = serial_domain();
    domain.add_object(ground()).unwrap();
    domain.add_object(box_at(Vec3::new(0.0, 0.9, 0.0), Vec3::new(1.0, 1.0, 1.0))).unwrap();
    domain.add_object(sphere_at(Vec3::new(3.0, 0.8, 0.0), 0.5)).unwrap();

    domain.update(0.0).unwrap();
    let first = snapshot(&domain);
    domain.update(0.0).unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(snapshot(&domain), first);
}

#[test]
fn test_contacts_age_while_matched() {
    let mut domain = serial_domain();
    domain.add_object(ground()).unwrap();
    let ball = domain.add_object(sphere_at(Vec3::new(0.0, 0.9, 0.0), 0.5)).unwrap();

    domain.update(0.5).unwrap();
    domain.update(0.5).unwrap();
    let lifetime = |domain: &CollisionDomain| domain.get_contacts(ball).next().unwrap().contacts()[0].lifetime;
    assert_relative_eq!(lifetime(&domain), 0.5);

    // Within the merge tolerance the contact keeps its history
    domain.set_pose(ball, Pose::from_position(Vec3::new(0.001, 0.9, 0.0))).unwrap();
    domain.update(0.5).unwrap();
    assert_relative_eq!(lifetime(&domain), 1.0);

    // A jump further than the tolerance starts a new contact
    domain.set_pose(ball, Pose::from_position(Vec3::new(2.0, 0.9, 0.0))).unwrap();
    domain.update(0.5).unwrap();
    assert_relative_eq!(lifetime(&domain), 0.0);
}

#[test]
fn test_separated_pair_is_dropped() {
    let mut domain = serial_domain();
    let floor = domain.add_object(ground()).unwrap();
    let ball = domain.add_object(sphere_at(Vec3::new(0.0, 0.9, 0.0), 0.5)).unwrap();
    domain.update(0.0).unwrap();
    assert!(domain.have_contact(floor, ball));

    domain.set_pose(ball, Pose::from_position(Vec3::new(0.0, 10.0, 0.0))).unwrap();
    domain.update(0.0).unwrap();
    assert!(!domain.have_contact(floor, ball));
    assert_eq!(domain.contact_set_count(), 0);
}

#[test]
fn test_first_hit_ray_reports_nearest_blocker() {
    let mut domain = serial_domain();
    let far = domain.add_object(box_at(Vec3::new(10.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0))).unwrap();
    let near = domain.add_object(box_at(Vec3::new(5.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0))).unwrap();
    let ray = domain.add_object(first_hit_ray(Vec3::zeros(), Vec3::x(), 20.0)).unwrap();
    let sensor = domain.add_object(ray_object_through_both()).unwrap();

    domain.update(0.0).unwrap();

    let blocker = domain.first_hit(ray).unwrap();
    assert_eq!(blocker.partner_of(ray), Some(near));
    assert_relative_eq!(blocker.contacts()[0].penetration_depth, 4.0, epsilon = 1e-5);
    assert!(domain.have_contact(ray, near));
    assert!(!domain.have_contact(ray, far));

    // A plain ray reports every hit
    assert!(domain.have_contact(sensor, near));
    assert!(domain.have_contact(sensor, far));

    // Removing the blocker exposes the one behind it
    domain.remove_object(near).unwrap();
    assert!(domain.first_hit(ray).is_none());
    domain.update(0.0).unwrap();
    assert_eq!(domain.first_hit(ray).and_then(|set| set.partner_of(ray)), Some(far));
}

fn ray_object_through_both() -> CollisionObject {
    ray(Vec3::new(0.0, 0.5, 0.0), Vec3::x(), 20.0)
}

#[test]
fn test_ray_missing_the_box_is_rejected() {
    let mut domain = serial_domain();
    let block = domain.add_object(box_at(Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0))).unwrap();
    // Bounding boxes overlap, the segment passes above the corner at (-1, 1)
    let direction = Vec3::new(2.0, 2.5, 0.0).normalize();
    let miss = domain
        .add_object(ray(Vec3::new(-2.0, 0.0, 0.0), direction, Vec3::new(2.0, 2.5, 0.0).magnitude()))
        .unwrap();

    domain.update(0.0).unwrap();
    assert!(!domain.have_contact(block, miss));
}

#[test]
fn test_multithreaded_update_matches_single_threaded() {
    let mut serial = serial_domain();
    let config = CollisionConfig::default().with_multithreading(true).with_worker_threads(4);
    let mut parallel = CollisionDomain::new(config).unwrap();

    for domain in [&mut serial, &mut parallel] {
        domain.add_object(ground()).unwrap();
        for i in 0..6 {
            for j in 0..6 {
                #[allow(clippy::cast_precision_loss)]
                let (x, z) = (i as f32 * 0.9 - 2.5, j as f32 * 0.9 - 2.5);
                if (i + j) % 2 == 0 {
                    domain.add_object(sphere_at(Vec3::new(x, 0.9, z), 0.5)).unwrap();
                } else {
                    domain.add_object(box_at(Vec3::new(x, 0.95, z), Vec3::new(1.0, 1.0, 1.0))).unwrap();
                }
            }
        }
        domain.add_object(ray(Vec3::new(-4.0, 0.9, -2.5), Vec3::x(), 8.0)).unwrap();
    }

    for _ in 0..3 {
        serial.update(1.0 / 60.0).unwrap();
        parallel.update(1.0 / 60.0).unwrap();
        let expected = snapshot(&serial);
        assert!(expected.len() > 36);
        assert_eq!(snapshot(&parallel), expected);
    }
}

#[test]
fn test_filter_results_are_cached_until_flushed() {
    let mut domain = serial_domain();
    let a = domain.add_object(sphere_at(Vec3::zeros(), 1.0).with_group(1)).unwrap();
    let b = domain.add_object(sphere_at(Vec3::new(1.5, 0.0, 0.0), 1.0).with_group(2)).unwrap();

    let mut filter = GroupCollisionFilter::new();
    filter.disable_group_pair(1, 2);
    domain.set_filter(filter);
    domain.update(0.0).unwrap();
    assert!(!domain.have_contact(a, b));

    // Changing an object's group re-runs the filter for its pairs
    domain.set_group(b, 3).unwrap();
    domain.update(0.0).unwrap();
    assert!(domain.have_contact(a, b));

    domain.set_filter(|x: &CollisionObject, y: &CollisionObject| x.group() == y.group());
    domain.update(0.0).unwrap();
    assert!(!domain.have_contact(a, b));
}

#[test]
fn test_disabled_object_never_collides() {
    let mut domain = serial_domain();
    let floor = domain.add_object(ground()).unwrap();
    let ball = domain.add_object(sphere_at(Vec3::new(0.0, 0.9, 0.0), 0.5)).unwrap();

    domain.set_enabled(ball, false).unwrap();
    domain.update(0.0).unwrap();
    assert!(!domain.have_contact(floor, ball));

    domain.set_enabled(ball, true).unwrap();
    domain.update(0.0).unwrap();
    assert!(domain.have_contact(floor, ball));
}

#[test]
fn test_layers_filter_pairs() {
    let mut domain = serial_domain();
    let floor = domain
        .add_object(ground().with_layers(CollisionLayers::new(CollisionLayer::STATIC, CollisionLayer::all())))
        .unwrap();
    let debris = domain
        .add_object(
            sphere_at(Vec3::new(0.0, 0.9, 0.0), 0.5)
                .with_layers(CollisionLayers::new(CollisionLayer::DEBRIS, CollisionLayer::DYNAMIC)),
        )
        .unwrap();

    domain.update(0.0).unwrap();
    assert!(!domain.have_contact(floor, debris));

    domain
        .set_layers(debris, CollisionLayers::new(CollisionLayer::DEBRIS, CollisionLayer::STATIC))
        .unwrap();
    domain.update(0.0).unwrap();
    assert!(domain.have_contact(floor, debris));
}

#[test]
fn test_shape_change_selects_new_algorithm() {
    let mut domain = serial_domain();
    let floor = domain.add_object(ground()).unwrap();
    let body = domain.add_object(sphere_at(Vec3::new(0.0, 0.9, 0.0), 0.5)).unwrap();
    domain.update(0.0).unwrap();
    assert_eq!(domain.get_contacts_between(floor, body).unwrap().len(), 1);

    domain.set_shape(body, BoxShape::cube(1.0).unwrap()).unwrap();
    domain.update(0.0).unwrap();
    let set = domain.get_contacts_between(floor, body).unwrap();
    assert_eq!(set.len(), 4);
    for contact in set.contacts() {
        assert_relative_eq!(contact.penetration_depth, 0.1, epsilon = 1e-4);
    }
}

#[test]
fn test_remove_and_register_again() {
    let mut domain = serial_domain();
    let floor = domain.add_object(ground()).unwrap();
    let ball = domain.add_object(sphere_at(Vec3::new(0.0, 0.9, 0.0), 0.5)).unwrap();
    domain.update(0.0).unwrap();

    let removed = domain.remove_object(ball).unwrap();
    assert!(removed.domain().is_none());
    assert_eq!(domain.contact_set_count(), 0);
    assert!(!domain.has_contact(floor));
    assert!(matches!(domain.remove_object(ball), Err(CollisionError::UnknownObject(_))));

    let ball = domain.add_object(removed).unwrap();
    domain.update(0.0).unwrap();
    assert!(domain.have_contact(floor, ball));
}

#[test]
fn test_object_registered_elsewhere_is_rejected() {
    let mut first = serial_domain();
    let mut second = serial_domain();
    let id = first.add_object(ground()).unwrap();
    let copy = first.object(id).unwrap().clone();

    assert_eq!(copy.domain(), Some(first.id()));
    assert!(matches!(second.add_object(copy), Err(CollisionError::ObjectAlreadyRegistered)));
    assert_eq!(second.object_count(), 0);
}

#[test]
fn test_ad_hoc_queries() {
    let mut domain = serial_domain();
    let floor = domain.add_object(ground()).unwrap();
    domain.add_object(sphere_at(Vec3::new(5.0, 5.0, 0.0), 1.0)).unwrap();

    let probe = sphere_at(Vec3::new(0.0, 0.9, 0.0), 0.5);
    let sets = domain.get_contacts_with(&probe).unwrap();
    assert_eq!(sets.len(), 1);
    assert!(sets[0].object_a().is_null());
    assert_eq!(sets[0].object_b(), floor);
    assert!(domain.have_contact_with(&probe).unwrap());
    for set in sets {
        domain.recycle(set);
    }

    let far = sphere_at(Vec3::new(100.0, 100.0, 0.0), 0.5);
    assert!(domain.get_contacts_with(&far).unwrap().is_empty());
    assert!(!domain.have_contact_with(&far).unwrap());

    // Registered objects go through the cached path instead
    let registered = domain.object(floor).unwrap().clone();
    assert!(matches!(
        domain.get_contacts_with(&registered),
        Err(CollisionError::InvalidArgument(_))
    ));
}

#[test]
fn test_ad_hoc_first_hit_ray_keeps_nearest() {
    let mut domain = serial_domain();
    domain.add_object(sphere_at(Vec3::new(10.0, 0.0, 0.0), 1.0)).unwrap();
    let near = domain.add_object(sphere_at(Vec3::new(4.0, 0.0, 0.0), 1.0)).unwrap();

    let probe = first_hit_ray(Vec3::zeros(), Vec3::x(), 20.0);
    let sets = domain.get_contacts_with(&probe).unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].object_b(), near);
    assert_relative_eq!(sets[0].contacts()[0].penetration_depth, 3.0, epsilon = 1e-5);

    let sensor = ray(Vec3::zeros(), Vec3::x(), 20.0);
    assert_eq!(domain.get_contacts_with(&sensor).unwrap().len(), 2);
}

#[test]
fn test_compute_closest_points_between_objects() {
    let domain = serial_domain();
    let a = sphere_at(Vec3::zeros(), 1.0);
    let b = sphere_at(Vec3::new(4.0, 0.0, 0.0), 1.0);

    let set = domain.compute_contacts(&a, &b, CollisionQueryType::ClosestPoints).unwrap();
    assert!(!set.have_contact());
    assert_eq!(set.len(), 1);
    assert_relative_eq!(set.contacts()[0].penetration_depth, -2.0, epsilon = 1e-5);

    let boolean = domain.compute_contacts(&a, &b, CollisionQueryType::Boolean).unwrap();
    assert!(!boolean.have_contact());
    assert!(boolean.is_empty());
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = CollisionConfig::default().with_contact_position_tolerance(-1.0);
    assert!(matches!(CollisionDomain::new(config), Err(CollisionError::Config(_))));
}
