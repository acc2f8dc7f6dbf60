//! Box vs box
//!
//! Separating axis test over the 15 candidate axes of two oriented boxes
//! (3 face normals of each box plus the 9 edge-edge cross products), see
//! Ericson, "Real-Time Collision Detection", 4.4.1. Face contacts are built
//! by clipping the incident face against the reference face
//! (Sutherland–Hodgman) and reducing the result to at most four points.

use super::{CollisionAlgorithm, ObjectPair};
use crate::collision::{CollisionError, CollisionObject, CollisionQueryType, Contact, ContactSet};
use crate::foundation::logging::trace;
use crate::foundation::math::{constants, utils, Mat2, Mat3, Vec2, Vec3};
use crate::geometry::ShapeType;

/// Maximum number of contacts of a face manifold
const MAX_MANIFOLD_POINTS: usize = 4;

/// Signed polygon areas below this are treated as degenerate
const DEGENERATE_AREA: f32 = 1e-9;

/// Relative margin an edge axis needs to beat a face axis
///
/// Edge axes that are parallel to a face normal (e.g. `A_x × B_x` for boxes
/// rotated about a common axis) can win a tie by float noise, which would
/// replace a face manifold by a single edge contact.
const EDGE_AXIS_TOLERANCE: f32 = 1e-4;

/// Oriented box vs oriented box
///
/// Supports `Boolean` and `Contacts`. `ClosestPoints` is not supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxBoxAlgorithm;

/// A box in world space with scaled half extents
#[derive(Debug, Clone, Copy)]
struct OrientedBox {
    position: Vec3,
    rotation: Mat3,
    half: Vec3,
}

impl OrientedBox {
    fn from_object(object: &CollisionObject) -> Option<Self> {
        let b = object.geometry().shape().as_box()?;
        Some(Self {
            position: object.pose().position,
            rotation: object.pose().rotation_matrix(),
            half: b.half_extent().component_mul(&object.geometry().scale()),
        })
    }

    fn axis(&self, index: usize) -> Vec3 {
        self.rotation.column(index).into_owned()
    }
}

/// Axis of minimum penetration found by the separating axis test
#[derive(Debug, Clone, Copy)]
struct Candidate {
    /// 0..=2 faces of A, 3..=5 faces of B, 6..=14 edge pairs
    index: usize,
    /// Unit axis in A's frame, pointing from A toward B
    axis: Vec3,
    /// Negative overlap along `axis`
    separation: f32,
}

enum Separation {
    Separated,
    Overlapping(Option<Candidate>),
}

/// A clipped manifold point
#[derive(Debug, Clone, Copy)]
struct FacePoint {
    /// Coordinates in the reference face basis
    planar: Vec2,
    /// World-space point on the incident face
    point: Vec3,
    depth: f32,
}

fn offer(best: &mut Option<Candidate>, index: usize, axis: Vec3, projected_center: f32, separation: f32) {
    let better = match *best {
        None => true,
        Some(b) if index >= 6 && b.index < 6 => {
            separation > b.separation + EDGE_AXIS_TOLERANCE * b.separation.abs().max(1.0)
        }
        Some(b) => separation > b.separation,
    };
    if better {
        let axis = if projected_center < 0.0 { -axis } else { axis };
        *best = Some(Candidate { index, axis, separation });
    }
}

/// Run the 15-axis test in A's local frame
///
/// Returns on the first separating axis. With `track` unset only the
/// overlap decision is made.
fn find_separating_axis(a: &OrientedBox, b: &OrientedBox, track: bool) -> Separation {
    let to_local = a.rotation.transpose();
    let rotation_b = to_local * b.rotation;
    let abs_rotation_b = rotation_b.abs();
    let center_b = to_local * (b.position - a.position);
    let ea = a.half;
    let eb = b.half;
    let mut best = None;

    for i in 0..3 {
        let projected = center_b[i];
        let radius_b: f32 = (0..3).map(|k| abs_rotation_b[(i, k)] * eb[k]).sum();
        let separation = projected.abs() - (ea[i] + radius_b);
        if separation > 0.0 {
            return Separation::Separated;
        }
        if track {
            let mut axis = Vec3::zeros();
            axis[i] = 1.0;
            offer(&mut best, i, axis, projected, separation);
        }
    }

    for j in 0..3 {
        let axis = rotation_b.column(j).into_owned();
        let projected = axis.dot(&center_b);
        let radius_a: f32 = (0..3).map(|k| abs_rotation_b[(k, j)] * ea[k]).sum();
        let separation = projected.abs() - (radius_a + eb[j]);
        if separation > 0.0 {
            return Separation::Separated;
        }
        if track {
            offer(&mut best, 3 + j, axis, projected, separation);
        }
    }

    for i in 0..3 {
        for j in 0..3 {
            let mut edge_a = Vec3::zeros();
            edge_a[i] = 1.0;
            let axis = edge_a.cross(&rotation_b.column(j));
            let length_squared = axis.magnitude_squared();
            // Parallel edges; the face axes already cover this direction
            if length_squared < constants::ZERO_LENGTH_SQUARED {
                continue;
            }
            let length = length_squared.sqrt();
            let projected = axis.dot(&center_b);
            let radius_a: f32 = (0..3).map(|k| ea[k] * axis[k].abs()).sum();
            let radius_b: f32 = (0..3).map(|k| eb[k] * axis.dot(&rotation_b.column(k)).abs()).sum();
            let separation = (projected.abs() - (radius_a + radius_b)) / length;
            if separation > 0.0 {
                return Separation::Separated;
            }
            if track {
                offer(&mut best, 6 + 3 * i + j, axis / length, projected, separation);
            }
        }
    }

    Separation::Overlapping(best)
}

fn sign(value: f32) -> f32 {
    if value >= 0.0 { 1.0 } else { -1.0 }
}

/// Single contact between the two edges that produced the axis
fn edge_contact(a: &OrientedBox, b: &OrientedBox, candidate: &Candidate) -> Contact {
    let edge_index = candidate.index - 6;
    let (i, j) = (edge_index / 3, edge_index % 3);
    let normal = candidate.axis;

    let to_local = a.rotation.transpose();
    let rotation_b = to_local * b.rotation;
    let center_b = to_local * (b.position - a.position);

    // Edge of A farthest along the normal
    let mut a_mid = Vec3::zeros();
    for k in (0..3).filter(|&k| k != i) {
        a_mid[k] = sign(normal[k]) * a.half[k];
    }
    let mut a_dir = Vec3::zeros();
    a_dir[i] = a.half[i];

    // Edge of B farthest against the normal, in B's frame
    let normal_b = rotation_b.transpose() * normal;
    let mut b_mid = Vec3::zeros();
    for k in (0..3).filter(|&k| k != j) {
        b_mid[k] = -sign(normal_b[k]) * b.half[k];
    }
    let mut b_dir = Vec3::zeros();
    b_dir[j] = b.half[j];

    let b0 = center_b + rotation_b * (b_mid - b_dir);
    let b1 = center_b + rotation_b * (b_mid + b_dir);
    let (on_a, on_b) = utils::closest_points_on_segments(a_mid - a_dir, a_mid + a_dir, b0, b1);

    let position = a.position + a.rotation * ((on_a + on_b) * 0.5);
    Contact::new(position, a.rotation * normal, -candidate.separation)
}

/// Clip `polygon` against the half plane `side * p[axis] <= limit`
fn clip(polygon: &[Vec2], axis: usize, side: f32, limit: f32) -> Vec<Vec2> {
    let mut clipped = Vec::with_capacity(polygon.len() + 1);
    let Some(&last) = polygon.last() else {
        return clipped;
    };
    let inside = |p: &Vec2| side * p[axis] <= limit;
    let boundary = side * limit;

    let mut previous = last;
    for &current in polygon {
        let current_inside = inside(&current);
        if current_inside != inside(&previous) {
            let t = (boundary - previous[axis]) / (current[axis] - previous[axis]);
            clipped.push(previous + (current - previous) * t);
        }
        if current_inside {
            clipped.push(current);
        }
        previous = current;
    }
    clipped
}

/// Area-weighted centroid, mean of the points for degenerate polygons
fn polygon_centroid(points: &[Vec2]) -> Vec2 {
    let mean = || points.iter().fold(Vec2::zeros(), |sum, p| sum + p) / points.len().max(1) as f32;
    if points.len() < 3 {
        return mean();
    }

    let mut twice_area = 0.0;
    let mut weighted = Vec2::zeros();
    for (index, p) in points.iter().enumerate() {
        let q = points[(index + 1) % points.len()];
        let cross = p.x * q.y - q.x * p.y;
        twice_area += cross;
        weighted += (p + q) * cross;
    }
    if twice_area.abs() < DEGENERATE_AREA {
        return mean();
    }
    weighted / (3.0 * twice_area)
}

fn angular_distance(a: f32, b: f32) -> f32 {
    let difference = (a - b).rem_euclid(constants::TAU);
    difference.min(constants::TAU - difference)
}

/// Keep the deepest point plus the points closest to evenly spaced angles
fn reduce_manifold(points: &[FacePoint]) -> Vec<FacePoint> {
    let planar: Vec<Vec2> = points.iter().map(|p| p.planar).collect();
    let centroid = polygon_centroid(&planar);
    let angles: Vec<f32> = planar
        .iter()
        .map(|p| (p.y - centroid.y).atan2(p.x - centroid.x))
        .collect();

    let mut deepest = 0;
    for (index, point) in points.iter().enumerate().skip(1) {
        if point.depth > points[deepest].depth {
            deepest = index;
        }
    }

    let mut used = vec![false; points.len()];
    used[deepest] = true;
    let mut selected = Vec::with_capacity(MAX_MANIFOLD_POINTS);
    selected.push(points[deepest]);

    for slot in 1..MAX_MANIFOLD_POINTS {
        let ideal = angles[deepest] + slot as f32 * constants::TAU / MAX_MANIFOLD_POINTS as f32;
        let mut pick: Option<(usize, f32)> = None;
        for (index, &angle) in angles.iter().enumerate() {
            if used[index] {
                continue;
            }
            let distance = angular_distance(angle, ideal);
            if pick.map_or(true, |(_, best)| distance < best) {
                pick = Some((index, distance));
            }
        }
        if let Some((index, _)) = pick {
            used[index] = true;
            selected.push(points[index]);
        }
    }
    selected
}

/// Manifold for a face axis (index 0..=5)
fn face_contacts(a: &OrientedBox, b: &OrientedBox, candidate: &Candidate, contact_set: &mut ContactSet) {
    let normal = a.rotation * candidate.axis;
    let depth = -candidate.separation;
    let (reference, incident, r, reference_normal) = if candidate.index < 3 {
        (a, b, candidate.index, normal)
    } else {
        (b, a, candidate.index - 3, -normal)
    };

    let (r1, r2) = ((r + 1) % 3, (r + 2) % 3);
    let reference_center = reference.position + reference_normal * reference.half[r];
    let face_offset = reference_normal.dot(&reference_center);
    let (u1, u2) = (reference.axis(r1), reference.axis(r2));
    let reference_half = Vec2::new(reference.half[r1], reference.half[r2]);

    // Incident face: most anti-parallel to the reference normal
    let normal_in_incident = incident.rotation.transpose() * reference_normal;
    let k = normal_in_incident.iamax();
    let face_sign = -sign(normal_in_incident[k]);
    let incident_normal = incident.axis(k) * face_sign;
    let incident_center = incident.position + incident_normal * incident.half[k];
    let (k1, k2) = ((k + 1) % 3, (k + 2) % 3);
    let (v1, v2) = (incident.axis(k1), incident.axis(k2));
    let incident_half = Vec2::new(incident.half[k1], incident.half[k2]);

    let rotation = Mat2::new(u1.dot(&v1), u1.dot(&v2), u2.dot(&v1), u2.dot(&v2));
    let offset = incident_center - reference_center;
    let translation = Vec2::new(u1.dot(&offset), u2.dot(&offset));

    let corners = [
        Vec2::new(incident_half.x, incident_half.y),
        Vec2::new(-incident_half.x, incident_half.y),
        Vec2::new(-incident_half.x, -incident_half.y),
        Vec2::new(incident_half.x, -incident_half.y),
    ];
    let mut polygon: Vec<Vec2> = corners.iter().map(|c| rotation * c + translation).collect();
    polygon = clip(&polygon, 0, 1.0, reference_half.x);
    polygon = clip(&polygon, 0, -1.0, reference_half.x);
    polygon = clip(&polygon, 1, 1.0, reference_half.y);
    polygon = clip(&polygon, 1, -1.0, reference_half.y);

    let denominator = incident_normal.dot(&reference_normal);
    let mut points: Vec<FacePoint> = polygon
        .iter()
        .filter_map(|&planar| {
            let on_reference = reference_center + u1 * planar.x + u2 * planar.y;
            let along = incident_normal.dot(&(incident_center - on_reference)) / denominator;
            let point = on_reference + reference_normal * along;
            let depth = face_offset - reference_normal.dot(&point);
            (depth >= 0.0).then_some(FacePoint { planar, point, depth })
        })
        .collect();

    if points.is_empty() {
        // Clipping lost every point; fall back to the deepest incident corner
        trace!("box-box clipping produced no points, using deepest corner");
        let local_direction = incident.rotation.transpose() * reference_normal;
        let corner = incident.half.zip_map(&local_direction, |h, d| -sign(d) * h);
        let point = incident.position + incident.rotation * corner;
        contact_set.add_contact(Contact::new(point + reference_normal * (depth * 0.5), normal, depth));
        return;
    }

    if points.len() > MAX_MANIFOLD_POINTS {
        points = reduce_manifold(&points);
    }

    for p in points {
        let position = p.point + reference_normal * (p.depth * 0.5);
        contact_set.add_contact(Contact::new(position, normal, p.depth));
    }
}

impl CollisionAlgorithm for BoxBoxAlgorithm {
    fn name(&self) -> &'static str {
        "BoxBoxAlgorithm"
    }

    fn compute_collision(
        &self,
        pair: ObjectPair<'_>,
        contact_set: &mut ContactSet,
        query: CollisionQueryType,
    ) -> Result<(), CollisionError> {
        let (pair, _) = pair.canonical(ShapeType::Box, ShapeType::Box, self.name())?;
        if query == CollisionQueryType::ClosestPoints {
            return Err(CollisionError::UnsupportedQuery {
                algorithm: self.name(),
                query,
            });
        }
        let (Some(a), Some(b)) = (OrientedBox::from_object(pair.a), OrientedBox::from_object(pair.b)) else {
            return Err(CollisionError::InvalidArgument(format!("{} expects two boxes", self.name())));
        };

        contact_set.clear();
        let track = query != CollisionQueryType::Boolean;
        let candidate = match find_separating_axis(&a, &b, track) {
            Separation::Separated => return Ok(()),
            Separation::Overlapping(candidate) => candidate,
        };

        match candidate {
            None => contact_set.set_have_contact(true),
            Some(candidate) if candidate.index < 6 => face_contacts(&a, &b, &candidate, contact_set),
            Some(candidate) => contact_set.add_contact(edge_contact(&a, &b, &candidate)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::foundation::math::{constants::PI, Quat};
    use approx::assert_relative_eq;

    fn contacts(a: &CollisionObject, b: &CollisionObject) -> ContactSet {
        let mut set = scratch();
        BoxBoxAlgorithm
            .compute_collision(ObjectPair::new(a, b), &mut set, CollisionQueryType::Contacts)
            .unwrap();
        set
    }

    #[test]
    fn test_unit_cubes_overlapping_along_x() {
        let a = box_at(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let b = box_at(Vec3::new(0.7, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let set = contacts(&a, &b);

        assert!(set.have_contact());
        assert_eq!(set.len(), 4);
        for contact in set.contacts() {
            assert_relative_eq!(contact.penetration_depth, 0.3, epsilon = 1e-5);
            assert_relative_eq!(contact.normal, Vec3::x(), epsilon = 1e-5);
            assert_relative_eq!(contact.position.x, 0.35, epsilon = 1e-5);
        }

        let b_left = box_at(Vec3::new(-0.7, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let set = contacts(&a, &b_left);
        assert_relative_eq!(set.contacts()[0].normal, -Vec3::x(), epsilon = 1e-5);
        assert_relative_eq!(set.contacts()[0].penetration_depth, 0.3, epsilon = 1e-5);
    }

    #[test]
    fn test_face_manifold_has_four_points() {
        let ground = box_at(Vec3::zeros(), Vec3::new(4.0, 1.0, 4.0));
        let crate_box = box_at(Vec3::new(0.0, 0.8, 0.0), Vec3::new(2.0, 1.0, 2.0));
        let set = contacts(&ground, &crate_box);

        assert_eq!(set.len(), 4);
        for contact in set.contacts() {
            assert_relative_eq!(contact.penetration_depth, 0.2, epsilon = 1e-5);
            assert_relative_eq!(contact.normal, Vec3::y(), epsilon = 1e-5);
            // Inside both footprints
            assert!(contact.position.x.abs() <= 1.0 + 1e-5);
            assert!(contact.position.z.abs() <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn test_octagon_reduced_to_four_points() {
        let a = box_at(Vec3::zeros(), Vec3::new(2.0, 1.0, 2.0));
        let b = rotated_box(
            Vec3::new(0.0, 0.9, 0.0),
            Vec3::new(2.0, 1.0, 2.0),
            Quat::from_axis_angle(&Vec3::y_axis(), PI / 4.0),
        );
        let set = contacts(&a, &b);

        assert_eq!(set.len(), 4);
        for contact in set.contacts() {
            assert_relative_eq!(contact.penetration_depth, 0.1, epsilon = 1e-4);
            assert_relative_eq!(contact.normal, Vec3::y(), epsilon = 1e-5);
        }
    }

    #[test]
    fn test_edge_edge_contact() {
        let half_diagonal = 0.5 * 2.0_f32.sqrt();
        let a = rotated_box(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0), Quat::from_axis_angle(&Vec3::x_axis(), PI / 4.0));
        let b = rotated_box(
            Vec3::new(0.0, 2.0 * half_diagonal - 0.1, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            Quat::from_axis_angle(&Vec3::z_axis(), PI / 4.0),
        );
        let set = contacts(&a, &b);

        assert_eq!(set.len(), 1);
        let contact = &set.contacts()[0];
        assert_relative_eq!(contact.penetration_depth, 0.1, epsilon = 1e-4);
        assert_relative_eq!(contact.normal, Vec3::y(), epsilon = 1e-4);
        assert_relative_eq!(contact.position, Vec3::new(0.0, half_diagonal - 0.05, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_separated_boxes() {
        let a = box_at(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let b = box_at(Vec3::new(1.01, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let mut set = scratch();
        BoxBoxAlgorithm
            .compute_collision(ObjectPair::new(&a, &b), &mut set, CollisionQueryType::Boolean)
            .unwrap();
        assert!(!set.have_contact());
        assert!(contacts(&a, &b).is_empty());
    }

    #[test]
    fn test_boolean_does_not_add_contacts() {
        let a = box_at(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let b = box_at(Vec3::new(0.5, 0.5, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let mut set = scratch();
        BoxBoxAlgorithm
            .compute_collision(ObjectPair::new(&a, &b), &mut set, CollisionQueryType::Boolean)
            .unwrap();
        assert!(set.have_contact());
        assert!(set.is_empty());
    }

    #[test]
    fn test_closest_points_unsupported() {
        let a = box_at(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let b = box_at(Vec3::new(3.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let mut set = scratch();
        let result = BoxBoxAlgorithm.compute_collision(ObjectPair::new(&a, &b), &mut set, CollisionQueryType::ClosestPoints);
        assert!(matches!(result, Err(CollisionError::UnsupportedQuery { .. })));
    }

    #[test]
    fn test_clip_square_against_half_plane() {
        let square = [
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
        ];
        let clipped = clip(&square, 0, 1.0, 0.5);
        assert_eq!(clipped.len(), 4);
        assert!(clipped.iter().all(|p| p.x <= 0.5 + 1e-6));
    }

    #[test]
    fn test_degenerate_centroid_falls_back_to_mean() {
        let colinear = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)];
        assert_relative_eq!(polygon_centroid(&colinear), Vec2::new(1.0, 0.0), epsilon = 1e-6);

        let square = [
            Vec2::new(1.0, 1.0),
            Vec2::new(3.0, 1.0),
            Vec2::new(3.0, 3.0),
            Vec2::new(1.0, 3.0),
        ];
        assert_relative_eq!(polygon_centroid(&square), Vec2::new(2.0, 2.0), epsilon = 1e-6);
    }
}
