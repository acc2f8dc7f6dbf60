//! Collision shape primitives
//!
//! Shapes are stored in model space; scale and pose are applied per
//! collision object when a query runs (GEA 13.3.4: "Store collision shapes in
//! model space, transform on-the-fly during tests").

use crate::collision::CollisionError;
use crate::foundation::math::{utils, Vec3};
use super::{aabb::Aabb, pose::Pose};

/// Discriminant of [`Shape`], used as key of the algorithm matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeType {
    /// Finite ray (line segment)
    Ray,
    /// Sphere
    Sphere,
    /// Box
    Box,
}

/// A finite ray starting at `origin`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayShape {
    origin: Vec3,
    direction: Vec3,
    length: f32,
    stops_at_first_hit: bool,
}

impl RayShape {
    /// Create a ray; `direction` must be normalized, `length` positive
    pub fn new(origin: Vec3, direction: Vec3, length: f32) -> Result<Self, CollisionError> {
        if !utils::is_finite(&origin) {
            return Err(CollisionError::InvalidGeometry(format!("ray origin is not finite: {origin:?}")));
        }
        if !utils::is_finite(&direction) || !utils::is_normalized(&direction) {
            return Err(CollisionError::InvalidGeometry(format!(
                "ray direction must be normalized, got {direction:?}"
            )));
        }
        if !length.is_finite() || length <= 0.0 {
            return Err(CollisionError::InvalidGeometry(format!(
                "ray length must be positive, got {length}"
            )));
        }
        Ok(Self {
            origin,
            direction: direction.normalize(),
            length,
            stops_at_first_hit: false,
        })
    }

    /// Only report the closest blocking contact of this ray
    pub fn with_stops_at_first_hit(mut self, stops: bool) -> Self {
        self.stops_at_first_hit = stops;
        self
    }

    /// Ray origin in local space
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Unit direction in local space
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Ray length in local space
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Whether only the closest hit is of interest
    pub fn stops_at_first_hit(&self) -> bool {
        self.stops_at_first_hit
    }

    /// Transform the ray to world space, applying scale then pose
    pub fn to_world(&self, scale: Vec3, pose: &Pose) -> WorldRay {
        let origin = pose.to_world_point(self.origin.component_mul(&scale));
        let scaled = self.direction.component_mul(&scale) * self.length;
        let segment = pose.to_world_direction(scaled);
        let length = segment.magnitude();
        WorldRay {
            origin,
            direction: segment / length,
            length,
        }
    }
}

/// Ray in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldRay {
    /// Start point
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
    /// Segment length
    pub length: f32,
}

impl WorldRay {
    /// End point of the segment
    pub fn end(&self) -> Vec3 {
        self.origin + self.direction * self.length
    }

    /// Point at distance `t` along the ray
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A sphere centered at the local origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereShape {
    radius: f32,
}

impl SphereShape {
    /// Create a sphere; zero radius is a point
    pub fn new(radius: f32) -> Result<Self, CollisionError> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(CollisionError::InvalidGeometry(format!(
                "sphere radius must be finite and >= 0, got {radius}"
            )));
        }
        Ok(Self { radius })
    }

    /// Sphere radius
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

/// A box centered at the local origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShape {
    extent: Vec3,
}

impl BoxShape {
    /// Create a box from its full widths along x, y and z
    pub fn new(extent: Vec3) -> Result<Self, CollisionError> {
        if !utils::is_finite(&extent) || extent.min() <= 0.0 {
            return Err(CollisionError::InvalidGeometry(format!(
                "box extent must be positive, got {extent:?}"
            )));
        }
        Ok(Self { extent })
    }

    /// Create an axis-aligned cube with the given edge length
    pub fn cube(width: f32) -> Result<Self, CollisionError> {
        Self::new(Vec3::new(width, width, width))
    }

    /// Full widths
    pub fn extent(&self) -> Vec3 {
        self.extent
    }

    /// Half widths
    pub fn half_extent(&self) -> Vec3 {
        self.extent * 0.5
    }
}

/// Collision shape (stored in MODEL SPACE)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// A finite ray
    Ray(RayShape),
    /// A sphere
    Sphere(SphereShape),
    /// A box
    Box(BoxShape),
}

impl Shape {
    /// Type tag used for algorithm dispatch
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Self::Ray(_) => ShapeType::Ray,
            Self::Sphere(_) => ShapeType::Sphere,
            Self::Box(_) => ShapeType::Box,
        }
    }

    /// The ray, if this is a ray shape
    pub fn as_ray(&self) -> Option<&RayShape> {
        match self {
            Self::Ray(ray) => Some(ray),
            _ => None,
        }
    }

    /// The sphere, if this is a sphere shape
    pub fn as_sphere(&self) -> Option<&SphereShape> {
        match self {
            Self::Sphere(sphere) => Some(sphere),
            _ => None,
        }
    }

    /// The box, if this is a box shape
    pub fn as_box(&self) -> Option<&BoxShape> {
        match self {
            Self::Box(b) => Some(b),
            _ => None,
        }
    }

    /// World-space AABB of this shape under `scale` and `pose`
    pub fn aabb(&self, scale: Vec3, pose: &Pose) -> Aabb {
        match self {
            Self::Ray(ray) => {
                let world = ray.to_world(scale, pose);
                Aabb::from_points(world.origin, world.end())
            }
            Self::Sphere(sphere) => {
                let radius = sphere.radius * scale.abs().max();
                if utils::is_uniform(&scale) {
                    let r = Vec3::new(radius, radius, radius);
                    Aabb::from_center_extents(pose.position, r)
                } else {
                    // Ellipsoid: extent along world axis i is |R_i · diag(s·r)|
                    let m = pose.rotation_matrix();
                    let semi_axes = scale.abs() * sphere.radius;
                    let extents = Vec3::from_fn(|i, _| {
                        let row = Vec3::new(
                            m[(i, 0)] * semi_axes.x,
                            m[(i, 1)] * semi_axes.y,
                            m[(i, 2)] * semi_axes.z,
                        );
                        row.magnitude()
                    });
                    Aabb::from_center_extents(pose.position, extents)
                }
            }
            Self::Box(b) => {
                let half = b.half_extent().component_mul(&scale.abs());
                let abs_rotation = pose.rotation_matrix().abs();
                Aabb::from_center_extents(pose.position, abs_rotation * half)
            }
        }
    }

    /// Support point of the scaled shape in local space
    ///
    /// Returns the point of the shape (after applying `scale`) farthest along
    /// `direction`. Returns `None` for rays, which are not treated as convex
    /// volumes by the narrow phase.
    pub fn support_point(&self, direction: Vec3, scale: Vec3) -> Option<Vec3> {
        match self {
            Self::Ray(_) => None,
            Self::Sphere(sphere) => {
                // Support of an ellipsoid diag(s)·B(r): s ⊙ r·normalize(s ⊙ d)
                let scaled_direction = utils::normalize_or(direction.component_mul(&scale), utils::up());
                Some(scaled_direction.component_mul(&scale) * sphere.radius)
            }
            Self::Box(b) => {
                let half = b.half_extent().component_mul(&scale.abs());
                Some(Vec3::new(
                    if direction.x >= 0.0 { half.x } else { -half.x },
                    if direction.y >= 0.0 { half.y } else { -half.y },
                    if direction.z >= 0.0 { half.z } else { -half.z },
                ))
            }
        }
    }
}

impl From<RayShape> for Shape {
    fn from(ray: RayShape) -> Self {
        Self::Ray(ray)
    }
}

impl From<SphereShape> for Shape {
    fn from(sphere: SphereShape) -> Self {
        Self::Sphere(sphere)
    }
}

impl From<BoxShape> for Shape {
    fn from(b: BoxShape) -> Self {
        Self::Box(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants::HALF_PI, Quat};
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_rejects_unnormalized_direction() {
        assert!(RayShape::new(Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0), 1.0).is_err());
        assert!(RayShape::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), 0.0).is_err());
        assert!(RayShape::new(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::x(), 1.0).is_err());
    }

    #[test]
    fn test_box_rejects_degenerate_extent() {
        assert!(BoxShape::new(Vec3::new(1.0, 0.0, 1.0)).is_err());
        assert!(BoxShape::new(Vec3::new(1.0, -1.0, 1.0)).is_err());
        assert!(BoxShape::cube(2.0).is_ok());
    }

    #[test]
    fn test_rotated_box_aabb() {
        let shape = Shape::Box(BoxShape::new(Vec3::new(2.0, 4.0, 6.0)).unwrap());
        let pose = Pose::new(Vec3::new(1.0, 0.0, 0.0), Quat::from_axis_angle(&Vec3::z_axis(), HALF_PI));
        let aabb = shape.aabb(Vec3::new(1.0, 1.0, 1.0), &pose);
        assert_relative_eq!(aabb.min, Vec3::new(-1.0, -1.0, -3.0), epsilon = 1e-5);
        assert_relative_eq!(aabb.max, Vec3::new(3.0, 1.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn test_scaled_ray_to_world() {
        let ray = RayShape::new(Vec3::zeros(), Vec3::x(), 2.0).unwrap();
        let world = ray.to_world(Vec3::new(3.0, 1.0, 1.0), &Pose::from_position(Vec3::new(0.0, 1.0, 0.0)));
        assert_relative_eq!(world.length, 6.0, epsilon = 1e-6);
        assert_relative_eq!(world.end(), Vec3::new(6.0, 1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_support_point() {
        let shape = Shape::Sphere(SphereShape::new(2.0).unwrap());
        let support = shape.support_point(Vec3::new(0.0, 3.0, 0.0), Vec3::new(1.0, 1.0, 1.0)).unwrap();
        assert_relative_eq!(support, Vec3::new(0.0, 2.0, 0.0), epsilon = 1e-6);
        assert!(Shape::Ray(RayShape::new(Vec3::zeros(), Vec3::x(), 1.0).unwrap())
            .support_point(Vec3::x(), Vec3::new(1.0, 1.0, 1.0))
            .is_none());
    }
}
