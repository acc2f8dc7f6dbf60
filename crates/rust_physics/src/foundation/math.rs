//! Math utilities and types
//!
//! Provides the fundamental nalgebra aliases used by the collision code.

pub use nalgebra::{
    Vector2, Vector3,
    Matrix2, Matrix3,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 2x2 matrix type
pub type Mat2 = Matrix2<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Squared length below which a vector is treated as zero
    pub const ZERO_LENGTH_SQUARED: f32 = 1e-12;

    /// Tolerance for "is this vector normalized"
    pub const NORMALIZED_TOLERANCE: f32 = 1e-4;
}

/// Math utility functions
pub mod utils {
    use super::*;

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// The world "up" direction, used as fallback normal
    pub fn up() -> Vec3 {
        Vec3::new(0.0, 1.0, 0.0)
    }

    /// Normalize `v`, or return `fallback` if `v` is (numerically) zero
    pub fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
        let length_squared = v.magnitude_squared();
        if length_squared > constants::ZERO_LENGTH_SQUARED && length_squared.is_finite() {
            v / length_squared.sqrt()
        } else {
            fallback
        }
    }

    /// Check that every component is finite (no NaN, no infinity)
    pub fn is_finite(v: &Vec3) -> bool {
        v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
    }

    /// Check whether a vector has unit length within [`constants::NORMALIZED_TOLERANCE`]
    pub fn is_normalized(v: &Vec3) -> bool {
        (v.magnitude_squared() - 1.0).abs() < constants::NORMALIZED_TOLERANCE
    }

    /// Check whether all three components are equal within a relative tolerance
    pub fn is_uniform(v: &Vec3) -> bool {
        let tolerance = 1e-5 * v.abs().max().max(1.0);
        (v.x - v.y).abs() <= tolerance && (v.y - v.z).abs() <= tolerance
    }

    /// Closest points between segments `[p0, p1]` and `[q0, q1]`
    ///
    /// Returns `(point_on_p, point_on_q)`. Handles degenerate (point) segments.
    /// See Ericson, "Real-Time Collision Detection", 5.1.9.
    pub fn closest_points_on_segments(p0: Vec3, p1: Vec3, q0: Vec3, q1: Vec3) -> (Vec3, Vec3) {
        let d1 = p1 - p0;
        let d2 = q1 - q0;
        let r = p0 - q0;
        let a = d1.magnitude_squared();
        let e = d2.magnitude_squared();
        let f = d2.dot(&r);

        if a <= constants::ZERO_LENGTH_SQUARED && e <= constants::ZERO_LENGTH_SQUARED {
            return (p0, q0);
        }

        let (s, t) = if a <= constants::ZERO_LENGTH_SQUARED {
            (0.0, (f / e).clamp(0.0, 1.0))
        } else {
            let c = d1.dot(&r);
            if e <= constants::ZERO_LENGTH_SQUARED {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else {
                let b = d1.dot(&d2);
                let denom = a * e - b * b;
                let mut s = if denom > constants::ZERO_LENGTH_SQUARED {
                    ((b * f - c * e) / denom).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let mut t = (b * s + f) / e;
                if t < 0.0 {
                    t = 0.0;
                    s = (-c / a).clamp(0.0, 1.0);
                } else if t > 1.0 {
                    t = 1.0;
                    s = ((b - c) / a).clamp(0.0, 1.0);
                }
                (s, t)
            }
        };

        (p0 + d1 * s, q0 + d2 * t)
    }

    /// Closest point on segment `[start, end]` to `point`
    pub fn closest_point_on_segment(start: Vec3, end: Vec3, point: Vec3) -> Vec3 {
        let segment = end - start;
        let length_squared = segment.magnitude_squared();
        if length_squared <= constants::ZERO_LENGTH_SQUARED {
            return start;
        }
        let t = ((point - start).dot(&segment) / length_squared).clamp(0.0, 1.0);
        start + segment * t
    }
}
