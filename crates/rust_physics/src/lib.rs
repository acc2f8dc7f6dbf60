//! # Rust Physics
//!
//! Rigid-body collision detection: narrow-phase algorithms and an incremental
//! collision domain.
//!
//! ## Features
//!
//! - **Narrow Phase**: Ray, sphere and box algorithms with contact manifolds
//! - **Dispatch Table**: Algorithms selected per shape-type pair
//! - **Collision Domain**: Broad phase, filter cache and contact persistence
//! - **Parallel Updates**: Narrow phase fans out over a rayon worker pool
//! - **Continuous Collision**: Linear time of impact per moving body
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rust_physics::prelude::*;
//!
//! fn main() -> Result<(), CollisionError> {
//!     let mut domain = CollisionDomain::new(CollisionConfig::default())?;
//!
//!     let ground = CollisionObject::from_shape(
//!         BoxShape::new(Vec3::new(20.0, 1.0, 20.0))?,
//!         Pose::identity(),
//!     )?;
//!     let ball = CollisionObject::from_shape(
//!         SphereShape::new(0.5)?,
//!         Pose::from_position(Vec3::new(0.0, 0.9, 0.0)),
//!     )?;
//!     domain.add_object(ground)?;
//!     let ball = domain.add_object(ball)?;
//!
//!     domain.update(1.0 / 60.0)?;
//!     for set in domain.get_contacts(ball) {
//!         for contact in set.contacts() {
//!             println!("{:?} depth {}", contact.position, contact.penetration_depth);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod collision;
pub mod config;
pub mod foundation;
pub mod geometry;
pub mod spatial;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        collision::{
            CanCollide, CollisionDomain, CollisionError, CollisionFilter, CollisionLayer, CollisionLayers,
            CollisionObject, CollisionObjectId, CollisionQueryType, Contact, ContactSet, GroupCollisionFilter,
            LayerCollisionFilter, LinearMotion,
        },
        config::{CollisionConfig, Config},
        foundation::math::{Quat, Vec3},
        geometry::{Aabb, BoxShape, GeometricObject, Pose, RayShape, Shape, ShapeType, SphereShape},
    };
}
