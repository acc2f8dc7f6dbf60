//! Collision detection: objects, contacts, algorithms and the collision domain
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 13:
//! "The collision detection system is typically split into two phases:
//! broad-phase and narrow-phase."
//!
//! # Key Types
//!
//! - [`CollisionObject`] - A geometric object with filter state
//! - [`ContactSet`] - Contacts between one pair of objects
//! - [`CollisionAlgorithm`] - Narrow-phase query for one shape-type pair
//! - [`CollisionDomain`] - Incremental all-pairs collision detection

pub mod algorithms;
pub mod collision_layers;
pub mod collision_object;
pub mod contact;
pub mod contact_set;
pub mod continuous;
pub mod domain;
pub mod error;
pub mod filter;
pub mod query;

#[cfg(test)]
mod tests;

pub use algorithms::{CollisionAlgorithm, CollisionAlgorithmMatrix, ObjectPair};
pub use collision_layers::{CollisionLayer, CollisionLayers};
pub use collision_object::{CollisionObject, CollisionObjectId, DomainId};
pub use contact::{Contact, ContactUserData};
pub use contact_set::{CanCollide, ContactSet};
pub use continuous::{compute_times_of_impact, move_to_time_of_impact, LinearMotion, TimeOfImpactSlots};
pub use domain::CollisionDomain;
pub use error::CollisionError;
pub use filter::{CollisionFilter, GroupCollisionFilter, LayerCollisionFilter};
pub use query::CollisionQueryType;
