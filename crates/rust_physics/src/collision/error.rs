//! Collision detection errors

use super::collision_object::CollisionObjectId;
use super::query::CollisionQueryType;
use crate::config::ConfigError;
use thiserror::Error;

/// Errors raised by shapes, algorithms and the collision domain
#[derive(Debug, Error)]
pub enum CollisionError {
    /// Contract violation, e.g. an algorithm received shapes it does not handle
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The algorithm cannot answer this kind of query
    #[error("{algorithm} does not support {query:?} queries")]
    UnsupportedQuery {
        /// Name of the algorithm
        algorithm: &'static str,
        /// The rejected query type
        query: CollisionQueryType,
    },

    /// NaN, infinite or degenerate geometry
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The object is already registered in a collision domain
    #[error("Collision object is already registered in a collision domain")]
    ObjectAlreadyRegistered,

    /// No object with this id is registered
    #[error("Unknown collision object: {0:?}")]
    UnknownObject(CollisionObjectId),

    /// The worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
