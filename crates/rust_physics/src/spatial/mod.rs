//! Spatial partitioning for the broad phase
//!
//! Provides the broad-phase interface used by the collision domain and
//! a loose octree implementation of it.

pub mod broad_phase;
mod octree;

pub use broad_phase::{BroadPhase, CandidatePair};
pub use octree::{OctreeBroadPhase, OctreeConfig};
