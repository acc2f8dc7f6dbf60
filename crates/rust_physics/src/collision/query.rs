//! Query types understood by collision algorithms

/// What a collision algorithm is asked to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionQueryType {
    /// Only decide whether the objects touch; no contacts are produced
    Boolean,
    /// Contact points for interpenetrating objects
    Contacts,
    /// Closest points, also meaningful for separated objects
    ClosestPoints,
}
