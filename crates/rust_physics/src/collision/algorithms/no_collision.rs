//! Algorithm for shape pairs that never collide

use super::{CollisionAlgorithm, ObjectPair};
use crate::collision::{CollisionError, CollisionQueryType, ContactSet};

/// Always reports no contact (used for ray vs ray)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCollisionAlgorithm;

impl CollisionAlgorithm for NoCollisionAlgorithm {
    fn name(&self) -> &'static str {
        "NoCollisionAlgorithm"
    }

    fn compute_collision(
        &self,
        _pair: ObjectPair<'_>,
        contact_set: &mut ContactSet,
        _query: CollisionQueryType,
    ) -> Result<(), CollisionError> {
        contact_set.clear();
        Ok(())
    }
}
