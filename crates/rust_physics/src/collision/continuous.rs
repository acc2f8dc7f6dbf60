//! Continuous collision detection for linear motion
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.6:
//! "With continuous collision detection (CCD), the goal is to find the
//! earliest time of impact (TOI) between two moving objects over a given
//! time interval."
//!
//! Each moving body owns one time-of-impact slot holding a fraction of the
//! step in `[0, 1]`. Pair tasks run in parallel and lower the slots of both
//! participants with an atomic keep-minimum. Rotational sweeps are not
//! modelled: a body sweeps its position while already holding its target
//! orientation.

use super::algorithms::ObjectPair;
use super::collision_object::{CollisionObject, CollisionObjectId};
use super::contact_set::ContactSet;
use super::domain::CollisionDomain;
use super::query::CollisionQueryType;
use super::CollisionError;
use crate::config::CollisionConfig;
use crate::foundation::logging::trace;
use crate::foundation::math::{Quat, Vec3};
use crate::geometry::{Aabb, Pose};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Upper bound for the number of coarse samples along one sweep
const MAX_SWEEP_STEPS: u32 = 64;

/// Per-body time-of-impact fractions with atomic keep-minimum updates
///
/// Values are stored as `f32` bits in `AtomicU32`s, initialised to `1.0`
/// (no impact during the step).
#[derive(Debug)]
pub struct TimeOfImpactSlots {
    slots: Vec<AtomicU32>,
}

impl TimeOfImpactSlots {
    /// Create `len` slots set to `1.0`
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| AtomicU32::new(1.0_f32.to_bits())).collect(),
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current value of slot `index`
    pub fn get(&self, index: usize) -> Option<f32> {
        self.slots
            .get(index)
            .map(|slot| f32::from_bits(slot.load(Ordering::Acquire)))
    }

    /// Lower slot `index` to `value` if it is smaller, returning the previous value
    ///
    /// Compare-and-swap retry loop; NaN never replaces a stored value.
    pub fn fetch_min(&self, index: usize, value: f32) -> Option<f32> {
        let slot = self.slots.get(index)?;
        let mut current = slot.load(Ordering::Acquire);
        loop {
            let previous = f32::from_bits(current);
            if value.is_nan() || value >= previous {
                return Some(previous);
            }
            match slot.compare_exchange_weak(current, value.to_bits(), Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return Some(previous),
                Err(actual) => current = actual,
            }
        }
    }

    /// Set every slot back to `1.0`
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot.get_mut() = 1.0_f32.to_bits();
        }
    }
}

/// Desired linear motion of a registered object over one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMotion {
    /// The moving object
    pub object: CollisionObjectId,
    /// Pose at the end of the step
    pub target: Pose,
}

impl LinearMotion {
    /// Move `object` to `target`
    pub fn new(object: CollisionObjectId, target: Pose) -> Self {
        Self { object, target }
    }
}

/// One body's sweep from its current position to its target
#[derive(Debug, Clone, Copy)]
struct Sweep<'a> {
    object: &'a CollisionObject,
    start: Vec3,
    end: Vec3,
    orientation: Quat,
}

impl<'a> Sweep<'a> {
    fn moving(object: &'a CollisionObject, target: &Pose) -> Self {
        Self {
            object,
            start: object.pose().position,
            end: target.position,
            orientation: target.orientation,
        }
    }

    fn stationary(object: &'a CollisionObject) -> Self {
        let pose = object.pose();
        Self {
            object,
            start: pose.position,
            end: pose.position,
            orientation: pose.orientation,
        }
    }

    fn displacement(&self) -> Vec3 {
        self.end - self.start
    }

    /// Bounding box of the whole sweep
    fn bounds(&self) -> Aabb {
        let geometry = self.object.geometry();
        let at_end = geometry
            .shape()
            .aabb(geometry.scale(), &Pose::new(self.end, self.orientation));
        self.object.aabb().merged(&at_end)
    }

    fn at(&self, t: f32) -> Result<CollisionObject, CollisionError> {
        let mut placed = self.object.clone();
        placed.set_pose(Pose::new(self.start.lerp(&self.end, t), self.orientation))?;
        Ok(placed)
    }
}

/// Partner of a moving body in a sweep task
#[derive(Debug, Clone, Copy)]
enum Partner {
    Moving(usize),
    Stationary(CollisionObjectId),
}

/// Earliest time of impact per motion, as a fraction of the step
///
/// Slot `i` of the result belongs to `motions[i]`. Pairs already touching
/// at the start of the step are left to the discrete narrow phase. Pair
/// tasks run on the domain's worker pool when multithreading is enabled.
pub fn compute_times_of_impact(
    domain: &CollisionDomain,
    motions: &[LinearMotion],
) -> Result<TimeOfImpactSlots, CollisionError> {
    let slots = TimeOfImpactSlots::new(motions.len());
    let mut indices = HashMap::with_capacity(motions.len());
    let mut sweeps = Vec::with_capacity(motions.len());
    for (index, motion) in motions.iter().enumerate() {
        if indices.insert(motion.object, index).is_some() {
            return Err(CollisionError::InvalidArgument(format!(
                "object {:?} has more than one motion",
                motion.object
            )));
        }
        if !motion.target.is_finite() {
            return Err(CollisionError::InvalidGeometry(format!(
                "non-finite target pose for {:?}",
                motion.object
            )));
        }
        let object = domain
            .object(motion.object)
            .ok_or(CollisionError::UnknownObject(motion.object))?;
        sweeps.push(Sweep::moving(object, &motion.target));
    }

    let mut tasks = Vec::new();
    let mut found = Vec::new();
    for (index, sweep) in sweeps.iter().enumerate() {
        let bounds = sweep.bounds();

        found.clear();
        domain.broad_phase().query_aabb(&bounds, &mut found);
        for &id in &found {
            if indices.contains_key(&id) {
                continue;
            }
            let Some(other) = domain.object(id) else { continue };
            if domain.admits(sweep.object, other) {
                tasks.push((index, Partner::Stationary(id)));
            }
        }

        for (other_index, other) in sweeps.iter().enumerate().skip(index + 1) {
            if bounds.intersects(&other.bounds()) && domain.admits(sweep.object, other.object) {
                tasks.push((index, Partner::Moving(other_index)));
            }
        }
    }

    let run = |&(index, partner): &(usize, Partner)| -> Result<(), CollisionError> {
        let first = &sweeps[index];
        let second = match partner {
            Partner::Moving(other) => sweeps[other],
            Partner::Stationary(id) => {
                Sweep::stationary(domain.object(id).ok_or(CollisionError::UnknownObject(id))?)
            }
        };
        let toi = time_of_impact(domain, first, &second)?;
        if toi < 1.0 {
            slots.fetch_min(index, toi);
            if let Partner::Moving(other) = partner {
                slots.fetch_min(other, toi);
            }
        }
        Ok(())
    };

    match domain.thread_pool() {
        Some(pool) if tasks.len() > 1 => pool.install(|| tasks.par_iter().try_for_each(run))?,
        _ => tasks.iter().try_for_each(run)?,
    }

    trace!("Time of impact: {} motions, {} sweep pairs", motions.len(), tasks.len());
    Ok(slots)
}

/// Move every body to its time of impact along its motion
///
/// Bodies without an impact reach their target pose. Each body only reads
/// its own slot.
pub fn move_to_time_of_impact(
    domain: &mut CollisionDomain,
    motions: &[LinearMotion],
    slots: &TimeOfImpactSlots,
) -> Result<(), CollisionError> {
    if slots.len() != motions.len() {
        return Err(CollisionError::InvalidArgument(format!(
            "{} time-of-impact slots for {} motions",
            slots.len(),
            motions.len()
        )));
    }

    for (index, motion) in motions.iter().enumerate() {
        let toi = slots.get(index).unwrap_or(1.0);
        let pose = if toi >= 1.0 {
            motion.target
        } else {
            let start = domain
                .object(motion.object)
                .ok_or(CollisionError::UnknownObject(motion.object))?
                .pose()
                .position;
            Pose::new(start.lerp(&motion.target.position, toi), motion.target.orientation)
        };
        domain.set_pose(motion.object, pose)?;
    }
    Ok(())
}

/// Conservative linear time of impact of two sweeps
///
/// Coarse sampling finds the first step that touches, bisection then
/// narrows it down. The returned time lies on the non-touching side.
#[allow(clippy::cast_precision_loss)]
fn time_of_impact(domain: &CollisionDomain, a: &Sweep<'_>, b: &Sweep<'_>) -> Result<f32, CollisionError> {
    let algorithm = domain.matrix().resolve(a.object.shape_type(), b.object.shape_type())?;
    let mut set = ContactSet::empty();
    let mut touching = |t: f32| -> Result<bool, CollisionError> {
        let (placed_a, placed_b) = (a.at(t)?, b.at(t)?);
        set.clear();
        algorithm.compute_collision(ObjectPair::new(&placed_a, &placed_b), &mut set, CollisionQueryType::Boolean)?;
        Ok(set.have_contact())
    };

    if touching(0.0)? {
        return Ok(1.0);
    }

    let relative = (a.displacement() - b.displacement()).magnitude();
    let size = a.object.aabb().extents().min().min(b.object.aabb().extents().min());
    let steps = sweep_steps(relative, size);

    let mut previous = 0.0;
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        if touching(t)? {
            return bisect(previous, t, domain.config(), &mut touching);
        }
        previous = t;
    }
    Ok(1.0)
}

/// Coarse samples so that no step moves further than the smaller half size
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn sweep_steps(distance: f32, size: f32) -> u32 {
    let steps = (distance / size.max(1e-3)).ceil();
    if steps.is_finite() && steps > 1.0 {
        steps.min(MAX_SWEEP_STEPS as f32) as u32
    } else {
        1
    }
}

fn bisect(
    mut free: f32,
    mut hit: f32,
    config: &CollisionConfig,
    touching: &mut impl FnMut(f32) -> Result<bool, CollisionError>,
) -> Result<f32, CollisionError> {
    for _ in 0..config.toi_iterations {
        if hit - free <= config.toi_tolerance {
            break;
        }
        let mid = 0.5 * (free + hit);
        if touching(mid)? {
            hit = mid;
        } else {
            free = mid;
        }
    }
    Ok(free)
}
