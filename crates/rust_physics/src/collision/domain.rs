//! Collision domain: incremental broad + narrow phase over a set of objects
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 13:
//! "The collision detection system is typically split into two phases:
//! broad-phase and narrow-phase."
//!
//! The domain owns its objects and keeps one persistent [`ContactSet`] per
//! candidate pair reported by the broad phase. Each [`CollisionDomain::update`]
//! re-evaluates only what changed: filter results are cached against filter
//! generations, narrow-phase results against pose generations. The narrow
//! phase fans out over a dedicated rayon pool and joins before the serial
//! publish pass.

use super::algorithms::{CollisionAlgorithmMatrix, ObjectPair};
use super::collision_layers::CollisionLayers;
use super::collision_object::{CollisionObject, CollisionObjectId, DomainId};
use super::contact_set::{CachedAlgorithm, CanCollide, ContactSet, FilterStamp};
use super::filter::{CollisionFilter, LayerCollisionFilter};
use super::query::CollisionQueryType;
use super::CollisionError;
use crate::config::CollisionConfig;
use crate::foundation::collections::{Key, ResourcePool, SlotMap};
use crate::foundation::logging::{debug, info, trace};
use crate::foundation::math::Vec3;
use crate::geometry::aabb::inverse_direction;
use crate::geometry::{Aabb, Pose, Shape, WorldRay};
use crate::spatial::{BroadPhase, CandidatePair, OctreeBroadPhase};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Closest blocker of a stops-at-first-hit ray
#[derive(Debug, Clone, Copy, PartialEq)]
struct FirstHit {
    pair: CandidatePair,
    distance: f32,
}

/// A set of collision objects with cached pairwise contacts (GEA 13.3)
pub struct CollisionDomain {
    id: DomainId,
    config: CollisionConfig,
    objects: SlotMap<CollisionObjectId, CollisionObject>,
    broad_phase: Box<dyn BroadPhase>,
    matrix: CollisionAlgorithmMatrix,
    filter: Box<dyn CollisionFilter>,
    filter_generation: u64,

    /// Persistent candidate pairs in discovery order
    pairs: Vec<ContactSet>,
    pair_index: HashMap<CandidatePair, usize>,

    /// Pairs published by the last update
    published: Vec<CandidatePair>,
    ray_cache: HashMap<CollisionObjectId, Option<FirstHit>>,

    contact_set_pool: ResourcePool<ContactSet>,
    thread_pool: Option<ThreadPool>,
}

impl CollisionDomain {
    /// Create a domain with the default octree broad phase
    pub fn new(config: CollisionConfig) -> Result<Self, CollisionError> {
        Self::with_broad_phase(config, Box::new(OctreeBroadPhase::default()))
    }

    /// Create a domain with a custom broad phase
    pub fn with_broad_phase(config: CollisionConfig, broad_phase: Box<dyn BroadPhase>) -> Result<Self, CollisionError> {
        config.validate()?;
        let thread_pool = if config.enable_multithreading {
            Some(build_thread_pool(config.worker_threads)?)
        } else {
            None
        };

        let id = DomainId::next();
        info!(
            "Created collision domain {:?} (multithreading: {}, workers: {})",
            id,
            config.enable_multithreading,
            thread_pool.as_ref().map_or(1, ThreadPool::current_num_threads)
        );

        Ok(Self {
            id,
            config,
            objects: SlotMap::with_key(),
            broad_phase,
            matrix: CollisionAlgorithmMatrix::default(),
            filter: Box::new(LayerCollisionFilter),
            filter_generation: 0,
            pairs: Vec::new(),
            pair_index: HashMap::new(),
            published: Vec::new(),
            ray_cache: HashMap::new(),
            contact_set_pool: ResourcePool::new(ContactSet::empty, ContactSet::reset),
            thread_pool,
        })
    }

    /// Identifier stored as back-reference in registered objects
    pub fn id(&self) -> DomainId {
        self.id
    }

    /// Active configuration
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Enable or disable the parallel narrow phase
    ///
    /// The worker pool is created the first time multithreading is enabled.
    pub fn set_multithreading(&mut self, enabled: bool) -> Result<(), CollisionError> {
        if enabled && self.thread_pool.is_none() {
            self.thread_pool = Some(build_thread_pool(self.config.worker_threads)?);
        }
        self.config.enable_multithreading = enabled;
        Ok(())
    }

    /// Set the distance within which updated contacts keep their history
    pub fn set_contact_position_tolerance(&mut self, tolerance: f32) -> Result<(), CollisionError> {
        let config = self.config.clone().with_contact_position_tolerance(tolerance);
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Replace the pairwise filter, invalidating every cached filter result
    pub fn set_filter(&mut self, filter: impl CollisionFilter + 'static) {
        self.filter = Box::new(filter);
        self.invalidate_filter();
    }

    /// Flush cached filter results, e.g. after reconfiguring a filter's rules
    pub fn invalidate_filter(&mut self) {
        self.filter_generation += 1;
    }

    /// The algorithm table
    pub fn matrix(&self) -> &CollisionAlgorithmMatrix {
        &self.matrix
    }

    /// Replace the algorithm table; every pair re-resolves its algorithm
    pub fn set_matrix(&mut self, matrix: CollisionAlgorithmMatrix) {
        self.matrix = matrix;
        for set in &mut self.pairs {
            set.algorithm = None;
            set.is_valid = false;
        }
    }

    /// Register an object
    ///
    /// The object is validated and must not belong to another domain.
    pub fn add_object(&mut self, mut object: CollisionObject) -> Result<CollisionObjectId, CollisionError> {
        if object.domain().is_some() {
            return Err(CollisionError::ObjectAlreadyRegistered);
        }
        object.geometry().validate()?;

        object.set_domain(Some(self.id));
        let aabb = object.aabb();
        let shape_type = object.shape_type();
        let id = self.objects.insert(object);
        self.broad_phase.insert(id, aabb);

        debug!("Registered {:?} object {:?} in {:?}", shape_type, id, self.id);
        Ok(id)
    }

    /// Unregister an object, dropping its pairs and ray-cache entries
    pub fn remove_object(&mut self, id: CollisionObjectId) -> Result<CollisionObject, CollisionError> {
        let mut object = self.objects.remove(id).ok_or(CollisionError::UnknownObject(id))?;
        self.broad_phase.remove(id);
        self.retain_pairs(|pair| !pair.contains(id));

        self.ray_cache.remove(&id);
        for hit in self.ray_cache.values_mut() {
            if hit.is_some_and(|hit| hit.pair.contains(id)) {
                *hit = None;
            }
        }
        self.published.retain(|pair| !pair.contains(id));

        object.set_domain(None);
        debug!("Removed object {:?} from {:?}", id, self.id);
        Ok(object)
    }

    /// Look up a registered object
    pub fn object(&self, id: CollisionObjectId) -> Option<&CollisionObject> {
        self.objects.get(id)
    }

    /// Iterate over all registered objects
    pub fn objects(&self) -> impl Iterator<Item = (CollisionObjectId, &CollisionObject)> {
        self.objects.iter()
    }

    /// Number of registered objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Move an object
    pub fn set_pose(&mut self, id: CollisionObjectId, pose: Pose) -> Result<(), CollisionError> {
        self.modify_geometry(id, |object| object.set_pose(pose))
    }

    /// Change an object's scale
    pub fn set_scale(&mut self, id: CollisionObjectId, scale: Vec3) -> Result<(), CollisionError> {
        self.modify_geometry(id, |object| object.set_scale(scale))
    }

    /// Replace an object's shape
    pub fn set_shape(&mut self, id: CollisionObjectId, shape: impl Into<Shape>) -> Result<(), CollisionError> {
        let shape = shape.into();
        self.modify_geometry(id, |object| {
            object.set_shape(shape);
            object.geometry().validate()
        })
    }

    /// Enable or disable an object
    pub fn set_enabled(&mut self, id: CollisionObjectId, enabled: bool) -> Result<(), CollisionError> {
        self.object_entry(id)?.set_enabled(enabled);
        Ok(())
    }

    /// Change an object's collision layers
    pub fn set_layers(&mut self, id: CollisionObjectId, layers: CollisionLayers) -> Result<(), CollisionError> {
        self.object_entry(id)?.set_layers(layers);
        Ok(())
    }

    /// Change an object's group tag
    pub fn set_group(&mut self, id: CollisionObjectId, group: u32) -> Result<(), CollisionError> {
        self.object_entry(id)?.set_group(group);
        Ok(())
    }

    /// Run broad and narrow phase and publish the resulting contact sets
    pub fn update(&mut self, delta_time: f64) -> Result<(), CollisionError> {
        self.refresh_pairs();

        let context = PairContext {
            objects: &self.objects,
            filter: &*self.filter,
            filter_generation: self.filter_generation,
            matrix: &self.matrix,
            tolerance: self.config.contact_position_tolerance,
            delta_time,
        };
        let pairs = &mut self.pairs;
        match &self.thread_pool {
            Some(pool) if self.config.enable_multithreading && pairs.len() > 1 => {
                pool.install(|| pairs.par_iter_mut().try_for_each(|set| context.evaluate(set)))?;
            }
            _ => pairs.iter_mut().try_for_each(|set| context.evaluate(set))?,
        }

        self.publish();
        trace!(
            "Collision update: {} objects, {} candidate pairs, {} published",
            self.objects.len(),
            self.pairs.len(),
            self.published.len()
        );
        Ok(())
    }

    /// Contact sets with contact after the last update, in pair discovery order
    pub fn contact_sets(&self) -> impl Iterator<Item = &ContactSet> {
        self.published.iter().filter_map(|pair| self.pair(pair))
    }

    /// Number of published contact sets
    pub fn contact_set_count(&self) -> usize {
        self.published.len()
    }

    /// Published contact sets involving `id`
    pub fn get_contacts(&self, id: CollisionObjectId) -> impl Iterator<Item = &ContactSet> {
        self.contact_sets().filter(move |set| set.contains(id))
    }

    /// Published contact set of the pair, as stored (smaller id is object A)
    pub fn get_contacts_between(&self, a: CollisionObjectId, b: CollisionObjectId) -> Option<&ContactSet> {
        let key = CandidatePair::new(a, b);
        if self.published.contains(&key) {
            self.pair(&key)
        } else {
            None
        }
    }

    /// Whether `id` touched anything in the last update
    pub fn has_contact(&self, id: CollisionObjectId) -> bool {
        self.published.iter().any(|pair| pair.contains(id))
    }

    /// Whether `a` and `b` touched in the last update
    pub fn have_contact(&self, a: CollisionObjectId, b: CollisionObjectId) -> bool {
        self.published.contains(&CandidatePair::new(a, b))
    }

    /// Closest blocker of a stops-at-first-hit ray
    pub fn first_hit(&self, ray: CollisionObjectId) -> Option<&ContactSet> {
        let hit = self.ray_cache.get(&ray).copied().flatten()?;
        self.pair(&hit.pair)
    }

    /// Contacts of an unregistered object with every object in the domain
    ///
    /// The returned sets come from the domain's pool; hand them back with
    /// [`Self::recycle`] when done. Objects of the domain are object B, the
    /// query object is object A with a null id. A stops-at-first-hit ray
    /// only reports its closest blocker.
    pub fn get_contacts_with(&self, object: &CollisionObject) -> Result<Vec<ContactSet>, CollisionError> {
        let mut results = Vec::new();
        for (id, other) in self.ad_hoc_candidates(object)? {
            let mut set = self.contact_set_pool.obtain();
            set.assign(CollisionObjectId::null(), id);
            let algorithm = self.matrix.resolve(object.shape_type(), other.shape_type())?;
            algorithm.compute_collision(ObjectPair::new(object, other), &mut set, CollisionQueryType::Contacts)?;
            if set.have_contact() {
                results.push(set);
            } else {
                self.contact_set_pool.recycle(set);
            }
        }

        if object.is_first_hit_ray() && results.len() > 1 {
            let nearest = nearest_hit(&results);
            let closest = results.swap_remove(nearest);
            for set in results.drain(..) {
                self.contact_set_pool.recycle(set);
            }
            results.push(closest);
        }
        Ok(results)
    }

    /// Whether an unregistered object touches anything in the domain
    pub fn have_contact_with(&self, object: &CollisionObject) -> Result<bool, CollisionError> {
        let mut set = self.contact_set_pool.obtain();
        let mut found = false;
        for (_, other) in self.ad_hoc_candidates(object)? {
            set.clear();
            let algorithm = self.matrix.resolve(object.shape_type(), other.shape_type())?;
            algorithm.compute_collision(ObjectPair::new(object, other), &mut set, CollisionQueryType::Boolean)?;
            if set.have_contact() {
                found = true;
                break;
            }
        }
        self.contact_set_pool.recycle(set);
        Ok(found)
    }

    /// Run one query between two arbitrary objects through the domain's
    /// filter and algorithm table
    ///
    /// Objects rejected by the filter (or the ray bounds test, for
    /// `Boolean` and `Contacts`) yield an empty set. Both ids are null.
    pub fn compute_contacts(
        &self,
        a: &CollisionObject,
        b: &CollisionObject,
        query: CollisionQueryType,
    ) -> Result<ContactSet, CollisionError> {
        let mut set = self.contact_set_pool.obtain();
        let admitted = self.admits(a, b);
        let reachable = query == CollisionQueryType::ClosestPoints || passes_ray_reject(a, b);
        if admitted && reachable {
            let algorithm = self.matrix.resolve(a.shape_type(), b.shape_type())?;
            algorithm.compute_collision(ObjectPair::new(a, b), &mut set, query)?;
        }
        Ok(set)
    }

    /// Return a caller-owned contact set to the pool
    pub fn recycle(&self, set: ContactSet) {
        self.contact_set_pool.recycle(set);
    }

    /// Both objects enabled and accepted by the filter
    pub(crate) fn admits(&self, a: &CollisionObject, b: &CollisionObject) -> bool {
        a.enabled() && b.enabled() && self.filter.can_collide(a, b)
    }

    pub(crate) fn thread_pool(&self) -> Option<&ThreadPool> {
        self.thread_pool.as_ref().filter(|_| self.config.enable_multithreading)
    }

    pub(crate) fn broad_phase(&self) -> &dyn BroadPhase {
        &*self.broad_phase
    }

    fn pair(&self, key: &CandidatePair) -> Option<&ContactSet> {
        self.pair_index.get(key).and_then(|&index| self.pairs.get(index))
    }

    fn object_entry(&mut self, id: CollisionObjectId) -> Result<&mut CollisionObject, CollisionError> {
        self.objects.get_mut(id).ok_or(CollisionError::UnknownObject(id))
    }

    fn modify_geometry(
        &mut self,
        id: CollisionObjectId,
        change: impl FnOnce(&mut CollisionObject) -> Result<(), CollisionError>,
    ) -> Result<(), CollisionError> {
        let object = self.object_entry(id)?;
        let result = change(object);
        let aabb = object.aabb();
        self.broad_phase.update(id, aabb);
        result
    }

    /// Objects an unregistered query object may collide with
    fn ad_hoc_candidates<'a>(
        &'a self,
        object: &CollisionObject,
    ) -> Result<Vec<(CollisionObjectId, &'a CollisionObject)>, CollisionError> {
        if object.domain() == Some(self.id) {
            return Err(CollisionError::InvalidArgument(
                "ad hoc queries take objects that are not registered in this domain".to_string(),
            ));
        }
        object.geometry().validate()?;
        if !object.enabled() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        self.broad_phase.query_aabb(&object.aabb(), &mut ids);
        Ok(ids
            .into_iter()
            .filter_map(|id| self.objects.get(id).map(|other| (id, other)))
            .filter(|(_, other)| self.admits(object, other) && passes_ray_reject(object, other))
            .collect())
    }

    /// Sync the persistent pair list with the broad phase
    fn refresh_pairs(&mut self) {
        let mut candidates = Vec::with_capacity(self.pairs.len());
        self.broad_phase.overlapping_pairs(&mut candidates);
        let current: HashSet<CandidatePair> = candidates.iter().copied().collect();

        let before = self.pairs.len();
        self.retain_pairs(|pair| current.contains(pair));
        let dropped = before - self.pairs.len();

        let mut added = 0;
        for pair in candidates {
            if self.pair_index.contains_key(&pair) {
                continue;
            }
            let mut set = self.contact_set_pool.obtain();
            set.assign(pair.a, pair.b);
            self.pair_index.insert(pair, self.pairs.len());
            self.pairs.push(set);
            added += 1;
        }

        if added > 0 || dropped > 0 {
            trace!("Broad phase: {} new pairs, {} dropped", added, dropped);
        }
    }

    /// Keep pairs matching `keep` in order, recycling the others
    fn retain_pairs(&mut self, mut keep: impl FnMut(&CandidatePair) -> bool) {
        let previous = std::mem::take(&mut self.pairs);
        self.pair_index.clear();
        for set in previous {
            let key = CandidatePair::new(set.object_a(), set.object_b());
            if keep(&key) {
                self.pair_index.insert(key, self.pairs.len());
                self.pairs.push(set);
            } else {
                self.contact_set_pool.recycle(set);
            }
        }
    }

    /// Serial pass after the narrow phase: ray cache, then published sets
    fn publish(&mut self) {
        self.ray_cache.clear();
        for (id, object) in &self.objects {
            if object.enabled() && object.is_first_hit_ray() {
                self.ray_cache.insert(id, None);
            }
        }

        for set in self.pairs.iter().filter(|set| is_reportable(set)) {
            let key = CandidatePair::new(set.object_a(), set.object_b());
            let Some(distance) = set.shallowest_contact().map(|contact| contact.penetration_depth) else {
                continue;
            };
            for ray in [set.object_a(), set.object_b()] {
                if let Some(entry) = self.ray_cache.get_mut(&ray) {
                    // strictly closer replaces, so ties keep the first pair
                    let closer = match *entry {
                        Some(hit) => distance < hit.distance,
                        None => true,
                    };
                    if closer {
                        *entry = Some(FirstHit { pair: key, distance });
                    }
                }
            }
        }

        self.published.clear();
        for set in self.pairs.iter().filter(|set| is_reportable(set)) {
            let key = CandidatePair::new(set.object_a(), set.object_b());
            let ray_entry = [set.object_a(), set.object_b()]
                .into_iter()
                .find_map(|id| self.ray_cache.get(&id));
            let publish = match ray_entry {
                Some(hit) => hit.is_some_and(|hit| hit.pair == key),
                None => true,
            };
            if publish {
                self.published.push(key);
            }
        }
    }
}

/// Read-only state shared by the narrow-phase tasks of one update
struct PairContext<'a> {
    objects: &'a SlotMap<CollisionObjectId, CollisionObject>,
    filter: &'a dyn CollisionFilter,
    filter_generation: u64,
    matrix: &'a CollisionAlgorithmMatrix,
    tolerance: f32,
    delta_time: f64,
}

impl PairContext<'_> {
    fn object(&self, id: CollisionObjectId) -> Result<&CollisionObject, CollisionError> {
        self.objects.get(id).ok_or(CollisionError::UnknownObject(id))
    }

    /// Filter, fast reject and narrow phase for one persistent pair
    fn evaluate(&self, set: &mut ContactSet) -> Result<(), CollisionError> {
        let a = self.object(set.object_a())?;
        let b = self.object(set.object_b())?;

        if !a.enabled() || !b.enabled() {
            set.clear();
            set.is_valid = false;
            return Ok(());
        }

        let stamp = FilterStamp {
            domain: self.filter_generation,
            object_a: a.filter_generation(),
            object_b: b.filter_generation(),
        };
        if set.filter_stamp != Some(stamp) {
            set.can_collide = if self.filter.can_collide(a, b) {
                CanCollide::Yes
            } else {
                CanCollide::No
            };
            set.filter_stamp = Some(stamp);
            set.is_valid = false;
        }
        if set.can_collide == CanCollide::No {
            set.clear();
            return Ok(());
        }

        if !passes_ray_reject(a, b) {
            set.clear();
            set.is_valid = false;
            return Ok(());
        }

        let shape_types = (a.shape_type(), b.shape_type());
        let cached = set
            .algorithm
            .as_ref()
            .filter(|cached| cached.shape_types == shape_types)
            .map(|cached| Arc::clone(&cached.algorithm));
        let algorithm = if let Some(algorithm) = cached {
            algorithm
        } else {
            let algorithm = self.matrix.resolve(shape_types.0, shape_types.1)?;
            set.algorithm = Some(CachedAlgorithm {
                shape_types,
                algorithm: Arc::clone(&algorithm),
            });
            set.is_valid = false;
            algorithm
        };

        let pose_stamp = (a.pose_generation(), b.pose_generation());
        if set.is_valid && set.pose_stamp == pose_stamp {
            set.age(self.delta_time);
            return Ok(());
        }

        let mut fresh = ContactSet::new(set.object_a(), set.object_b());
        algorithm.compute_collision(ObjectPair::new(a, b), &mut fresh, CollisionQueryType::Contacts)?;
        set.merge(&fresh, self.tolerance, self.delta_time);
        set.pose_stamp = pose_stamp;
        set.is_valid = true;
        Ok(())
    }
}

fn build_thread_pool(worker_threads: Option<usize>) -> Result<ThreadPool, CollisionError> {
    let mut builder = ThreadPoolBuilder::new().thread_name(|index| format!("collision-worker-{index}"));
    if let Some(threads) = worker_threads {
        builder = builder.num_threads(threads);
    }
    builder
        .build()
        .map_err(|error| CollisionError::ThreadPool(error.to_string()))
}

fn is_reportable(set: &ContactSet) -> bool {
    set.have_contact() && set.can_collide() == CanCollide::Yes
}

/// Ray vs bounding box rejection: two rays never collide, one ray must
/// cross the other object's box
pub(crate) fn passes_ray_reject(a: &CollisionObject, b: &CollisionObject) -> bool {
    match (a.world_ray(), b.world_ray()) {
        (Some(_), Some(_)) => false,
        (Some(ray), None) => segment_crosses(&ray, &b.aabb()),
        (None, Some(ray)) => segment_crosses(&ray, &a.aabb()),
        (None, None) => true,
    }
}

fn segment_crosses(ray: &WorldRay, aabb: &Aabb) -> bool {
    aabb.intersects_segment(ray.origin, inverse_direction(ray.direction), ray.length)
}

/// Index of the set with the nearest ray hit, first one on ties
fn nearest_hit(sets: &[ContactSet]) -> usize {
    let distance = |set: &ContactSet| set.shallowest_contact().map_or(f32::INFINITY, |c| c.penetration_depth);
    let mut nearest = 0;
    for (index, set) in sets.iter().enumerate().skip(1) {
        if distance(set) < distance(&sets[nearest]) {
            nearest = index;
        }
    }
    nearest
}
