//! Specialized collection types

pub use slotmap::{SlotMap, new_key_type, Key};

use std::sync::Mutex;

/// Free list for object pooling
///
/// Recycled items are handed out again by [`ResourcePool::obtain`] before a
/// new item is created. Thread-safe so that pooled objects can be returned
/// from worker threads.
pub struct ResourcePool<T> {
    free: Mutex<Vec<T>>,
    create: fn() -> T,
    reset: fn(&mut T),
    max_free: usize,
}

impl<T> ResourcePool<T> {
    /// Create a new pool using `create` for fresh items and `reset` to clear recycled ones
    pub fn new(create: fn() -> T, reset: fn(&mut T)) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            create,
            reset,
            max_free: 1024,
        }
    }

    /// Limit how many recycled items are retained
    pub fn with_max_free(mut self, max_free: usize) -> Self {
        self.max_free = max_free;
        self
    }

    /// Take an item from the pool, creating one if the free list is empty
    pub fn obtain(&self) -> T {
        let recycled = match self.free.lock() {
            Ok(mut free) => free.pop(),
            Err(poisoned) => poisoned.into_inner().pop(),
        };
        recycled.unwrap_or_else(self.create)
    }

    /// Return an item to the pool
    pub fn recycle(&self, mut item: T) {
        (self.reset)(&mut item);
        let mut free = match self.free.lock() {
            Ok(free) => free,
            Err(poisoned) => poisoned.into_inner(),
        };
        if free.len() < self.max_free {
            free.push(item);
        }
    }

    /// Number of items currently waiting in the free list
    pub fn free_count(&self) -> usize {
        match self.free.lock() {
            Ok(free) => free.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_recycles_items() {
        let pool: ResourcePool<Vec<u32>> = ResourcePool::new(Vec::new, Vec::clear);

        let mut item = pool.obtain();
        item.extend([1, 2, 3]);
        let capacity = item.capacity();
        pool.recycle(item);
        assert_eq!(pool.free_count(), 1);

        let item = pool.obtain();
        assert!(item.is_empty());
        assert_eq!(item.capacity(), capacity);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn test_pool_respects_max_free() {
        let pool: ResourcePool<Vec<u32>> = ResourcePool::new(Vec::new, Vec::clear).with_max_free(1);
        pool.recycle(Vec::new());
        pool.recycle(Vec::new());
        assert_eq!(pool.free_count(), 1);
    }
}
