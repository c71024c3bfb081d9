//! Bounded key-point-to-key-point path cache.
//!
//! Owned by a single [`TopologicalMap`](super::TopologicalMap). Entries carry
//! the generation they were stored under; [`PathCache::clear`] bumps the
//! generation so nothing stored before it is ever returned.

use std::collections::{HashMap, VecDeque};

use log::trace;

use crate::core::GridCoord;
use crate::pathfinding::Path;

type Key = (GridCoord, GridCoord);

/// Default number of cached paths
pub const DEFAULT_PATH_CACHE_CAPACITY: usize = 4096;

#[derive(Clone, Debug)]
struct Entry {
    path: Path,
    generation: u64,
}

/// FIFO-evicting path cache keyed by `(start, goal)`.
#[derive(Clone, Debug)]
pub struct PathCache {
    entries: HashMap<Key, Entry>,
    order: VecDeque<Key>,
    capacity: usize,
    generation: u64,
    hits: u64,
    misses: u64,
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new(DEFAULT_PATH_CACHE_CAPACITY)
    }
}

impl PathCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(2),
            generation: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Cached path from `start` to `goal`, if stored in the current generation.
    pub fn get(&mut self, start: GridCoord, goal: GridCoord) -> Option<Path> {
        match self.entries.get(&(start, goal)) {
            Some(entry) if entry.generation == self.generation => {
                self.hits += 1;
                Some(entry.path.clone())
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store `path` and its reverse.
    pub fn insert(&mut self, path: &Path) {
        let (Some(start), Some(goal)) = (path.start_point(), path.goal_point()) else {
            return;
        };
        self.insert_one((start, goal), path.clone());
        if start != goal {
            self.insert_one((goal, start), path.reversed());
        }
    }

    fn insert_one(&mut self, key: Key, path: Path) {
        let entry = Entry {
            path,
            generation: self.generation,
        };
        if self.entries.insert(key, entry).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            trace!("[PathCache] evicted {} -> {}", oldest.0, oldest.1);
        }
    }

    /// Drop every entry and start a new generation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(from: i32, to: i32) -> Path {
        Path::new((from..=to).map(|x| GridCoord::new(x, 0)).collect())
    }

    #[test]
    fn test_insert_stores_reverse() {
        let mut cache = PathCache::new(16);
        cache.insert(&straight(0, 3));

        let back = cache.get(GridCoord::new(3, 0), GridCoord::new(0, 0)).unwrap();
        assert_eq!(back.start_point(), Some(GridCoord::new(3, 0)));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats(), (1, 0));
    }

    #[test]
    fn test_capacity_bound_evicts_oldest() {
        let mut cache = PathCache::new(4);
        cache.insert(&straight(0, 1));
        cache.insert(&straight(0, 2));
        cache.insert(&straight(0, 3));

        assert_eq!(cache.len(), 4);
        assert!(cache.get(GridCoord::new(0, 0), GridCoord::new(1, 0)).is_none());
        assert!(cache.get(GridCoord::new(0, 0), GridCoord::new(3, 0)).is_some());
    }

    #[test]
    fn test_clear_bumps_generation() {
        let mut cache = PathCache::default();
        cache.insert(&straight(0, 2));
        cache.clear();

        assert_eq!(cache.generation(), 1);
        assert!(cache.is_empty());
        assert!(cache.get(GridCoord::new(0, 0), GridCoord::new(2, 0)).is_none());
    }
}
