//! Bounded least-recently-used object cache.
//!
//! The cache keeps its keys in a [`VecDeque`] ordered by recency (most
//! recently used at the front) next to a [`HashMap`] holding the values.
//! Capacity is clamped into `[0, ceiling]` at construction so the memory a
//! cache can hold is bounded regardless of caller configuration.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Default capacity ceiling for a cache.
pub const DEFAULT_CEILING: usize = 30;

/// Bounded key → value store with LRU eviction.
///
/// Not synchronized; wrap it in a lock to share it.
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
    max_size: usize,
    recency: VecDeque<K>,
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    /// Create a cache holding at most `max_size` entries, clamped to
    /// [`DEFAULT_CEILING`].
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self::with_ceiling(max_size, DEFAULT_CEILING)
    }

    /// Create a cache holding at most `max_size` entries, clamped to
    /// `ceiling`.
    #[must_use]
    pub fn with_ceiling(max_size: usize, ceiling: usize) -> Self {
        let max_size = max_size.min(ceiling);
        Self {
            max_size,
            recency: VecDeque::with_capacity(max_size),
            entries: HashMap::with_capacity(max_size),
        }
    }

    /// Look up `key`, promoting it to most recently used on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.promote(key);
        self.entries.get(key)
    }

    /// Insert or replace `key`, evicting the least recently used entry if
    /// the cache is full and `key` is new.
    ///
    /// Returns the evicted key, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<K> {
        if self.max_size == 0 {
            return None;
        }

        if self.entries.contains_key(&key) {
            self.promote(&key);
            self.entries.insert(key, value);
            return None;
        }

        let evicted = if self.entries.len() >= self.max_size {
            self.recency.pop_back().inspect(|oldest| {
                self.entries.remove(oldest);
            })
        } else {
            None
        };

        self.recency.push_front(key.clone());
        self.entries.insert(key, value);
        evicted
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.entries.remove(key)?;
        self.recency.retain(|k| k != key);
        Some(value)
    }

    /// Whether `key` is present. Does not change recency.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries after clamping.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.max_size
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.recency.iter()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.recency.clear();
        self.entries.clear();
    }

    fn promote(&mut self, key: &K) {
        if let Some(index) = self.recency.iter().position(|k| k == key)
            && let Some(k) = self.recency.remove(index)
        {
            self.recency.push_front(k);
        }
    }
}
