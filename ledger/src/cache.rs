//! Bounded time-expiring cache.
//!
//! Entries live for `ttl_secs` after insertion. When full, the oldest
//! insertion is evicted first. Callers pass the current time so the cache
//! itself stays clock-agnostic.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use glint_types::Timestamp;

#[derive(Debug)]
pub struct ExpiringCache<K, V> {
    entries: HashMap<K, (V, Timestamp)>,
    /// Insertion order. Re-inserted keys leave a stale record behind that
    /// eviction skips.
    order: VecDeque<(K, Timestamp)>,
    ttl_secs: u64,
    capacity: usize,
}

impl<K: Clone + Eq + Hash, V> ExpiringCache<K, V> {
    pub fn new(ttl_secs: u64, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            ttl_secs,
            capacity,
        }
    }

    pub fn insert(&mut self, key: K, value: V, now: Timestamp) {
        if self.capacity == 0 {
            return;
        }
        self.purge_expired(now);
        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.capacity {
                if !self.evict_oldest() {
                    break;
                }
            }
        }
        self.entries.insert(key.clone(), (value, now));
        self.order.push_back((key, now));
    }

    pub fn get(&self, key: &K, now: Timestamp) -> Option<&V> {
        match self.entries.get(key) {
            Some((value, inserted)) if !inserted.has_expired(self.ttl_secs, now) => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, key: &K, now: Timestamp) -> bool {
        self.get(key, now).is_some()
    }

    /// Lookup that ignores age. Expired entries stay visible until the next
    /// purge.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|(value, _)| value)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(value, _)| value)
    }

    pub fn purge_expired(&mut self, now: Timestamp) {
        while let Some((key, inserted)) = self.order.front() {
            if !inserted.has_expired(self.ttl_secs, now) {
                break;
            }
            if self.entries.get(key).is_some_and(|(_, at)| at == inserted) {
                self.entries.remove(key);
            }
            self.order.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn evict_oldest(&mut self) -> bool {
        while let Some((key, inserted)) = self.order.pop_front() {
            if self.entries.get(&key).is_some_and(|(_, at)| *at == inserted) {
                self.entries.remove(&key);
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    #[test]
    fn entries_expire_after_ttl() {
        let mut cache = ExpiringCache::new(10, 8);
        cache.insert(1u8, "a", at(100));
        assert_eq!(cache.get(&1, at(109)), Some(&"a"));
        assert_eq!(cache.get(&1, at(110)), None);
        cache.purge_expired(at(110));
        assert!(cache.is_empty());
    }

    #[test]
    fn oldest_is_evicted_at_capacity() {
        let mut cache = ExpiringCache::new(100, 2);
        cache.insert(1u8, (), at(0));
        cache.insert(2u8, (), at(1));
        cache.insert(3u8, (), at(2));
        assert!(!cache.contains(&1, at(3)));
        assert!(cache.contains(&2, at(3)));
        assert!(cache.contains(&3, at(3)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reinsert_refreshes_without_double_counting() {
        let mut cache = ExpiringCache::new(10, 2);
        cache.insert(1u8, 'a', at(0));
        cache.insert(2u8, 'b', at(1));
        cache.insert(1u8, 'c', at(5));
        assert_eq!(cache.len(), 2);
        // the stale record of key 1 must not evict the fresh entry
        cache.insert(3u8, 'd', at(6));
        assert_eq!(cache.get(&1, at(6)), Some(&'c'));
        assert!(!cache.contains(&2, at(6)));
        assert_eq!(cache.get(&1, at(14)), Some(&'c'));
    }

    #[test]
    fn peek_sees_expired_entries_until_purged() {
        let mut cache = ExpiringCache::new(10, 4);
        cache.insert(7u8, 'x', at(0));
        assert_eq!(cache.get(&7, at(20)), None);
        assert_eq!(cache.peek(&7), Some(&'x'));
        cache.purge_expired(at(20));
        assert_eq!(cache.peek(&7), None);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut cache = ExpiringCache::new(10, 0);
        cache.insert(1u8, (), at(0));
        assert!(cache.is_empty());
    }
}
