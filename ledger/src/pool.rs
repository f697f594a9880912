//! Outputs known to the node but not confirmed by the current chain.

use glint_transactions::{Output, OutputIndex};
use glint_types::Timestamp;

use crate::cache::ExpiringCache;

/// Outputs peers can push without limit, so the pool is capped.
pub const DEFAULT_POOL_CAPACITY: usize = 100_000;
/// An output nobody confirmed within a day is dropped.
pub const DEFAULT_POOL_TTL_SECS: u64 = 86_400;

/// In-memory only; rebuilt from peers after a restart.
///
/// Lookups ignore age so an output stays resolvable until an insert purges
/// it or it is confirmed.
#[derive(Debug)]
pub struct ProvisionalPool {
    outputs: ExpiringCache<OutputIndex, Output>,
}

impl Default for ProvisionalPool {
    fn default() -> Self {
        Self::with_limits(DEFAULT_POOL_TTL_SECS, DEFAULT_POOL_CAPACITY)
    }
}

impl ProvisionalPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(ttl_secs: u64, capacity: usize) -> Self {
        Self {
            outputs: ExpiringCache::new(ttl_secs, capacity),
        }
    }

    /// Returns whether the output was new to the pool and kept. A known
    /// output has its age refreshed.
    pub fn insert(&mut self, output: Output, now: Timestamp) -> bool {
        let index = output.index();
        let fresh = self.outputs.peek(&index).is_none();
        self.outputs.insert(index, output, now);
        fresh && self.outputs.peek(&index).is_some()
    }

    pub fn get(&self, index: &OutputIndex) -> Option<&Output> {
        self.outputs.peek(index)
    }

    pub fn contains(&self, index: &OutputIndex) -> bool {
        self.outputs.peek(index).is_some()
    }

    pub fn remove(&mut self, index: &OutputIndex) -> Option<Output> {
        self.outputs.remove(index)
    }

    pub fn purge_expired(&mut self, now: Timestamp) {
        self.outputs.purge_expired(now);
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
